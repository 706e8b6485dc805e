// Integration-style scenarios for DecoderOwner, driven entirely through its
// public input/control surface against fake decoder/packetizer/sink test
// doubles.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use mediacore_types::{
    AspectRatio, Block, BlockFlags, CoreResult, DecodedSubpicture, DecodedVideoFrame, DecoderCategory,
    DecoderModule, IdentityClock, MatrixCoefficients, PacketizerModule, PictureHandle, PipelineConfig,
    PixelFormat, SinkHandle, SpuHandle, StreamFormat, SubpictureKind, SubpictureSink, VideoSink,
};
use mediacore_decoder::DecoderOwner;

fn frame(pts: i64) -> DecodedVideoFrame {
    DecodedVideoFrame {
        format: PixelFormat::PresenterNative,
        width: 2,
        height: 2,
        chroma_width: 2,
        aspect: AspectRatio::Square,
        matrix: MatrixCoefficients::Bt601,
        data: vec![0u8; 4],
        pts: Some(pts),
    }
}

/// Emits one frame (with an optional CC block riding alongside it) per
/// `decode_video` call that actually receives a block.
struct ScriptedDecoder {
    cc_present: [bool; 4],
}

impl DecoderModule for ScriptedDecoder {
    fn fmt_in(&self) -> StreamFormat {
        StreamFormat::video(*b"test")
    }
    fn fmt_out(&self) -> StreamFormat {
        StreamFormat::video(*b"test")
    }
    fn decode_video(&mut self, block: Option<Block>) -> Vec<DecodedVideoFrame> {
        match block {
            Some(b) => {
                let pts = b.pts.unwrap_or(0);
                vec![frame(pts)]
            }
            None => Vec::new(),
        }
    }
    fn get_cc(&mut self, present: &mut [bool; 4]) -> Option<Block> {
        *present = self.cc_present;
        if self.cc_present.iter().any(|p| *p) {
            Some(Block::new(vec![7, 7], None))
        } else {
            None
        }
    }
}

/// A minimal CC sub-decoder: turns each block it receives into one
/// subpicture unit spanning a fixed window starting at the block's pts.
struct EchoCcDecoder;

impl DecoderModule for EchoCcDecoder {
    fn fmt_in(&self) -> StreamFormat {
        StreamFormat::subpicture(*b"cc01")
    }
    fn fmt_out(&self) -> StreamFormat {
        StreamFormat::subpicture(*b"cc01")
    }
    fn decode_sub(&mut self, block: Option<Block>) -> Vec<DecodedSubpicture> {
        match block {
            Some(b) => {
                let pts = b.pts.unwrap_or(0);
                vec![DecodedSubpicture {
                    kind: SubpictureKind::Text,
                    payload: b.data,
                    channel: 0,
                    order: 0,
                    start: pts,
                    stop: pts + 1_000,
                }]
            }
            None => Vec::new(),
        }
    }
}

/// A packetizer that passes blocks through unchanged but reports a format
/// change after the Nth call.
struct FlakyPacketizer {
    calls: usize,
    change_after: usize,
}

impl PacketizerModule for FlakyPacketizer {
    fn packetize(&mut self, block: Option<Block>) -> Option<Block> {
        self.calls += 1;
        block
    }
    fn output_format(&self) -> StreamFormat {
        StreamFormat::video(*b"test")
    }
    fn has_format_changed(&mut self) -> bool {
        self.calls == self.change_after
    }
}

struct CountingVideoSink {
    displayed: Arc<AtomicUsize>,
}
impl VideoSink for CountingVideoSink {
    fn new_picture(&self, _f: PixelFormat, _w: u32, _h: u32) -> CoreResult<PictureHandle> {
        Ok(PictureHandle(0))
    }
    fn write_pixels(&self, _h: PictureHandle, _data: Vec<u8>) {}
    fn set_aspect(&self, _h: PictureHandle, _a: AspectRatio) {}
    fn display(&self, _h: PictureHandle) {
        self.displayed.fetch_add(1, Ordering::SeqCst);
    }
    fn date(&self, _h: PictureHandle, _d: i64) {}
    fn flush(&self) {}
    fn release(&self, _h: PictureHandle) {}
}

struct RecordingSpuSink {
    writes: Arc<Mutex<Vec<(u32, i32)>>>,
    times: Arc<Mutex<Vec<(i64, i64)>>>,
}
impl SubpictureSink for RecordingSpuSink {
    fn new_subpicture(&self, _kind: SubpictureKind) -> CoreResult<SpuHandle> {
        Ok(SpuHandle(0))
    }
    fn write_payload(&self, _h: SpuHandle, _payload: Vec<u8>, channel: u32, order: i32) {
        self.writes.lock().unwrap().push((channel, order));
    }
    fn set_times(&self, _h: SpuHandle, start: i64, stop: i64) {
        self.times.lock().unwrap().push((start, stop));
    }
    fn ready(&self, _h: SpuHandle) {}
    fn release(&self, _h: SpuHandle) {}
}

#[test]
fn paused_owner_still_lets_the_first_frame_through() {
    let owner = DecoderOwner::new(PipelineConfig::default(), DecoderCategory::Video);
    let displayed = Arc::new(AtomicUsize::new(0));
    let sink: Arc<dyn VideoSink> = Arc::new(CountingVideoSink { displayed: Arc::clone(&displayed) });

    owner.set_paused(true);
    owner.start(
        Box::new(ScriptedDecoder { cc_present: [false; 4] }),
        None,
        Box::new(IdentityClock::new(1_000)),
        SinkHandle::Video(sink),
        vec![],
        vec![],
    );

    owner.input_decode(Block::new(vec![1], Some(0)), false).unwrap();
    thread::sleep(Duration::from_millis(50));
    owner.stop();

    assert_eq!(displayed.load(Ordering::SeqCst), 1);
}

#[test]
fn frame_step_lets_exactly_n_blocks_through_while_paused() {
    let owner = DecoderOwner::new(PipelineConfig::default(), DecoderCategory::Video);
    let displayed = Arc::new(AtomicUsize::new(0));
    let sink: Arc<dyn VideoSink> = Arc::new(CountingVideoSink { displayed: Arc::clone(&displayed) });

    owner.set_paused(true);
    owner.start(
        Box::new(ScriptedDecoder { cc_present: [false; 4] }),
        None,
        Box::new(IdentityClock::new(1_000)),
        SinkHandle::Video(sink),
        vec![],
        vec![],
    );

    // Consume the free first-frame pass, then step exactly two more.
    owner.input_decode(Block::new(vec![1], Some(0)), false).unwrap();
    thread::sleep(Duration::from_millis(30));
    owner.frame_step(2);
    owner.input_decode(Block::new(vec![2], Some(1)), false).unwrap();
    owner.input_decode(Block::new(vec![3], Some(2)), false).unwrap();
    thread::sleep(Duration::from_millis(50));

    // Unpause before shutdown — the worker thread would otherwise still be
    // parked in wait_unblock with nothing left to step it forward, and
    // stop() would never see its join complete.
    owner.set_paused(false);
    owner.stop();

    // First frame + two stepped frames = 3.
    assert_eq!(displayed.load(Ordering::SeqCst), 3);
}

#[test]
fn packetizer_reports_a_format_change_event() {
    let owner = DecoderOwner::new(PipelineConfig::default(), DecoderCategory::Video);
    let displayed = Arc::new(AtomicUsize::new(0));
    let sink: Arc<dyn VideoSink> = Arc::new(CountingVideoSink { displayed: Arc::clone(&displayed) });
    let events = owner.events();

    owner.start(
        Box::new(ScriptedDecoder { cc_present: [false; 4] }),
        Some(Box::new(FlakyPacketizer { calls: 0, change_after: 2 })),
        Box::new(IdentityClock::new(1_000)),
        SinkHandle::Video(sink),
        vec![],
        vec![],
    );

    owner.input_decode(Block::new(vec![1], Some(0)), false).unwrap();
    owner.input_decode(Block::new(vec![2], Some(1)), false).unwrap();
    owner.drain();
    owner.stop();

    let mut saw_format_change = false;
    while let Ok(ev) = events.try_recv() {
        if matches!(ev, mediacore_decoder::DecoderEvent::FormatChanged(_)) {
            saw_format_change = true;
        }
    }
    assert!(saw_format_change);
}

#[test]
fn closed_caption_channel_fans_out_to_its_subpicture_sink() {
    let owner = DecoderOwner::new(PipelineConfig::default(), DecoderCategory::Video);
    let displayed = Arc::new(AtomicUsize::new(0));
    let video_sink: Arc<dyn VideoSink> = Arc::new(CountingVideoSink { displayed: Arc::clone(&displayed) });
    let writes = Arc::new(Mutex::new(Vec::new()));
    let times = Arc::new(Mutex::new(Vec::new()));
    let cc_sink: Arc<dyn SubpictureSink> =
        Arc::new(RecordingSpuSink { writes: Arc::clone(&writes), times: Arc::clone(&times) });

    let mut cc_present = [false; 4];
    cc_present[1] = true;

    owner.start(
        Box::new(ScriptedDecoder { cc_present }),
        None,
        Box::new(IdentityClock::new(1_000)),
        SinkHandle::Video(video_sink),
        vec![None, Some(cc_sink)],
        vec![None, Some(Box::new(EchoCcDecoder) as Box<dyn DecoderModule>)],
    );

    owner.input_decode(Block::new(vec![1], Some(0)), false).unwrap();
    owner.drain();
    owner.stop();

    // The CC block carries no pts of its own (`get_cc` returns one with
    // `None`), so the child decoder's `decode_sub` sees pts 0 and stamps a
    // [0, 1000) window — real timestamps from a genuine sub-decoder pass,
    // not the raw payload write the old direct-write path produced.
    let seen = writes.lock().unwrap();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].0, 0);
    let stamped = times.lock().unwrap();
    assert_eq!(stamped.len(), 1);
    assert_eq!(stamped[0], (0, 1_000));
}

#[test]
fn preroll_flagged_blocks_before_the_bound_are_discarded() {
    let owner = DecoderOwner::new(PipelineConfig::default(), DecoderCategory::Video);
    let displayed = Arc::new(AtomicUsize::new(0));
    let sink: Arc<dyn VideoSink> = Arc::new(CountingVideoSink { displayed: Arc::clone(&displayed) });

    owner.start(
        Box::new(ScriptedDecoder { cc_present: [false; 4] }),
        None,
        Box::new(IdentityClock::new(1_000)),
        SinkHandle::Video(sink),
        vec![],
        vec![],
    );

    // Give the worker thread time to park on the empty FIFO so all three
    // pushes below land before it dequeues anything.
    thread::sleep(Duration::from_millis(20));

    // Queued ahead of the block that carries the PREROLL flag, so it's
    // still sitting in the FIFO when the bound takes effect.
    owner.input_decode(Block::new(vec![1], Some(50)), false).unwrap();

    let mut preroll = Block::new(vec![2], Some(100));
    preroll.flags = BlockFlags::PREROLL;
    owner.input_decode(preroll, false).unwrap();

    owner.input_decode(Block::new(vec![3], Some(150)), false).unwrap();
    owner.drain();
    owner.stop();

    // The 50-pts block is discarded once the 100-pts bound is in effect;
    // the bound-setting block and the 150-pts block that follows it both
    // reach the sink.
    assert_eq!(displayed.load(Ordering::SeqCst), 2);
    assert_eq!(owner.counters().snapshot().lost_pictures, 1);
}
