// crates/mediacore-types/src/sinks.rs
//
// Narrow capability interfaces at the edges of the core. Everything here
// is a trait an embedding application (or, for video/subpicture,
// `mediacore-video`'s worker) implements — the core never assumes a
// concrete decoder, display backend, or audio backend.

use crate::block::{Block, StreamFormat};
use crate::decoded::{DecodedAudioBlock, DecodedSubpicture, DecodedVideoFrame};
use crate::error::CoreError;
use crate::picture::{AspectRatio, PixelFormat};

/// Opaque reference to a reserved picture slot. The decoder owner treats
/// this as a capability token: it was handed one by `VideoSink::new_picture`
/// and must pass it back to write/date/display/release it. No generation
/// counter — the heap only ever recycles a slot's *memory*, never its
/// index while a handle to it is outstanding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PictureHandle(pub usize);

/// Same role as `PictureHandle`, for subpicture slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SpuHandle(pub usize);

/// What the video output sink owns on behalf of the decoder owner.
/// Implemented by `mediacore_video::VideoOutputWorker`.
pub trait VideoSink: Send + Sync {
    /// Reserve a picture slot. `HeapFull` if the
    /// heap has no FREE/DESTROYED slot to offer.
    fn new_picture(
        &self,
        format: PixelFormat,
        width: u32,
        height: u32,
    ) -> Result<PictureHandle, CoreError>;

    /// Write pixel memory into a RESERVED slot. Lock-free on the happy
    /// path — the caller must own `handle` exclusively.
    fn write_pixels(&self, handle: PictureHandle, data: Vec<u8>);

    fn set_aspect(&self, handle: PictureHandle, aspect: AspectRatio);

    /// Record the display request half of the two-phase commit.
    fn display(&self, handle: PictureHandle);

    /// Record the date half of the two-phase commit.
    fn date(&self, handle: PictureHandle, date_us: i64);

    /// Drop every picture currently queued (READY or reserved) without
    /// presenting it — used when playback rate changes mid-stream
    ///.
    fn flush(&self);

    /// Decrement the slot's reference count.
    fn release(&self, handle: PictureHandle);
}

/// What the subpicture path owns on behalf of the decoder owner.
/// Implemented by `mediacore_video::VideoOutputWorker` alongside
/// `VideoSink` — both draw from the same buffer heap.
pub trait SubpictureSink: Send + Sync {
    fn new_subpicture(
        &self,
        kind: crate::subpicture::SubpictureKind,
    ) -> Result<SpuHandle, CoreError>;

    fn write_payload(&self, handle: SpuHandle, payload: Vec<u8>, channel: u32, order: i32);

    fn set_times(&self, handle: SpuHandle, start_us: i64, stop_us: i64);

    /// The spu equivalent of `display`+`date` combined — there is no
    /// two-phase split for subpictures.
    fn ready(&self, handle: SpuHandle);

    fn release(&self, handle: SpuHandle);
}

/// Pixel geometry the display sink actually settled on — it may override
/// the requested width/height/pixel-format/pitch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SurfaceGeometry {
    pub width: u32,
    pub height: u32,
    pub format: PixelFormat,
    /// Bytes per row, including any padding the backend requires.
    pub bytes_per_line: u32,
    pub bytes_per_pixel: u32,
}

/// An opaque display backend. `mediacore-video`
/// drives this from the video output worker thread only.
pub trait DisplaySink: Send {
    /// Negotiate geometry; the sink may return something other than
    /// `requested`.
    fn init(&mut self, requested: SurfaceGeometry) -> Result<SurfaceGeometry, CoreError>;

    /// Pump the backend's event queue. Returns `true` if the backend hit a
    /// fatal condition the worker must tear down for.
    fn manage(&mut self) -> bool;

    /// Present the back buffer described by `geometry`, whose bytes are at
    /// `data`.
    fn display(&mut self, geometry: SurfaceGeometry, data: &[u8]) -> Result<(), CoreError>;

    fn destroy(&mut self);
}

/// An opaque audio output backend.
pub trait AudioSink: Send {
    fn play(&mut self, data: &[u8], rate_hz: u32) -> Result<(), CoreError>;
    fn flush(&mut self, wait_until_silent: bool);
    fn change_pause(&mut self, paused: bool, date_us: i64);
    /// Returns the "lost buffers" count accumulated since the last call,
    /// resetting it to zero.
    fn get_reset_lost(&mut self) -> u64;
}

/// A decoder plugin. Capability-typed: a
/// module only implements the `decode_*` method matching its
/// `fmt_in().category`; the owner never calls the wrong one.
pub trait DecoderModule: Send {
    fn fmt_in(&self) -> StreamFormat;
    fn fmt_out(&self) -> StreamFormat;

    /// `block = None` means flush-through-EOF: the decoder should emit
    /// whatever it's holding internally and reset. Returns zero or more
    /// frames per call.
    fn decode_video(&mut self, block: Option<Block>) -> Vec<DecodedVideoFrame> {
        let _ = block;
        Vec::new()
    }

    fn decode_audio(&mut self, block: Option<Block>) -> Vec<DecodedAudioBlock> {
        let _ = block;
        Vec::new()
    }

    fn decode_sub(&mut self, block: Option<Block>) -> Vec<DecodedSubpicture> {
        let _ = block;
        Vec::new()
    }

    /// Closed-caption extraction. `present` marks
    /// which of up to four CC channels have data in the returned block.
    fn get_cc(&mut self, present: &mut [bool; 4]) -> Option<Block> {
        *present = [false; 4];
        None
    }

    fn get_attachments(&mut self) -> usize {
        0
    }
}

/// A packetizer module — same narrow shape as
/// a decoder, minus the `decode_*` methods.
pub trait PacketizerModule: Send {
    fn packetize(&mut self, block: Option<Block>) -> Option<Block>;

    fn output_format(&self) -> StreamFormat;

    /// Monotonic "description was updated" flag; reading it clears it
    ///.
    fn has_format_changed(&mut self) -> bool;
}

/// The sink a decoder owner currently routes decoded output to.
pub enum SinkHandle {
    Video(std::sync::Arc<dyn VideoSink>),
    Audio(Box<dyn AudioSink>),
    Subpicture(std::sync::Arc<dyn SubpictureSink>),
}

/// Resolves sinks for a stream without the owner holding a cyclic owning
/// reference to them.
/// The owner borrows a sink at attach time and returns it at shutdown;
/// `release_*` is a no-op for brokers that don't need bookkeeping.
pub trait ResourceBroker: Send + Sync {
    fn acquire_video_sink(&self) -> Option<std::sync::Arc<dyn VideoSink>>;
    fn acquire_subpicture_sink(&self) -> Option<std::sync::Arc<dyn SubpictureSink>>;
    fn release_video_sink(&self, _sink: &std::sync::Arc<dyn VideoSink>) {}
    fn release_subpicture_sink(&self, _sink: &std::sync::Arc<dyn SubpictureSink>) {}
}
