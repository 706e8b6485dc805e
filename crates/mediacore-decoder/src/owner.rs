// crates/mediacore-decoder/src/owner.rs
//
// DecoderOwner: FIFO + worker thread + the pause/step/flush/drain control
// surface a playback engine drives a single elementary stream's decode
// pipeline through. One owner per stream; CC sub-decoders are themselves
// just owners attached to the parent's get_cc() output.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use log::{debug, warn};
use parking_lot::{Condvar, Mutex};
use uuid::Uuid;

use mediacore_types::{
    Block, BlockFlags, ClockAdapter, CoreError, Counters, DecoderCategory, DecoderModule,
    IdentityClock, PacketizerModule, PipelineConfig, Rate, SinkHandle,
};

use crate::events::{self, DecoderEvent, EventReceiver, EventSender};
use crate::fifo::{BlockFifo, FifoItem};

struct OwnerState {
    paused: bool,
    /// Decremented by one and bypassed on each call while > 0 — lets a
    /// paused owner step forward exactly N units (frame-step).
    ignore: u32,
    /// True until the first decoded unit has reached the sink; a paused
    /// owner still lets that one through so a seek shows a frame.
    first: bool,
    flushing: bool,
    draining: bool,
    drained: bool,
    /// True whenever the worker thread is parked in `fifo.pop()` with
    /// nothing queued.
    idle: bool,
    preroll_until: Option<i64>,
    /// Set by a caller that wants to be woken once this owner has produced
    /// one more unit of data (e.g. sync waiting on a stream to catch up).
    waiting: bool,
    /// Set by the worker thread once a unit has been let through while
    /// `waiting` was set; cleared again by `set_waiting(false)`.
    has_data: bool,
    /// Fixed offset applied to every stream timestamp before clock
    /// conversion — lets an embedder compensate for a known presentation
    /// skew without touching the clock adapter itself.
    ts_delay: i64,
    last_video_rate: Option<Rate>,
}

impl OwnerState {
    fn new() -> Self {
        Self {
            paused: false,
            ignore: 0,
            first: true,
            flushing: false,
            draining: false,
            drained: false,
            idle: false,
            preroll_until: None,
            waiting: false,
            has_data: false,
            ts_delay: 0,
            last_video_rate: None,
        }
    }
}

fn now_us(epoch: Instant) -> i64 {
    epoch.elapsed().as_micros() as i64
}

/// Park until `target_us` (wall time against `epoch`) or until a flush
/// cuts the wait short. Used to hold audio/subpicture units back from the
/// sink until their own, tighter prepare-time deadline rather than the
/// shared `wait_unblock` gate.
fn sleep_until_us(state: &Mutex<OwnerState>, cv: &Condvar, epoch: Instant, target_us: i64) {
    loop {
        let remaining = target_us - now_us(epoch);
        if remaining <= 0 {
            return;
        }
        let mut st = state.lock();
        if st.flushing {
            return;
        }
        cv.wait_for(&mut st, Duration::from_micros(remaining as u64));
    }
}

fn flush_sink(sink: &mut SinkHandle) {
    match sink {
        SinkHandle::Video(video) => video.flush(),
        SinkHandle::Audio(audio) => audio.flush(true),
        SinkHandle::Subpicture(_) => {}
    }
}

pub struct DecoderOwner {
    /// Identifies this owner in log lines — handy once several owners
    /// (a parent decoder plus its closed-caption children) run at once.
    stream_id: Uuid,
    config: PipelineConfig,
    category: DecoderCategory,
    fifo: Arc<BlockFifo>,
    state: Arc<Mutex<OwnerState>>,
    cv: Arc<Condvar>,
    counters: Arc<Counters>,
    running: Arc<AtomicBool>,
    handle: Mutex<Option<JoinHandle<()>>>,
    event_tx: EventSender,
    event_rx: EventReceiver,
    /// Closed-caption sub-decoders, one per channel, spawned by `start()`
    /// and fed duplicated CC blocks as the parent decodes.
    cc_owners: Arc<Mutex<Vec<Option<DecoderOwner>>>>,
}

impl DecoderOwner {
    pub fn new(config: PipelineConfig, category: DecoderCategory) -> Self {
        let (byte_cap, count_cap) = (config.fifo_byte_cap, config.fifo_count_cap);
        let (event_tx, event_rx) = events::channel();
        Self {
            stream_id: Uuid::new_v4(),
            config,
            category,
            fifo: Arc::new(BlockFifo::new(byte_cap, count_cap)),
            state: Arc::new(Mutex::new(OwnerState::new())),
            cv: Arc::new(Condvar::new()),
            counters: Arc::new(Counters::default()),
            running: Arc::new(AtomicBool::new(false)),
            handle: Mutex::new(None),
            event_tx,
            event_rx,
            cc_owners: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn stream_id(&self) -> Uuid {
        self.stream_id
    }

    pub fn counters(&self) -> &Counters {
        &self.counters
    }

    /// Clone of the receiving half of the decoder's lifecycle event
    /// channel — format changes, drain completion, fatal sink errors.
    pub fn events(&self) -> EventReceiver {
        self.event_rx.clone()
    }

    pub fn is_idle(&self) -> bool {
        self.state.lock().idle
    }

    /// Ask to be woken once this owner has let one more unit through.
    /// Pairs with `wait_for_data`; setting `waiting = false` clears any
    /// data flag left over from the last round.
    pub fn set_waiting(&self, waiting: bool) {
        let mut st = self.state.lock();
        st.waiting = waiting;
        if !waiting {
            st.has_data = false;
        }
        self.cv.notify_all();
    }

    /// Block until the worker thread has let a unit through while
    /// `waiting` was set.
    pub fn wait_for_data(&self) {
        let mut st = self.state.lock();
        while !st.has_data {
            self.cv.wait(&mut st);
        }
    }

    pub fn set_ts_delay(&self, delay_us: i64) {
        self.state.lock().ts_delay = delay_us;
    }

    /// Enqueue a compressed block. `pace = false` is appropriate for
    /// categories that must never stall upstream (e.g. a live capture
    /// source); `pace = true` lets the producer block until there's room.
    /// `PREROLL` and `DISCONTINUITY` both arm (or extend) the preroll
    /// bound — the highest timestamp seen while either is set wins.
    pub fn input_decode(&self, block: Block, pace: bool) -> Result<(), CoreError> {
        if block.flags.intersects(BlockFlags::PREROLL | BlockFlags::DISCONTINUITY) {
            if let Some(pts) = block.pts {
                let mut st = self.state.lock();
                st.preroll_until = Some(st.preroll_until.map_or(pts, |until| until.max(pts)));
            }
        }

        match self.fifo.push(FifoItem::Data(block), pace) {
            Ok(()) => Ok(()),
            Err(e) => {
                if !pace {
                    warn!("unpaced input overflowed the fifo ({e}); dropping the entire queue");
                    self.fifo.clear();
                }
                Err(e)
            }
        }
    }

    pub fn set_paused(&self, paused: bool) {
        self.state.lock().paused = paused;
        self.cv.notify_all();
    }

    /// Let `n` units through while paused, one `wait_unblock` call at a
    /// time, then resume blocking.
    pub fn frame_step(&self, n: u32) {
        self.state.lock().ignore += n;
        self.cv.notify_all();
    }

    /// Discard everything queued and in flight. Blocks until the worker
    /// thread has acknowledged the flush sentinel.
    pub fn flush(&self) {
        {
            let mut st = self.state.lock();
            st.flushing = true;
        }
        self.cv.notify_all();
        self.fifo.clear();
        let _ = self.fifo.push(FifoItem::Data(Block::flush_sentinel()), false);

        let mut st = self.state.lock();
        while st.flushing {
            self.cv.wait(&mut st);
        }
    }

    /// One-shot: let the decoder module flush whatever it's holding
    /// internally, then mark the owner drained. Blocks until acknowledged.
    pub fn drain(&self) {
        {
            let mut st = self.state.lock();
            st.draining = true;
            st.drained = false;
        }
        let _ = self.fifo.push(FifoItem::Drain, false);

        let mut st = self.state.lock();
        while !st.drained {
            self.cv.wait(&mut st);
        }
    }

    pub fn is_drained(&self) -> bool {
        self.state.lock().drained
    }

    /// Block the calling (worker) thread while paused, honoring the
    /// first-frame, frame-step and external-wait exceptions. Returns
    /// immediately if a flush is in progress so the flush doesn't deadlock
    /// against a paused decode thread.
    fn wait_unblock(state: &Mutex<OwnerState>, cv: &Condvar) {
        let mut st = state.lock();
        loop {
            if st.first {
                st.first = false;
                return;
            }
            if st.ignore > 0 {
                st.ignore -= 1;
                return;
            }
            if st.flushing {
                return;
            }
            if st.waiting {
                st.has_data = true;
                cv.notify_all();
                while st.waiting && !st.flushing {
                    cv.wait(&mut st);
                }
                if st.flushing {
                    return;
                }
                continue;
            }
            if !st.paused {
                return;
            }
            cv.wait(&mut st);
        }
    }

    /// Spawn the worker thread. `decoder` produces output from `category`;
    /// `packetizer` (optional) pre-processes blocks before they reach it;
    /// `clock` converts stream timestamps to wall-clock dates; `sink` is
    /// where decoded output is routed. `cc_decoders`, by channel index,
    /// each get their own child `DecoderOwner` spawned and fed from the
    /// parent's `get_cc()` output.
    #[allow(clippy::too_many_arguments)]
    pub fn start(
        &self,
        mut decoder: Box<dyn DecoderModule>,
        mut packetizer: Option<Box<dyn PacketizerModule>>,
        mut clock: Box<dyn ClockAdapter>,
        sink: SinkHandle,
        mut cc_sinks: Vec<Option<Arc<dyn mediacore_types::SubpictureSink>>>,
        mut cc_decoders: Vec<Option<Box<dyn DecoderModule>>>,
    ) {
        if self.running.swap(true, Ordering::SeqCst) {
            return;
        }

        debug!("decoder owner {} starting ({:?})", self.stream_id, self.category);

        cc_sinks.resize_with(self.config.max_cc_channels, || None);
        cc_decoders.resize_with(self.config.max_cc_channels, || None);

        let mut cc_owners = Vec::with_capacity(self.config.max_cc_channels);
        for (spu_sink, cc_decoder) in cc_sinks.into_iter().zip(cc_decoders.into_iter()) {
            match (spu_sink, cc_decoder) {
                (Some(spu_sink), Some(cc_decoder)) => {
                    let child = DecoderOwner::new(self.config, DecoderCategory::Subpicture);
                    child.start(
                        cc_decoder,
                        None,
                        Box::new(IdentityClock::new(self.config.default_rate)),
                        SinkHandle::Subpicture(spu_sink),
                        vec![],
                        vec![],
                    );
                    cc_owners.push(Some(child));
                }
                _ => cc_owners.push(None),
            }
        }
        *self.cc_owners.lock() = cc_owners;

        let fifo = Arc::clone(&self.fifo);
        let state = Arc::clone(&self.state);
        let cv = Arc::clone(&self.cv);
        let counters = Arc::clone(&self.counters);
        let running = Arc::clone(&self.running);
        let cc_owners = Arc::clone(&self.cc_owners);
        let category = self.category;
        let config = self.config;
        let event_tx = self.event_tx.clone();

        let join = thread::spawn(move || {
            let max_bound = i64::MAX;
            let epoch = Instant::now();
            let mut sink = sink;

            while running.load(Ordering::SeqCst) {
                state.lock().idle = true;
                let Some(item) = fifo.pop() else { break };
                state.lock().idle = false;

                match item {
                    FifoItem::Drain => {
                        let mut ctx = RouteContext {
                            clock: &mut clock,
                            max_bound,
                            sink: &mut sink,
                            counters: &counters,
                            cc_owners: &cc_owners,
                            config: &config,
                            state: &state,
                            cv: &cv,
                            epoch,
                        };
                        route_category(&category, &mut *decoder, None, &mut ctx);
                        let mut st = state.lock();
                        st.draining = false;
                        st.drained = true;
                        cv.notify_all();
                        let _ = event_tx.try_send(DecoderEvent::Drained);
                    }
                    FifoItem::Data(block) if block.is_flush_sentinel() => {
                        let mut st = state.lock();
                        st.flushing = false;
                        st.first = true;
                        cv.notify_all();
                    }
                    FifoItem::Data(mut block) => {
                        let past_preroll = {
                            let mut st = state.lock();
                            match (st.preroll_until, block.pts) {
                                (Some(until), Some(pts)) if pts < until => {
                                    counters.bump_lost_picture();
                                    None
                                }
                                (Some(_), Some(_)) => {
                                    st.preroll_until = None;
                                    Some(true)
                                }
                                _ => Some(false),
                            }
                        };
                        let past_preroll = match past_preroll {
                            None => continue,
                            Some(flag) => flag,
                        };
                        if past_preroll {
                            debug!("preroll bound reached, flushing sink");
                            flush_sink(&mut sink);
                        }

                        if let Some(pk) = packetizer.as_deref_mut() {
                            match pk.packetize(Some(block)) {
                                Some(packetized) => block = packetized,
                                None => continue,
                            }
                            if pk.has_format_changed() {
                                debug!("packetizer reported a format change");
                                let _ = event_tx.try_send(DecoderEvent::FormatChanged(pk.output_format()));
                            }
                        }

                        Self::wait_unblock(&state, &cv);

                        let mut ctx = RouteContext {
                            clock: &mut clock,
                            max_bound,
                            sink: &mut sink,
                            counters: &counters,
                            cc_owners: &cc_owners,
                            config: &config,
                            state: &state,
                            cv: &cv,
                            epoch,
                        };
                        route_category(&category, &mut *decoder, Some(block), &mut ctx);
                    }
                }
            }
        });

        *self.handle.lock() = Some(join);
    }

    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
        self.fifo.close();
        if let Some(j) = self.handle.lock().take() {
            let _ = j.join();
        }
        for child in self.cc_owners.lock().iter().flatten() {
            child.stop();
        }
    }
}

/// Everything `route_category` needs beyond the decoder and the block
/// itself, bundled so the function signature doesn't grow a parameter
/// every time a new pacing rule is added.
struct RouteContext<'a> {
    clock: &'a mut Box<dyn ClockAdapter>,
    max_bound: i64,
    sink: &'a mut SinkHandle,
    counters: &'a Counters,
    cc_owners: &'a Mutex<Vec<Option<DecoderOwner>>>,
    config: &'a PipelineConfig,
    state: &'a Mutex<OwnerState>,
    cv: &'a Condvar,
    epoch: Instant,
}

fn route_category(
    category: &DecoderCategory,
    decoder: &mut dyn DecoderModule,
    block: Option<Block>,
    ctx: &mut RouteContext,
) {
    match category {
        DecoderCategory::Video => {
            let ts_delay = ctx.state.lock().ts_delay;
            let block_for_cc = block.clone();
            for frame in decoder.decode_video(block) {
                ctx.counters.bump_decoded();
                let Some(pts) = frame.pts else {
                    ctx.counters.bump_lost_picture();
                    continue;
                };
                let Ok((date, rate)) = ctx.clock.convert(pts.saturating_add(ts_delay), ctx.max_bound) else {
                    ctx.counters.bump_lost_picture();
                    continue;
                };

                let rate_changed = {
                    let mut st = ctx.state.lock();
                    let changed = st.last_video_rate.is_some_and(|prev| prev != rate);
                    st.last_video_rate = Some(rate);
                    changed
                };
                if rate_changed {
                    debug!("playback rate changed, flushing video output");
                    if let SinkHandle::Video(video) = ctx.sink {
                        video.flush();
                    }
                }

                if let SinkHandle::Video(video) = ctx.sink {
                    match video.new_picture(frame.format, frame.width, frame.height) {
                        Ok(handle) => {
                            video.write_pixels(handle, frame.data);
                            video.set_aspect(handle, frame.aspect);
                            video.display(handle);
                            video.date(handle, date);
                        }
                        Err(e) => {
                            warn!("video sink rejected new picture: {e}");
                            ctx.counters.bump_lost_picture();
                        }
                    }
                }
            }

            if block_for_cc.is_some() {
                let mut present = [false; 4];
                if let Some(cc_block) = decoder.get_cc(&mut present) {
                    let owners = ctx.cc_owners.lock();
                    for (i, owner) in owners.iter().enumerate().take(ctx.config.max_cc_channels) {
                        if present.get(i).copied().unwrap_or(false) {
                            if let Some(owner) = owner {
                                let _ = owner.input_decode(cc_block.clone(), false);
                            }
                        }
                    }
                }
            }
        }
        DecoderCategory::Audio => {
            for audio in decoder.decode_audio(block) {
                ctx.counters.bump_decoded();
                let Some(pts) = audio.pts else {
                    ctx.counters.bump_lost_abuffer();
                    continue;
                };
                let Ok((date, rate)) = ctx.clock.convert(pts, ctx.max_bound) else {
                    ctx.counters.bump_lost_abuffer();
                    continue;
                };

                // Must fall within [default/N, default*N] for N = aout_max_input_rate.
                let n = ctx.config.aout_max_input_rate.max(1) as i64;
                let default = ctx.config.default_rate as i64;
                let r = rate.0 as i64;
                if r.saturating_mul(n) < default || r > default.saturating_mul(n) {
                    warn!("audio rate {r} is outside the allowed bound, dropping buffer");
                    ctx.counters.bump_lost_abuffer();
                    continue;
                }

                sleep_until_us(ctx.state, ctx.cv, ctx.epoch, date - ctx.config.aout_max_prepare_us);

                if let SinkHandle::Audio(sink) = ctx.sink {
                    if let Err(e) = sink.play(&audio.data, audio.sample_rate) {
                        warn!("audio sink rejected block: {e}");
                        ctx.counters.bump_lost_abuffer();
                    } else {
                        ctx.counters.bump_played_abuffer();
                    }
                }
                debug!("audio unit played at rate {}", rate.0);
            }
        }
        DecoderCategory::Subpicture => {
            for sub in decoder.decode_sub(block) {
                ctx.counters.bump_decoded();
                let Ok((start, _)) = ctx.clock.convert(sub.start, ctx.max_bound) else {
                    continue;
                };
                let Ok((stop, _)) = ctx.clock.convert(sub.stop, ctx.max_bound) else {
                    continue;
                };

                sleep_until_us(ctx.state, ctx.cv, ctx.epoch, start - ctx.config.spu_max_prepare_us);

                if let SinkHandle::Subpicture(spu) = ctx.sink {
                    if let Ok(handle) = spu.new_subpicture(sub.kind) {
                        spu.write_payload(handle, sub.payload, sub.channel, sub.order);
                        spu.set_times(handle, start, stop);
                        spu.ready(handle);
                    }
                }
            }
        }
    }
}
