// crates/mediacore-video/src/worker.rs
//
// VideoOutputWorker: owns the picture/subpicture heaps, the double-
// buffered render surface, and the presentation thread. Producers (a
// decoder owner) call the `VideoSink`/`SubpictureSink` methods from their
// own threads to hand off frames; only the worker's own thread ever
// touches the display backend or the color converter.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use log::{debug, error, info, warn};
use parking_lot::{Condvar, Mutex};
use uuid::Uuid;

use mediacore_types::{
    AspectRatio, ChangeBitmap, CoreError, Counters, DisplaySink, PictureHandle, PictureStatus,
    PipelineConfig, PixelFormat, SpuHandle, SubpictureKind, SubpictureSink, SurfaceGeometry,
    VideoSink,
};

use crate::change_bitmap::ChangeBitmapTracker;
use crate::geometry::{fit_picture_to_surface, letterbox_bands};
use crate::heap::{PictureHeap, SubpictureHeap};
use crate::hud::FpsRing;
use crate::surface::RenderSurface;
use crate::yuv::{ColorConverter, SubpictureRenderer};

fn now_us(epoch: Instant) -> i64 {
    epoch.elapsed().as_micros() as i64
}

/// Park until `target_us` (wall time against `epoch`) or until `running`
/// flips false, whichever comes first. Uses a timed condvar wait rather
/// than a plain sleep so `stop()` can cut it short immediately.
fn sleep_until(wake: &Mutex<()>, wake_cv: &Condvar, running: &AtomicBool, target_us: i64, epoch: Instant) {
    loop {
        if !running.load(Ordering::SeqCst) {
            return;
        }
        let remaining = target_us - now_us(epoch);
        if remaining <= 0 {
            return;
        }
        let mut guard = wake.lock();
        wake_cv.wait_for(&mut guard, Duration::from_micros(remaining as u64));
    }
}

pub struct VideoOutputWorker {
    /// Identifies this worker in log lines — useful once an embedder runs
    /// more than one output surface (e.g. picture-in-picture).
    worker_id: Uuid,
    config: PipelineConfig,
    picture_heap: Arc<PictureHeap>,
    spu_heap: Arc<SubpictureHeap>,
    surface: Arc<Mutex<RenderSurface>>,
    change_bitmap: Arc<ChangeBitmapTracker>,
    counters: Arc<Counters>,
    running: Arc<AtomicBool>,
    handle: Mutex<Option<JoinHandle<()>>>,
    wake: Arc<Mutex<()>>,
    wake_cv: Arc<Condvar>,
}

impl VideoOutputWorker {
    pub fn new(
        config: PipelineConfig,
        surface_width: u32,
        surface_height: u32,
        bytes_per_pixel: u32,
    ) -> Self {
        Self {
            worker_id: Uuid::new_v4(),
            picture_heap: Arc::new(PictureHeap::new(config.heap_capacity)),
            spu_heap: Arc::new(SubpictureHeap::new(config.heap_capacity)),
            surface: Arc::new(Mutex::new(RenderSurface::new(
                surface_width,
                surface_height,
                bytes_per_pixel,
                config.max_dirty_areas,
            ))),
            change_bitmap: Arc::new(ChangeBitmapTracker::new()),
            counters: Arc::new(Counters::default()),
            running: Arc::new(AtomicBool::new(false)),
            handle: Mutex::new(None),
            wake: Arc::new(Mutex::new(())),
            wake_cv: Arc::new(Condvar::new()),
            config,
        }
    }

    pub fn worker_id(&self) -> Uuid {
        self.worker_id
    }

    pub fn counters(&self) -> &Counters {
        &self.counters
    }

    pub fn request_change(&self, bits: ChangeBitmap) {
        self.change_bitmap.request(bits);
    }

    /// Spawn the presentation thread. `display` and `converter` are moved
    /// into it — only that thread ever touches them.
    pub fn start(
        &self,
        mut display: Box<dyn DisplaySink>,
        mut converter: Box<dyn ColorConverter>,
        mut spu_renderer: Box<dyn SubpictureRenderer>,
    ) {
        if self.running.swap(true, Ordering::SeqCst) {
            return;
        }

        debug!("video output worker {} starting", self.worker_id);

        let picture_heap = Arc::clone(&self.picture_heap);
        let spu_heap = Arc::clone(&self.spu_heap);
        let surface = Arc::clone(&self.surface);
        let change_bitmap = Arc::clone(&self.change_bitmap);
        let counters = Arc::clone(&self.counters);
        let running = Arc::clone(&self.running);
        let wake = Arc::clone(&self.wake);
        let wake_cv = Arc::clone(&self.wake_cv);
        let config = self.config;

        let geometry = {
            let s = surface.lock();
            SurfaceGeometry {
                width: s.front().width,
                height: s.front().height,
                format: PixelFormat::PresenterNative,
                bytes_per_line: s.front().stride as u32,
                bytes_per_pixel: s.front().bytes_per_pixel,
            }
        };
        if let Err(e) = display.init(geometry) {
            error!("display sink failed to initialize: {e}");
            running.store(false, Ordering::SeqCst);
            return;
        }

        let join = thread::spawn(move || {
            let epoch = Instant::now();
            let mut fps = FpsRing::new(config.fps_ring_len);

            while running.load(Ordering::SeqCst) {
                if display.manage() {
                    error!("display sink reported a fatal condition, stopping worker");
                    break;
                }

                let rebuild_result = change_bitmap.drain(|pending| {
                    let rebuild = ChangeBitmap::table_rebuild_bits() & pending;
                    if !rebuild.is_empty() {
                        converter.rebuild_tables(1.0, pending.contains(ChangeBitmap::GRAYSCALE));
                        debug!("rebuilt color tables for change bits {:?}", rebuild);
                    }
                    pending & (ChangeBitmap::table_rebuild_bits() | ChangeBitmap::simple_ack_bits())
                });
                if let Err(e) = rebuild_result {
                    error!("unrecognized change bitmap request: {e}");
                    break;
                }

                let now = now_us(epoch);
                let Some((handle, date)) = picture_heap.select_ready() else {
                    thread::sleep(Duration::from_micros(config.idle_sleep_us as u64));
                    continue;
                };

                if date + config.display_delay_us < now {
                    warn!("dropping late picture (date {date}us, now {now}us)");
                    counters.bump_lost_picture();
                    picture_heap.drop_late(handle);
                    continue;
                }
                if date > now + config.display_delay_us {
                    thread::sleep(Duration::from_micros(config.idle_sleep_us as u64));
                    continue;
                }

                let picture = picture_heap.snapshot(handle);
                let (sw, sh, bpp) = {
                    let mut surf = surface.lock();
                    let (sw, sh, bpp) = {
                        let f = surf.front();
                        (f.width, f.height, f.bytes_per_pixel)
                    };
                    let rect = fit_picture_to_surface(picture.width, picture.height, picture.aspect, sw, sh);
                    let back = surf.back_mut();
                    converter.convert(&picture, back, rect);

                    let [top, bottom] = letterbox_bands(rect, sh);
                    if top.0 <= top.1 {
                        back.dirty.insert(top.0, top.1);
                    }
                    if bottom.0 <= bottom.1 {
                        back.dirty.insert(bottom.0, bottom.1);
                    }

                    for (_, spu) in spu_heap.active_at(now) {
                        let top = rect.y.saturating_sub(spu.order.unsigned_abs());
                        back.dirty.insert(top.min(rect.y), rect.y + rect.h - 1);
                        spu_renderer.render(&spu, back, rect);
                    }
                    (sw, sh, bpp)
                };

                // Release the surface lock while parked so `stop()` and
                // anything else touching the surface are never blocked
                // behind a presentation that's still minutes away.
                sleep_until(&wake, &wake_cv, &running, date, epoch);
                if !running.load(Ordering::SeqCst) {
                    break;
                }

                {
                    let mut surf = surface.lock();
                    let back = surf.back_mut();
                    let geometry = SurfaceGeometry {
                        width: sw,
                        height: sh,
                        format: PixelFormat::PresenterNative,
                        bytes_per_line: back.stride as u32,
                        bytes_per_pixel: bpp,
                    };
                    if let Err(e) = display.display(geometry, &back.plane) {
                        error!("display sink rejected frame: {e}");
                        break;
                    }
                    back.clear_dirty();
                    surf.flip();
                }

                picture_heap.consume_displayed(handle);
                counters.bump_displayed();
                fps.push(date);
                if let Some(rate) = fps.fps() {
                    debug!("presenting at {rate:.1} fps");
                }
            }

            display.destroy();
            info!("video output worker thread stopped");
        });

        *self.handle.lock() = Some(join);
    }

    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
        self.wake_cv.notify_all();
        if let Some(j) = self.handle.lock().take() {
            let _ = j.join();
        }
    }
}

impl VideoSink for VideoOutputWorker {
    fn new_picture(&self, format: PixelFormat, width: u32, height: u32) -> Result<PictureHandle, CoreError> {
        self.picture_heap.create_picture(format, width, height)
    }

    fn write_pixels(&self, handle: PictureHandle, data: Vec<u8>) {
        self.picture_heap.write_pixels(handle, data);
    }

    fn set_aspect(&self, handle: PictureHandle, aspect: AspectRatio) {
        self.picture_heap.set_aspect(handle, aspect);
    }

    fn display(&self, handle: PictureHandle) {
        self.picture_heap.display(handle);
    }

    fn date(&self, handle: PictureHandle, date_us: i64) {
        self.picture_heap.date(handle, date_us);
    }

    fn flush(&self) {
        self.picture_heap.flush();
    }

    fn release(&self, handle: PictureHandle) {
        self.picture_heap.unlink(handle);
    }
}

impl SubpictureSink for VideoOutputWorker {
    fn new_subpicture(&self, kind: SubpictureKind) -> Result<SpuHandle, CoreError> {
        self.spu_heap.create_subpicture(kind)
    }

    fn write_payload(&self, handle: SpuHandle, payload: Vec<u8>, channel: u32, order: i32) {
        self.spu_heap.write_payload(handle, payload, channel, order);
    }

    fn set_times(&self, handle: SpuHandle, start_us: i64, stop_us: i64) {
        self.spu_heap.set_times(handle, start_us, stop_us);
    }

    fn ready(&self, handle: SpuHandle) {
        self.spu_heap.ready(handle);
    }

    fn release(&self, handle: SpuHandle) {
        self.spu_heap.unlink(handle);
    }
}
