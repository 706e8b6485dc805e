// Integration-style scenarios for VideoOutputWorker using a fake display
// backend. These exercise the worker end-to-end through its public
// VideoSink surface rather than calling heap/surface internals directly.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use mediacore_types::{CoreError, DisplaySink, PipelineConfig, PixelFormat, SurfaceGeometry, VideoSink};
use mediacore_video::{NullSubpictureRenderer, PassthroughConverter, VideoOutputWorker};

struct RecordingDisplay {
    presented: Arc<AtomicUsize>,
    last_geometry: Arc<Mutex<Option<SurfaceGeometry>>>,
}

impl DisplaySink for RecordingDisplay {
    fn init(&mut self, requested: SurfaceGeometry) -> Result<SurfaceGeometry, CoreError> {
        Ok(requested)
    }

    fn manage(&mut self) -> bool {
        false
    }

    fn display(&mut self, geometry: SurfaceGeometry, _data: &[u8]) -> Result<(), CoreError> {
        self.presented.fetch_add(1, Ordering::SeqCst);
        *self.last_geometry.lock().unwrap() = Some(geometry);
        Ok(())
    }

    fn destroy(&mut self) {}
}

#[test]
fn on_time_picture_is_presented_once() {
    let worker = VideoOutputWorker::new(PipelineConfig::default(), 640, 480, 4);
    let presented = Arc::new(AtomicUsize::new(0));
    let last_geometry = Arc::new(Mutex::new(None));
    let display = Box::new(RecordingDisplay {
        presented: Arc::clone(&presented),
        last_geometry: Arc::clone(&last_geometry),
    });

    let h = worker.new_picture(PixelFormat::PresenterNative, 640, 480).unwrap();
    worker.write_pixels(h, vec![128u8; 640 * 480 * 4]);
    worker.display(h);
    worker.date(h, 0);

    worker.start(display, Box::new(PassthroughConverter::default()), Box::new(NullSubpictureRenderer));
    thread::sleep(Duration::from_millis(80));
    worker.stop();

    assert!(presented.load(Ordering::SeqCst) >= 1);
    let geom = last_geometry.lock().unwrap().unwrap();
    assert_eq!(geom.width, 640);
    assert_eq!(geom.height, 480);
}

#[test]
fn late_picture_is_dropped_and_never_presented() {
    let mut config = PipelineConfig::default();
    config.display_delay_us = 1_000; // tight window so "way in the past" triggers the drop path
    let worker = VideoOutputWorker::new(config, 64, 64, 4);
    let presented = Arc::new(AtomicUsize::new(0));
    let display = Box::new(RecordingDisplay {
        presented: Arc::clone(&presented),
        last_geometry: Arc::new(Mutex::new(None)),
    });

    let h = worker.new_picture(PixelFormat::PresenterNative, 64, 64).unwrap();
    worker.write_pixels(h, vec![1u8; 64 * 64 * 4]);
    worker.display(h);
    worker.date(h, -1_000_000); // far in the past relative to worker start

    worker.start(display, Box::new(PassthroughConverter::default()), Box::new(NullSubpictureRenderer));
    thread::sleep(Duration::from_millis(80));
    worker.stop();

    assert_eq!(presented.load(Ordering::SeqCst), 0);
    assert_eq!(worker.counters().snapshot().lost_pictures, 1);
}

#[test]
fn aspect_mismatched_picture_is_letterboxed() {
    let worker = VideoOutputWorker::new(PipelineConfig::default(), 640, 480, 4);
    let presented = Arc::new(AtomicUsize::new(0));
    let last_geometry = Arc::new(Mutex::new(None));
    let display = Box::new(RecordingDisplay {
        presented: Arc::clone(&presented),
        last_geometry: Arc::clone(&last_geometry),
    });

    let h = worker.new_picture(PixelFormat::PresenterNative, 720, 480).unwrap();
    worker.set_aspect(h, mediacore_types::AspectRatio::SixteenNine);
    worker.write_pixels(h, vec![3u8; 720 * 480 * 4]);
    worker.display(h);
    worker.date(h, 0);

    worker.start(display, Box::new(PassthroughConverter::default()), Box::new(NullSubpictureRenderer));
    thread::sleep(Duration::from_millis(80));
    worker.stop();

    // The surface itself is always reported at full size; the letterboxed
    // sub-rect is an internal detail of the composited frame.
    let geom = last_geometry.lock().unwrap().unwrap();
    assert_eq!(geom.width, 640);
    assert_eq!(geom.height, 480);
    assert!(presented.load(Ordering::SeqCst) >= 1);
}
