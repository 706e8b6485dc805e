// crates/mediacore-video/src/lib.rs
//
// Buffer heap, render surface, and the video output worker thread that
// ties them to a display backend. Everything a decoder owner needs to
// push frames into a presentation pipeline lives here.

pub mod change_bitmap;
pub mod geometry;
pub mod heap;
pub mod hud;
pub mod surface;
pub mod worker;
pub mod yuv;

pub use change_bitmap::ChangeBitmapTracker;
pub use geometry::{fit_picture_to_surface, letterbox_bands};
pub use heap::{PictureHeap, SubpictureHeap};
pub use hud::{FontMetrics, FpsRing, HorizontalAlign, MonospacePlaceholder, VerticalAlign};
pub use surface::{DirtyArea, DirtySpanList, Rect, RenderSurface, SurfaceBuffer, ALIGNMENT};
pub use worker::VideoOutputWorker;
pub use yuv::{ColorConverter, NullSubpictureRenderer, PassthroughConverter, SubpictureRenderer};
