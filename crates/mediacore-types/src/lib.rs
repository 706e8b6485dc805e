// crates/mediacore-types/src/lib.rs
//
// Pure data and narrow capability traits shared between mediacore-video
// and mediacore-decoder. No threads, no locks, no I/O — those live in the
// crates that implement the contracts declared here.

pub mod block;
pub mod clock;
pub mod config;
pub mod counters;
pub mod decoded;
pub mod error;
pub mod flags;
pub mod picture;
pub mod sinks;
pub mod subpicture;

pub use block::{Block, DecoderCategory, StreamFormat};
pub use clock::{ClockAdapter, IdentityClock, Rate};
pub use config::PipelineConfig;
pub use counters::{Counters, CountersSnapshot};
pub use decoded::{DecodedAudioBlock, DecodedSubpicture, DecodedVideoFrame};
pub use error::{CoreError, CoreResult};
pub use flags::{BlockFlags, ChangeBitmap};
pub use picture::{AspectRatio, CropRect, MatrixCoefficients, Picture, PictureStatus, PixelFormat};
pub use sinks::{
    AudioSink, DecoderModule, DisplaySink, PacketizerModule, PictureHandle, ResourceBroker,
    SinkHandle, SpuHandle, SubpictureSink, SurfaceGeometry, VideoSink,
};
pub use subpicture::{SubpictureKind, SubpictureStatus, SubpictureUnit};
