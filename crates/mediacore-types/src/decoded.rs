// crates/mediacore-types/src/decoded.rs
//
// Raw decoded output a `DecoderModule` hands back to the owner, before the
// owner allocates a pooled Picture/SubpictureUnit for it and routes it by
// category. These are plain data — no heap slot, no status field.

use crate::picture::{AspectRatio, MatrixCoefficients, PixelFormat};
use crate::subpicture::SubpictureKind;

#[derive(Debug, Clone)]
pub struct DecodedVideoFrame {
    pub format: PixelFormat,
    pub width: u32,
    pub height: u32,
    pub chroma_width: u32,
    pub aspect: AspectRatio,
    pub matrix: MatrixCoefficients,
    pub data: Vec<u8>,
    /// Stream timestamp, microseconds, before clock conversion. `None`
    /// means the decoder produced an undated frame.
    pub pts: Option<i64>,
}

#[derive(Debug, Clone)]
pub struct DecodedAudioBlock {
    pub data: Vec<u8>,
    pub sample_rate: u32,
    pub channels: u16,
    pub pts: Option<i64>,
}

#[derive(Debug, Clone)]
pub struct DecodedSubpicture {
    pub kind: SubpictureKind,
    pub payload: Vec<u8>,
    pub channel: u32,
    pub order: i32,
    /// Start/stop timestamps before clock conversion.
    pub start: i64,
    pub stop: i64,
}
