// crates/mediacore-types/src/block.rs
//
// The compressed input unit the decoder owner's FIFO carries. `None` in
// the owner's API stands for "drain"; an actual `Block` always carries
// bytes, even if empty.

use crate::flags::BlockFlags;

/// One compressed unit pulled from the upstream demuxer.
#[derive(Debug, Clone)]
pub struct Block {
    pub data: Vec<u8>,
    /// Stream timestamp in the producer's own timebase, already expressed
    /// in microseconds. `None` for blocks with no timestamp of their own
    /// (e.g. continuation fragments).
    pub pts: Option<i64>,
    pub flags: BlockFlags,
}

impl Block {
    pub fn new(data: Vec<u8>, pts: Option<i64>) -> Self {
        Self { data, pts, flags: BlockFlags::empty() }
    }

    /// The sentinel block a `flush()` call pushes through the FIFO
    ///: empty payload, no timestamp, the three flush flags.
    pub fn flush_sentinel() -> Self {
        Self { data: Vec::new(), pts: None, flags: BlockFlags::flush_sentinel() }
    }

    pub fn is_flush_sentinel(&self) -> bool {
        self.flags.contains(BlockFlags::CORE_FLUSH)
    }

    /// Approximate heap footprint used for the byte-bounded FIFO cap
    ///.
    pub fn byte_size(&self) -> usize {
        self.data.len()
    }
}

/// What category of output a decoder module produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecoderCategory {
    Video,
    Audio,
    Subpicture,
}

/// Minimal `fmt_in`/`fmt_out` description. Concrete codec
/// identification is out of scope; this only carries what the owner
/// needs to detect a format change and react to it in the packetizer
/// pre-stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamFormat {
    pub category: DecoderCategory,
    pub codec_fourcc: [u8; 4],
    /// Sample rate for audio, frame rate numerator for video; 0 if not
    /// applicable to `category`.
    pub rate: u32,
}

impl StreamFormat {
    pub fn video(codec_fourcc: [u8; 4]) -> Self {
        Self { category: DecoderCategory::Video, codec_fourcc, rate: 0 }
    }

    pub fn audio(codec_fourcc: [u8; 4], rate: u32) -> Self {
        Self { category: DecoderCategory::Audio, codec_fourcc, rate }
    }

    pub fn subpicture(codec_fourcc: [u8; 4]) -> Self {
        Self { category: DecoderCategory::Subpicture, codec_fourcc, rate: 0 }
    }
}
