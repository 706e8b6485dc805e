// crates/mediacore-types/src/flags.rs
//
// Sentinel block flags and the video output worker's change bitmap
//. Both are small closed bit sets, so `bitflags` gives us a typed
// wrapper instead of hand-rolled `u32` masking.

use bitflags::bitflags;

bitflags! {
    /// Flags carried on a compressed `Block`.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct BlockFlags: u32 {
        /// Triggers the flush protocol when seen by the worker.
        const CORE_FLUSH   = 1 << 0;
        /// Marks a timestamp discontinuity; also arms preroll.
        const DISCONTINUITY = 1 << 1;
        /// Upstream demuxer/decoder flagged this block as corrupted.
        const CORRUPTED    = 1 << 2;
        /// Output derived from this block (and any still in preroll) is
        /// discarded until a timestamp past `preroll_end` is observed.
        const PREROLL      = 1 << 3;
    }
}

impl BlockFlags {
    /// The exact flag combination the flush sentinel block carries.
    pub fn flush_sentinel() -> Self {
        Self::CORE_FLUSH | Self::DISCONTINUITY | Self::CORRUPTED
    }
}

bitflags! {
    /// Pending reconfiguration requests on the video output worker. A bit
    /// the worker doesn't recognize (and therefore never clears) is
    /// `CoreError::UnauthorizedChange` — fatal to the worker thread.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct ChangeBitmap: u32 {
        /// Requires rebuilding the YUV conversion tables.
        const GAMMA         = 1 << 0;
        /// Requires rebuilding the YUV conversion tables.
        const GRAYSCALE     = 1 << 1;
        const INFO_OVERLAY  = 1 << 2;
        const INTERFACE     = 1 << 3;
        const SCALE         = 1 << 4;
        const NO_DISPLAY    = 1 << 5;
    }
}

impl ChangeBitmap {
    /// Bits that require the YUV conversion tables to be rebuilt before
    /// being acknowledged.
    pub fn table_rebuild_bits() -> Self {
        Self::GAMMA | Self::GRAYSCALE
    }

    /// Bits acknowledged by simply clearing them (everything else).
    pub fn simple_ack_bits() -> Self {
        Self::all().difference(Self::table_rebuild_bits())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flush_sentinel_carries_exact_flags() {
        let f = BlockFlags::flush_sentinel();
        assert!(f.contains(BlockFlags::CORE_FLUSH));
        assert!(f.contains(BlockFlags::DISCONTINUITY));
        assert!(f.contains(BlockFlags::CORRUPTED));
        assert!(!f.contains(BlockFlags::PREROLL));
    }

    #[test]
    fn table_rebuild_and_simple_ack_partition_all_bits() {
        let rebuild = ChangeBitmap::table_rebuild_bits();
        let simple = ChangeBitmap::simple_ack_bits();
        assert_eq!(rebuild.union(simple), ChangeBitmap::all());
        assert!(rebuild.intersection(simple).is_empty());
    }
}
