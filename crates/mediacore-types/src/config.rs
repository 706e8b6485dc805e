// crates/mediacore-types/src/config.rs
//
// Every magic number the pipeline depends on, gathered into one struct
// with a `Default` matching the reference literal values. Embedding code
// builds one `PipelineConfig` and threads it into the heap, the video
// output worker, and every decoder owner — nothing here reads an
// environment variable or a config file; that's the host application's job.

/// Tunables shared by the buffer heap, the video output worker, and every
/// decoder owner constructed against this config.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PipelineConfig {
    /// Picture/subpicture heap capacity, per kind.
    pub heap_capacity: usize,
    /// `DISPLAY_DELAY` — a picture dated further than this past `now` is
    /// treated as not-yet-ready rather than selected.
    pub display_delay_us: i64,
    /// Sleep duration when no picture is ready to display.
    pub idle_sleep_us: i64,
    /// Maximum number of dirty-area spans tracked per surface buffer; the
    /// span-merge logic keeps the list at or below this.
    pub max_dirty_areas: usize,
    /// Ring buffer length for the FPS estimate.
    pub fps_ring_len: usize,
    /// FIFO byte cap enforced when `pace = false`.
    pub fifo_byte_cap: usize,
    /// FIFO count cap enforced when `pace = true`.
    pub fifo_count_cap: usize,
    /// `AOUT_MAX_PREPARE_TIME` — audio units wait until `deadline - this`
    /// before `wait_unblock` is invoked.
    pub aout_max_prepare_us: i64,
    /// `SPU_MAX_PREPARE_TIME` — subpicture equivalent.
    pub spu_max_prepare_us: i64,
    /// `AOUT_MAX_INPUT_RATE` — audio rate must fall within
    /// `[1/this, this]` relative to the default rate or the unit is
    /// discarded as "lost".
    pub aout_max_input_rate: u32,
    /// Default (neutral) clock rate; actual speed = default/rate.
    pub default_rate: u32,
    /// Maximum concurrent closed-caption sub-decoders.
    pub max_cc_channels: usize,
    /// Byte value the idle-screen placeholder fills the surface with when
    /// an embedder explicitly requests it (e.g. before the first picture
    /// or on an extended stall). The engine never paints this on its own.
    pub idle_fill_byte: u8,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            heap_capacity: 16,
            display_delay_us: 100_000,
            idle_sleep_us: 20_000,
            max_dirty_areas: 32,
            fps_ring_len: 20,
            fifo_byte_cap: 400 * 1024 * 1024,
            fifo_count_cap: 10,
            aout_max_prepare_us: 200_000,
            spu_max_prepare_us: 100_000,
            aout_max_input_rate: 3,
            default_rate: 1_000,
            max_cc_channels: 4,
            idle_fill_byte: 0x00,
        }
    }
}
