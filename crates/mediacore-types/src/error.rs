// crates/mediacore-types/src/error.rs
//
// Per-unit members (LatePicture, NonDatedUnit, RateOutOfBounds,
// ClockConversionFailure, FifoOverflow) are never propagated up as a hard
// `Result::Err` from the worker loops — they are logged and folded into a
// counter, since a single bad unit should never stop the pipeline. They
// still get a variant here so call sites that *do* want to report one
// (tests, narrow helpers) have a typed value instead of a string.

use thiserror::Error;

/// The error taxonomy shared across the pipeline crates.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CoreError {
    #[error("picture/subpicture heap is full (capacity reached)")]
    HeapFull,

    #[error("picture dated before now was dropped (lost)")]
    LatePicture,

    #[error("decoded unit had no timestamp and was dropped")]
    NonDatedUnit,

    #[error("audio unit rate {rate} is outside the allowed bound and was dropped")]
    RateOutOfBounds { rate: i64 },

    #[error("clock failed to convert stream timestamp {stream_ts} to a wall-clock date")]
    ClockConversionFailure { stream_ts: i64 },

    #[error("decoder module for stream {stream_id} failed to load: {reason}")]
    DecoderLoadFailure { stream_id: u32, reason: String },

    #[error("change bitmap bit 0x{bit:x} was not acknowledged by any worker")]
    UnauthorizedChange { bit: u32 },

    #[error("FIFO exceeded byte cap ({bytes} bytes); queue dropped")]
    FifoOverflow { bytes: usize },

    #[error("sink reported an error: {0}")]
    Sink(String),
}

/// Convenience alias used throughout the pipeline crates.
pub type CoreResult<T> = Result<T, CoreError>;
