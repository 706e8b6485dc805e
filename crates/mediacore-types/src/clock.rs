// crates/mediacore-types/src/clock.rs
//
// The Clock Adapter: a pure transformation from a stream timestamp
// to a wall-clock display date, plus the current playback rate. Narrow on
// purpose — no notion of "the" clock source lives here, only the contract
// a decoder owner invokes under its own lock for monotonicity.

use crate::error::CoreError;

/// Playback rate relative to `PipelineConfig::default_rate`. Actual speed
/// is `default_rate / rate.0`, so `rate.0 == default_rate` is 1.0x.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Rate(pub u32);

impl Rate {
    pub fn normal(default_rate: u32) -> Self {
        Self(default_rate)
    }

    pub fn speed(self, default_rate: u32) -> f64 {
        if self.0 == 0 {
            0.0
        } else {
            default_rate as f64 / self.0 as f64
        }
    }
}

/// Converts stream timestamps to wall-clock display dates (monotonic
/// microseconds). Implementations are expected to be cheap and called
/// while the decoder owner's mutex is held.
pub trait ClockAdapter: Send {
    /// Convert `stream_ts` (in the stream's own timebase, already expressed
    /// in microseconds by the caller) to a wall-clock date, honouring
    /// `max_bound` as an upper clamp on how far into the future a
    /// conversion may land. Returns `ClockConversionFailure` if the clock
    /// has no reference point yet (e.g. before the first anchor sample).
    fn convert(&mut self, stream_ts: i64, max_bound: i64) -> Result<(i64, Rate), CoreError>;

    /// Current observed playback rate, independent of any particular
    /// conversion.
    fn rate(&self) -> Rate;
}

/// A trivial identity clock: `wall_ts = stream_ts + offset`, rate fixed at
/// `default_rate`. Useful for tests and for embedders that already present
/// timestamps in wall-clock terms.
pub struct IdentityClock {
    pub offset: i64,
    pub default_rate: u32,
}

impl IdentityClock {
    pub fn new(default_rate: u32) -> Self {
        Self { offset: 0, default_rate }
    }
}

impl ClockAdapter for IdentityClock {
    fn convert(&mut self, stream_ts: i64, max_bound: i64) -> Result<(i64, Rate), CoreError> {
        let wall = stream_ts.saturating_add(self.offset);
        if wall > max_bound {
            return Err(CoreError::ClockConversionFailure { stream_ts });
        }
        Ok((wall, Rate(self.default_rate)))
    }

    fn rate(&self) -> Rate {
        Rate(self.default_rate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rate_speed_is_inverse_of_divisor() {
        let r = Rate(2_000);
        assert!((r.speed(1_000) - 0.5).abs() < 1e-9);
    }

    #[test]
    fn identity_clock_applies_offset() {
        let mut c = IdentityClock { offset: 500, default_rate: 1_000 };
        let (wall, rate) = c.convert(1_000, i64::MAX).unwrap();
        assert_eq!(wall, 1_500);
        assert_eq!(rate, Rate(1_000));
    }

    #[test]
    fn identity_clock_rejects_beyond_max_bound() {
        let mut c = IdentityClock::new(1_000);
        assert!(c.convert(10, 5).is_err());
    }
}
