//! Duration helpers shared by the pacer and the providers.

use std::time::Duration;

/// Extension trait for lossless-enough Duration conversions.
pub trait DurationExt {
    /// Milliseconds as u64, saturating at `u64::MAX`.
    fn as_millis_u64(&self) -> u64;

    /// Absolute difference between two durations.
    fn distance(&self, other: Duration) -> Duration;

    /// Whether `other` lies within `tolerance` of this duration.
    fn is_near(&self, other: Duration, tolerance: Duration) -> bool;
}

impl DurationExt for Duration {
    fn as_millis_u64(&self) -> u64 {
        u64::try_from(self.as_millis()).unwrap_or(u64::MAX)
    }

    fn distance(&self, other: Duration) -> Duration {
        if *self > other {
            *self - other
        } else {
            other - *self
        }
    }

    fn is_near(&self, other: Duration, tolerance: Duration) -> bool {
        self.distance(other) <= tolerance
    }
}

/// Duration from a provider's seconds field, rejecting negatives and NaN.
#[must_use]
pub fn duration_from_secs_f64(secs: f64) -> Option<Duration> {
    Duration::try_from_secs_f64(secs).ok()
}
