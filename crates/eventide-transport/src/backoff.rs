//! Retry pacing between collector attempts.

use std::time::Duration;

/// Waiting longer than this between attempts only delays the inevitable:
/// the batch either goes through on a healthy connection or gets requeued
/// by the consumer.
const DEFAULT_CAP: Duration = Duration::from_secs(10);

/// Doubling delay schedule for retryable upload failures.
///
/// The first retry waits `factor`, and every further retry doubles the
/// wait up to a cap, so a flapping connection is not hammered while a
/// short blip costs almost nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryBackoff {
    factor: Duration,
    cap: Duration,
}

impl RetryBackoff {
    /// Creates a schedule starting at `factor`.
    pub fn new(factor: Duration) -> Self {
        Self {
            factor,
            cap: DEFAULT_CAP,
        }
    }

    /// Caps the delay a long outage can grow to.
    ///
    /// Default: 10 seconds
    pub fn cap(mut self, cap: Duration) -> Self {
        self.cap = cap;
        self
    }

    /// Delay before retry `attempt` (0-indexed, so the first retry is 0).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        // Beyond 2^16 the cap has long since taken over.
        let doubled = self.factor.saturating_mul(1 << attempt.min(16));
        doubled.min(self.cap)
    }
}

impl Default for RetryBackoff {
    fn default() -> Self {
        Self::new(Duration::from_millis(300))
    }
}
