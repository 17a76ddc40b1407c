//! Backoff policy for spacing reconnect attempts.

use std::time::Duration;

/// Linear backoff with an upper bound.
///
/// Attempt `k` (1-based) waits `k × base`, capped at `cap`. Attempt numbers
/// grow without bound on unlimited-retry configurations, so the multiply
/// saturates rather than overflowing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Backoff {
    base: Duration,
    cap: Duration,
}

impl Backoff {
    /// Creates a linear backoff growing by `base` per attempt, capped at `cap`.
    pub fn linear(base: Duration, cap: Duration) -> Self {
        Self { base, cap }
    }

    /// Returns the delay before the given 1-based attempt.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        self.base.saturating_mul(attempt).min(self.cap)
    }
}
