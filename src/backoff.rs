//! Backoff policy for delivery retries

use std::time::Duration;

/// Exponential backoff policy for spacing retry attempts.
///
/// The delay for the retry following a failed attempt is
/// `base * 2^attempt_index`, where `attempt_index` is the zero-based index
/// of the attempt that just failed. There is no jitter and no delay cap;
/// the attempt ceiling bounds total work instead.
#[derive(Debug, Clone)]
pub struct BackoffPolicy {
    /// Base delay unit, doubled for each subsequent attempt
    pub base: Duration,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            base: Duration::from_secs(1),
        }
    }
}

impl BackoffPolicy {
    /// Create a policy with the given base delay
    pub fn new(base: Duration) -> Self {
        Self { base }
    }

    /// Calculate the delay after the attempt at `attempt_index` fails.
    ///
    /// Pure and deterministic: the same index always yields the same delay.
    pub fn delay(&self, attempt_index: u32) -> Duration {
        // Saturate rather than overflow for absurd indices
        let factor = 2u32.checked_pow(attempt_index).unwrap_or(u32::MAX);
        self.base.saturating_mul(factor)
    }

    /// Check whether another attempt is allowed under the ceiling
    pub fn should_retry(&self, attempt_count: u32, max_attempts: u32) -> bool {
        attempt_count < max_attempts
    }
}
