//! Bounded retry policy with exponential backoff and jitter.
//!
//! Used by the resolver chain for rate-limit recovery; the delivery side
//! borrows the same policy shape for its throttle cooldown default.

use rand::Rng;
use std::time::Duration;

/// Retry parameters: attempt bound, base delay, and jitter spread.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Maximum attempts before giving up
    pub max_attempts: u32,
    /// Base delay; attempt `n` waits roughly `base * 2^n`
    pub base_delay: Duration,
    /// Fraction of the computed delay used as random jitter (0.0 - 1.0)
    pub jitter_factor: f64,
}

impl RetryPolicy {
    /// Create a policy with the given bounds.
    #[must_use]
    pub fn new(max_attempts: u32, base_delay: Duration, jitter_factor: f64) -> Self {
        Self {
            max_attempts,
            base_delay,
            jitter_factor: jitter_factor.clamp(0.0, 1.0),
        }
    }

    /// Compute the backoff delay for a zero-based attempt number.
    ///
    /// The delay is `base * 2^attempt` scaled by a random factor in
    /// `[1 - jitter, 1 + jitter]`. A server-provided `retry_after` hint acts
    /// as a floor so we never come back earlier than the upstream asked.
    #[must_use]
    pub fn delay_for(&self, attempt: u32, retry_after: Option<Duration>) -> Duration {
        let exp = self
            .base_delay
            .saturating_mul(2u32.saturating_pow(attempt.min(16)));

        let jittered = if self.jitter_factor > 0.0 {
            let factor = rand::thread_rng()
                .gen_range(1.0 - self.jitter_factor..=1.0 + self.jitter_factor);
            exp.mul_f64(factor)
        } else {
            exp
        };

        match retry_after {
            Some(hint) if hint > jittered => hint,
            _ => jittered,
        }
    }

    /// Whether a zero-based attempt number is still within bounds.
    #[must_use]
    pub fn allows(&self, attempt: u32) -> bool {
        attempt < self.max_attempts
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(5, Duration::from_secs(2), 0.3)
    }
}
