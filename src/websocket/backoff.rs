//! Reconnection backoff policy.
//!
//! Capped exponential backoff with multiplicative jitter. The delay for
//! attempt `n` (1-based) is `min(initial * 2^(n-1), max)`, scaled by a
//! random factor in `[1 - jitter, 1 + jitter]` and clamped to `max` again.

use std::time::Duration;

use rand::Rng;

/// Reconnection policy for the socket transport.
#[derive(Debug, Clone, PartialEq)]
pub struct ReconnectPolicy {
    /// Delay before the first reconnection attempt
    pub initial_backoff: Duration,
    /// Upper bound for any single delay
    pub max_backoff: Duration,
    /// Attempts before giving up; `None` retries forever
    pub max_retries: Option<u32>,
    /// Jitter ratio in `[0.0, 1.0]`
    pub jitter: f64,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            initial_backoff: Duration::from_secs(1),
            max_backoff: Duration::from_secs(30),
            max_retries: None,
            jitter: 0.2,
        }
    }
}

impl ReconnectPolicy {
    /// Backoff before jitter is applied.
    pub fn base_delay(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(31);
        let factor = 1u32 << exponent;
        self.initial_backoff
            .checked_mul(factor)
            .unwrap_or(self.max_backoff)
            .min(self.max_backoff)
    }

    /// Jittered delay for the given attempt.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.delay_with_rng(attempt, &mut rand::rng())
    }

    pub fn delay_with_rng<R: Rng + ?Sized>(&self, attempt: u32, rng: &mut R) -> Duration {
        let base = self.base_delay(attempt);
        let jitter = self.jitter.clamp(0.0, 1.0);
        if jitter == 0.0 {
            return base;
        }
        let factor = rng.random_range((1.0 - jitter)..=(1.0 + jitter));
        base.mul_f64(factor).min(self.max_backoff)
    }

    /// Whether another attempt is allowed after `attempts` failed ones.
    pub fn allows(&self, attempt: u32) -> bool {
        match self.max_retries {
            Some(max) => attempt <= max,
            None => true,
        }
    }
}
