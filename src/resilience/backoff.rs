//! Capped exponential backoff between read retries.

use rand::Rng;
use std::time::Duration;

use crate::config::RetryConfig;

/// Delay schedule applied between attempts of an idempotent call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackoffPolicy {
    /// Delay before the first retry in milliseconds.
    pub base_ms: u64,
    /// Upper bound on any single delay in milliseconds (before jitter).
    pub max_ms: u64,
}

impl BackoffPolicy {
    pub fn new(base_ms: u64, max_ms: u64) -> Self {
        Self { base_ms, max_ms }
    }

    /// Delay to wait after `failed_attempts` attempts have failed.
    ///
    /// Zero failed attempts means no delay. Jitter adds up to 10% on top of
    /// the capped value so concurrent syncs do not retry in lockstep.
    pub fn delay(&self, failed_attempts: u32) -> Duration {
        if failed_attempts == 0 || self.base_ms == 0 {
            return Duration::ZERO;
        }

        let factor = 2u64.saturating_pow(failed_attempts - 1);
        let capped = self.base_ms.saturating_mul(factor).min(self.max_ms);

        let jitter_range = capped / 10;
        let jitter = if jitter_range > 0 {
            rand::thread_rng().gen_range(0..jitter_range)
        } else {
            0
        };

        Duration::from_millis(capped + jitter)
    }
}

impl From<&RetryConfig> for BackoffPolicy {
    fn from(config: &RetryConfig) -> Self {
        Self::new(config.base_delay_ms, config.max_delay_ms)
    }
}
