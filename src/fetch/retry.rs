//! Capped exponential backoff around fallible async operations

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;
use tracing::warn;

use super::error::FetchError;
use crate::utils::constants::{
    DEFAULT_RETRY_ATTEMPTS, DEFAULT_RETRY_INITIAL_DELAY_MS, DEFAULT_RETRY_JITTER_MS,
    DEFAULT_RETRY_MAX_DELAY_MS,
};

/// Bounded retry schedule: `attempts` tries, delay doubling from
/// `initial_delay_ms` up to `max_delay_ms`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    pub attempts: u32,
    pub initial_delay_ms: u64,
    pub max_delay_ms: u64,
    pub jitter_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: DEFAULT_RETRY_ATTEMPTS,
            initial_delay_ms: DEFAULT_RETRY_INITIAL_DELAY_MS,
            max_delay_ms: DEFAULT_RETRY_MAX_DELAY_MS,
            jitter_ms: DEFAULT_RETRY_JITTER_MS,
        }
    }
}

impl RetryPolicy {
    /// Retry schedule without any waiting, for tests and local fixtures
    #[must_use]
    pub const fn immediate(attempts: u32) -> Self {
        Self {
            attempts,
            initial_delay_ms: 0,
            max_delay_ms: 0,
            jitter_ms: 0,
        }
    }

    /// Delay before retry number `retry` (0-based), without jitter
    #[must_use]
    pub fn base_delay(&self, retry: u32) -> Duration {
        let factor = 2u64.saturating_pow(retry);
        Duration::from_millis(
            self.initial_delay_ms
                .saturating_mul(factor)
                .min(self.max_delay_ms),
        )
    }

    fn delay_with_jitter(&self, retry: u32) -> Duration {
        let base = self.base_delay(retry);
        if base.is_zero() || self.jitter_ms == 0 {
            return base;
        }
        base + Duration::from_millis(rand::rng().random_range(0..self.jitter_ms))
    }
}

/// Retry `f` with exponential backoff while its error is transient
///
/// Non-transient errors fail fast; the last error is returned once the
/// attempt budget is spent.
pub async fn retry_with_backoff<F, Fut, T>(policy: &RetryPolicy, f: F) -> Result<T, FetchError>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T, FetchError>>,
{
    let attempts = policy.attempts.max(1);
    let mut retries = 0;
    loop {
        match f().await {
            Ok(result) => return Ok(result),
            Err(e) => {
                if !e.is_transient() {
                    warn!("Non-retryable error encountered, failing fast: {e}");
                    return Err(e);
                }

                if retries + 1 >= attempts {
                    warn!("Max attempts ({attempts}) exhausted: {e}");
                    return Err(e);
                }

                let delay = policy.delay_with_jitter(retries);
                warn!(
                    "Retryable error, attempt {}/{}, retrying in {}ms: {e}",
                    retries + 1,
                    attempts,
                    delay.as_millis()
                );
                tokio::time::sleep(delay).await;
                retries += 1;
            }
        }
    }
}
