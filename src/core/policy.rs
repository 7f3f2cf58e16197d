//! Rate limiting and retry for metadata service calls.
//!
//! Every remote call made by the pipelines goes through one
//! [`RateLimitedRetryPolicy`]: a token bucket that rejects calls once the
//! window's budget is spent, wrapped in a retry loop that sleeps and tries
//! again a bounded number of times.

use crate::models::config::{RateLimitSettings, RetrySettings, SettingsProvider};
use crate::{Error, Result};
use governor::{
    clock::DefaultClock,
    state::{InMemoryState, NotKeyed},
    Quota, RateLimiter,
};
use std::future::Future;
use std::num::NonZeroU32;
use std::time::Duration;

/// Token bucket plus bounded retry around a single async operation.
pub struct RateLimitedRetryPolicy {
    limiter: RateLimiter<NotKeyed, InMemoryState, DefaultClock>,
    rate: RateLimitSettings,
    retry: RetrySettings,
}

impl std::fmt::Debug for RateLimitedRetryPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateLimitedRetryPolicy")
            .field("rate", &self.rate)
            .field("retry", &self.retry)
            .finish()
    }
}

impl RateLimitedRetryPolicy {
    /// Build the policy from explicit settings.
    pub fn new(rate: RateLimitSettings, retry: RetrySettings) -> Result<Self> {
        let executions = NonZeroU32::new(rate.executions_per_window)
            .ok_or_else(|| Error::Config("rate_limit.executions_per_window must be > 0".into()))?;

        let burst = match rate.max_burst {
            Some(burst) => NonZeroU32::new(burst)
                .ok_or_else(|| Error::Config("rate_limit.max_burst must be > 0".into()))?,
            None => executions,
        };

        // One permit comes back every window / executions.
        let period = rate.window / executions.get();
        let quota = Quota::with_period(period)
            .ok_or_else(|| Error::Config("rate_limit.window_ms must be > 0".into()))?
            .allow_burst(burst);

        Ok(Self {
            limiter: RateLimiter::direct(quota),
            rate,
            retry,
        })
    }

    /// Build the policy from a settings provider.
    pub fn from_settings(settings: &dyn SettingsProvider) -> Result<Self> {
        Self::new(settings.rate_limit(), settings.retry())
    }

    /// Delay to await once before the first batch of calls.
    pub fn initial_warmup_delay(&self) -> Duration {
        self.rate.window
    }

    /// Sleep for [`Self::initial_warmup_delay`].
    pub async fn warm_up(&self) {
        let delay = self.initial_warmup_delay();
        if !delay.is_zero() {
            tracing::debug!("Warming up rate limiter for {}ms", delay.as_millis());
            tokio::time::sleep(delay).await;
        }
    }

    /// Run `operation` under the rate limit, retrying rejections.
    ///
    /// A local bucket rejection and a remote [`Error::Throttled`] are both
    /// retried up to `retry_count` times. Once retries run out the caller
    /// gets [`Error::RateLimitExceeded`]; every other error is returned as is.
    pub async fn run<T, F, Fut>(&self, mut operation: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut attempt: u32 = 0;

        loop {
            let rejected = match self.limiter.check() {
                Ok(()) => match operation().await {
                    Err(Error::Throttled) => "remote throttled",
                    other => return other,
                },
                Err(_) => "bucket empty",
            };

            if attempt >= self.retry.retry_count {
                tracing::warn!(
                    attempts = attempt + 1,
                    "Rate limit still exceeded after {} retries",
                    self.retry.retry_count
                );
                return Err(Error::RateLimitExceeded {
                    retry_after: self.retry.sleep_between_retries,
                });
            }

            attempt += 1;
            tracing::debug!(
                attempt,
                reason = rejected,
                retry_in_ms = self.retry.sleep_between_retries.as_millis() as u64,
                "Rate limited, retrying"
            );
            tokio::time::sleep(self.retry.sleep_between_retries).await;
        }
    }
}
