//! Retry policy with exponential backoff and jitter.
//!
//! Wraps individual upstream calls. Errors classify themselves through
//! [`Retryable`], so the policy stays independent of any particular
//! error type.

use crate::config::RetryConfig;
use crate::stats::StatsCollector;
use rand::Rng;
use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

/// Classification hooks an error type must provide to be retried.
pub trait Retryable {
    /// Whether trying the operation again could succeed.
    fn is_retryable(&self) -> bool;

    /// Whether the failure was a rate limit, which warrants a longer backoff.
    fn is_rate_limited(&self) -> bool;
}

/// Exponential backoff applied around transient upstream failures.
///
/// Delay before attempt `n + 1` is `base^n` seconds plus up to one second
/// of jitter, multiplied further when the failure was a rate limit.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    max_attempts: u32,
    delay_base_secs: f64,
    rate_limit_multiplier: u32,
}

impl RetryPolicy {
    /// Build a policy from configuration. At least one attempt is always
    /// made, whatever the configured value.
    #[must_use]
    pub fn new(config: &RetryConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            delay_base_secs: config.delay_base_secs,
            rate_limit_multiplier: config.rate_limit_multiplier,
        }
    }

    /// Run `operation` until it succeeds, fails non-retryably, or the
    /// attempt ceiling is reached. The last error is returned unchanged.
    ///
    /// Every failed attempt is tallied on `stats`, matching how callers
    /// report retry pressure per run.
    pub async fn run<T, E, F, Fut>(
        &self,
        operation_name: &str,
        stats: &StatsCollector,
        mut operation: F,
    ) -> Result<T, E>
    where
        E: Retryable + Display,
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let mut last_error = None;

        for attempt in 0..self.max_attempts {
            match operation().await {
                Ok(value) => return Ok(value),
                Err(error) if !error.is_retryable() => return Err(error),
                Err(error) => {
                    stats.record_retry();
                    let rate_limited = error.is_rate_limited();

                    if attempt + 1 < self.max_attempts {
                        let mut delay = self.delay_base_secs.powf(f64::from(attempt))
                            + rand::thread_rng().gen_range(0.0..1.0);
                        if rate_limited {
                            delay *= f64::from(self.rate_limit_multiplier);
                            tracing::warn!(
                                "Rate limited for {}, using longer backoff",
                                operation_name
                            );
                        }

                        tracing::warn!(
                            "Attempt {}/{} for {} failed: {}, retrying in {:.1}s",
                            attempt + 1,
                            self.max_attempts,
                            operation_name,
                            error,
                            delay
                        );

                        tokio::time::sleep(Duration::from_secs_f64(delay)).await;
                    }

                    last_error = Some(error);
                }
            }
        }

        Err(last_error.expect("last_error should be Some after exhausting attempts"))
    }
}
