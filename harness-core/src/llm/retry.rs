//! Bounded exponential-backoff executor for vendor calls.
//!
//! The executor is an explicit strategy object: callers hand it the call to
//! wrap and the set of error kinds they consider transient. Anything outside
//! that set propagates on the first failure.

use crate::config::constants::retry;
use crate::llm::provider::{ErrorKind, LLMError};
use std::collections::HashSet;
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, warn};

/// Retry configuration for vendor calls
#[derive(Debug, Clone, PartialEq)]
pub struct RetryConfig {
    /// Total attempts including the first one
    pub max_attempts: u32,
    pub initial_delay: Duration,
    pub max_delay: Duration,
    pub backoff_multiplier: f64,
    /// Wall-clock budget for a single attempt; exceeding it is a timeout error
    pub attempt_timeout: Option<Duration>,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: retry::MAX_ATTEMPTS,
            initial_delay: Duration::from_millis(retry::INITIAL_DELAY_MS),
            max_delay: Duration::from_millis(retry::MAX_DELAY_MS),
            backoff_multiplier: retry::BACKOFF_MULTIPLIER,
            attempt_timeout: Some(Duration::from_millis(retry::ATTEMPT_TIMEOUT_MS)),
        }
    }
}

impl RetryConfig {
    /// Delay slept after the given failed attempt (1-based)
    pub fn delay_after_attempt(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(32) as i32;
        let scaled = self.initial_delay.as_secs_f64() * self.backoff_multiplier.powi(exponent);
        let capped = scaled.min(self.max_delay.as_secs_f64());
        Duration::from_secs_f64(capped.max(0.0))
    }
}

/// Result of a successful call plus the duration of that attempt alone
#[derive(Debug, Clone, PartialEq)]
pub struct Timed<T> {
    pub value: T,
    pub elapsed: Duration,
}

/// Errors the executor knows how to classify
pub trait RetryableError: std::fmt::Display {
    fn kind(&self) -> ErrorKind;

    /// Error produced when an attempt exceeds its wall-clock budget
    fn timed_out(budget: Duration) -> Self;
}

impl RetryableError for LLMError {
    fn kind(&self) -> ErrorKind {
        LLMError::kind(self)
    }

    fn timed_out(budget: Duration) -> Self {
        LLMError::Timeout(budget.as_millis() as u64)
    }
}

#[derive(Debug, Clone, Default)]
pub struct RetryExecutor {
    config: RetryConfig,
}

impl RetryExecutor {
    pub fn new(config: RetryConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RetryConfig {
        &self.config
    }

    /// Run `operation`, retrying errors whose kind is in `transient`.
    ///
    /// On exhaustion the error of the final attempt is returned unchanged.
    pub async fn execute<F, Fut, T, E>(
        &self,
        transient: &HashSet<ErrorKind>,
        mut operation: F,
    ) -> Result<Timed<T>, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: RetryableError,
    {
        let max_attempts = self.config.max_attempts.max(1);
        let mut attempt = 1;

        loop {
            let started = Instant::now();
            let outcome = match self.config.attempt_timeout {
                Some(budget) => match tokio::time::timeout(budget, operation()).await {
                    Ok(result) => result,
                    Err(_) => Err(E::timed_out(budget)),
                },
                None => operation().await,
            };

            let err = match outcome {
                Ok(value) => {
                    let elapsed = started.elapsed();
                    if attempt > 1 {
                        debug!(attempt, "call succeeded after retry");
                    }
                    return Ok(Timed { value, elapsed });
                }
                Err(err) => err,
            };

            let kind = err.kind();
            if !transient.contains(&kind) {
                debug!(attempt, %kind, error = %err, "non-retryable error");
                return Err(err);
            }

            if attempt >= max_attempts {
                warn!(attempt, %kind, error = %err, "retry attempts exhausted");
                return Err(err);
            }

            let delay = self.config.delay_after_attempt(attempt);
            warn!(
                attempt,
                max_attempts,
                %kind,
                delay = %humantime::format_duration(delay),
                error = %err,
                "transient error, backing off"
            );
            tokio::time::sleep(delay).await;
            attempt += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn executor(max_attempts: u32) -> RetryExecutor {
        RetryExecutor::new(RetryConfig {
            max_attempts,
            initial_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(1),
            backoff_multiplier: 2.0,
            attempt_timeout: Some(Duration::from_secs(5)),
        })
    }

    fn rate_limits() -> HashSet<ErrorKind> {
        HashSet::from([ErrorKind::RateLimit, ErrorKind::QuotaExhausted])
    }

    #[test]
    fn delay_doubles_and_caps() {
        let config = RetryConfig {
            max_attempts: 10,
            initial_delay: Duration::from_millis(100),
            max_delay: Duration::from_millis(500),
            backoff_multiplier: 2.0,
            attempt_timeout: None,
        };
        assert_eq!(config.delay_after_attempt(1), Duration::from_millis(100));
        assert_eq!(config.delay_after_attempt(2), Duration::from_millis(200));
        assert_eq!(config.delay_after_attempt(3), Duration::from_millis(400));
        assert_eq!(config.delay_after_attempt(4), Duration::from_millis(500));
    }

    #[tokio::test(start_paused = true)]
    async fn succeeds_on_final_allowed_attempt() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();
        let started = Instant::now();

        let result = executor(4)
            .execute(&rate_limits(), || {
                let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
                async move {
                    if n < 4 {
                        Err(LLMError::RateLimit(format!("attempt {n}")))
                    } else {
                        Ok("done")
                    }
                }
            })
            .await
            .expect("fourth attempt succeeds");

        assert_eq!(result.value, "done");
        assert_eq!(calls.load(Ordering::SeqCst), 4);
        // 100 + 200 + 400 ms of backoff
        assert_eq!(started.elapsed(), Duration::from_millis(700));
    }

    #[tokio::test(start_paused = true)]
    async fn exhaustion_returns_last_error() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();

        let err = executor(3)
            .execute(&rate_limits(), || {
                let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
                async move { Err::<(), _>(LLMError::QuotaExhausted(format!("attempt {n}"))) }
            })
            .await
            .expect_err("all attempts fail");

        assert_eq!(err, LLMError::QuotaExhausted("attempt 3".to_string()));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn unrecognized_error_is_not_retried() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();
        let started = Instant::now();

        let err = executor(5)
            .execute(&rate_limits(), || {
                counter.fetch_add(1, Ordering::SeqCst);
                async { Err::<(), _>(LLMError::Authentication("bad token".to_string())) }
            })
            .await
            .expect_err("fatal error");

        assert_eq!(err.kind(), ErrorKind::Authentication);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(started.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn elapsed_covers_only_successful_attempt() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();

        let result = executor(3)
            .execute(&rate_limits(), || {
                let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
                async move {
                    if n == 1 {
                        tokio::time::sleep(Duration::from_millis(300)).await;
                        Err(LLMError::RateLimit("slow failure".to_string()))
                    } else {
                        tokio::time::sleep(Duration::from_millis(50)).await;
                        Ok(n)
                    }
                }
            })
            .await
            .expect("second attempt succeeds");

        assert_eq!(result.value, 2);
        assert_eq!(result.elapsed, Duration::from_millis(50));
    }

    #[tokio::test(start_paused = true)]
    async fn attempt_budget_overrun_is_retried_as_timeout() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();
        let executor = RetryExecutor::new(RetryConfig {
            attempt_timeout: Some(Duration::from_millis(200)),
            ..executor(3).config().clone()
        });
        let transient = HashSet::from([ErrorKind::Timeout]);

        let result = executor
            .execute(&transient, || {
                let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
                async move {
                    if n == 1 {
                        tokio::time::sleep(Duration::from_secs(10)).await;
                    }
                    Ok::<_, LLMError>(n)
                }
            })
            .await
            .expect("second attempt is fast");

        assert_eq!(result.value, 2);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}
