//! Retry logic with exponential backoff
//!
//! This module provides resilient gateway calls for the checkout with:
//! - Exponential backoff: 1s, 2s, 4s ... capped at 10s by default
//! - Pluggable retryability predicate, consulted after every failed attempt
//! - A payment-specific predicate that only retries transient failures
//! - Optional jitter, off by default so delays are exact

use crate::classifier;
use crate::core_types::ErrorCategory;
use crate::error::{GatewayError, GatewayResult, PaymentError, PaymentResult};
use crate::logging::{log_debug, log_info, log_warn};

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;

/// Backoff configuration for gateway operations
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct RetryConfig {
    /// Maximum number of attempts, including the first one
    pub max_attempts: u32,
    /// Delay after the first failed attempt
    pub base_delay: Duration,
    /// Upper bound for any single delay
    pub max_delay: Duration,
    /// Multiplier for exponential backoff
    pub backoff_multiplier: f64,
    /// Fraction of random jitter added on top of each delay (0.0 disables it)
    #[serde(default)]
    pub jitter_ratio: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(1000),
            max_delay: Duration::from_millis(10_000),
            backoff_multiplier: 2.0,
            jitter_ratio: 0.0,
        }
    }
}

impl RetryConfig {
    /// Check the configuration bounds.
    pub fn validate(&self) -> PaymentResult<()> {
        if self.max_attempts < 1 {
            return Err(PaymentError::configuration_error(
                "max_attempts must be at least 1",
            ));
        }
        if self.max_delay < self.base_delay {
            return Err(PaymentError::configuration_error(format!(
                "max_delay ({}ms) must not be shorter than base_delay ({}ms)",
                self.max_delay.as_millis(),
                self.base_delay.as_millis()
            )));
        }
        let multiplier = self.backoff_multiplier;
        if multiplier.is_nan() || multiplier.is_infinite() || multiplier <= 1.0 {
            return Err(PaymentError::configuration_error(format!(
                "backoff_multiplier must be a finite number greater than 1, got {}",
                self.backoff_multiplier
            )));
        }
        if !(0.0..1.0).contains(&self.jitter_ratio) {
            return Err(PaymentError::configuration_error(format!(
                "jitter_ratio must be in [0, 1), got {}",
                self.jitter_ratio
            )));
        }
        Ok(())
    }

    /// Delay to wait after failed attempt `attempt` (1-indexed).
    ///
    /// `min(base_delay * multiplier^(attempt-1), max_delay)`, plus jitter when
    /// `jitter_ratio` is non-zero.
    pub fn calculate_delay(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(i32::MAX as u32) as i32;
        let raw_ms =
            self.base_delay.as_secs_f64() * 1000.0 * self.backoff_multiplier.powi(exponent);
        let max_ms = self.max_delay.as_secs_f64() * 1000.0;

        let capped_ms = if raw_ms.is_finite() {
            raw_ms.min(max_ms)
        } else {
            max_ms
        };
        let delay = Duration::from_secs_f64(capped_ms.max(0.0) / 1000.0);

        if self.jitter_ratio > 0.0 {
            let jitter = fastrand::f64() * self.jitter_ratio;
            Duration::from_secs_f64(delay.as_secs_f64() * (1.0 + jitter))
        } else {
            delay
        }
    }
}

/// Default predicate: retry every failure.
pub fn always_retry<E>(_error: &E, _attempt: u32) -> bool {
    true
}

/// Retry executor that handles exponential backoff
#[derive(Debug, Clone, Default)]
pub struct RetryExecutor {
    config: RetryConfig,
}

impl RetryExecutor {
    /// Create a new retry executor with the given configuration
    pub fn new(config: RetryConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RetryConfig {
        &self.config
    }

    /// Execute an operation, retrying every failure
    pub async fn execute<F, Fut, T, E>(&self, operation: F) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Display,
    {
        self.execute_with(operation, always_retry).await
    }

    /// Execute an operation, retrying failures for which `should_retry` holds.
    ///
    /// The last error is returned unchanged once attempts are exhausted or the
    /// predicate declines.
    pub async fn execute_with<F, Fut, T, E, P>(
        &self,
        mut operation: F,
        should_retry: P,
    ) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Display,
        P: Fn(&E, u32) -> bool,
    {
        let max_attempts = self.config.max_attempts.max(1);
        let mut attempt = 0;

        loop {
            attempt += 1;
            log_debug!(
                attempt = attempt,
                max_attempts = max_attempts,
                "Executing payment operation"
            );

            let error = match operation().await {
                Ok(value) => {
                    if attempt > 1 {
                        log_info!(attempt = attempt, "Payment operation succeeded after retry");
                    }
                    return Ok(value);
                }
                Err(error) => error,
            };

            let retryable = should_retry(&error, attempt);
            if attempt >= max_attempts || !retryable {
                log_warn!(
                    attempts = attempt,
                    max_attempts = max_attempts,
                    retryable = retryable,
                    error = %error,
                    "Payment operation failed, giving up"
                );
                return Err(error);
            }

            let delay = self.config.calculate_delay(attempt);
            log_info!(
                attempt = attempt,
                max_attempts = max_attempts,
                delay_ms = delay.as_millis() as u64,
                error = %error,
                "Payment operation failed, retrying after delay"
            );
            sleep(delay).await;
        }
    }
}

/// Retry `operation` with exponential backoff.
pub async fn retry_with_backoff<F, Fut, T, E, P>(
    operation: F,
    config: &RetryConfig,
    should_retry: P,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Display,
    P: Fn(&E, u32) -> bool,
{
    RetryExecutor::new(config.clone())
        .execute_with(operation, should_retry)
        .await
}

/// Retry a gateway call, retrying only transient payment failures.
pub async fn retry_payment_operation<F, Fut, T>(
    operation: F,
    config: &RetryConfig,
) -> GatewayResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = GatewayResult<T>>,
{
    retry_with_backoff(operation, config, |error: &GatewayError, _attempt| {
        is_retryable_payment_error(error)
    })
    .await
}

/// Decide whether a gateway failure is worth another attempt.
///
/// An explicit `retryable: false` always wins. Otherwise technical failures,
/// network failures, timeouts and 5xx responses are retried; anything else
/// (declines, bad input) is not.
pub fn is_retryable_payment_error(error: &GatewayError) -> bool {
    if error.declared_retryable() == Some(false) {
        return false;
    }

    category_hint(error) == Some(ErrorCategory::TechnicalError)
        || error.is_network()
        || error.is_timeout()
        || error.is_server_error()
}

fn category_hint(error: &GatewayError) -> Option<ErrorCategory> {
    error.declared_category().or_else(|| match error {
        GatewayError::Graphql { extensions, .. } => {
            classifier::lookup(extensions.error_code()).map(|mapping| mapping.category)
        }
        _ => None,
    })
}
