// Unit Tests for Backoff Retry Engine
//
// UNIT UNDER TEST: RetryConfig, RetryExecutor, retry_with_backoff,
//                  retry_payment_operation, is_retryable_payment_error
//
// BUSINESS RESPONSIBILITY:
//   - Retries transient gateway failures with exponential backoff
//   - Never retries declines or bad input, which would only annoy the bank
//   - Bounds total attempts and individual delays
//
// TEST COVERAGE:
//   - Default configuration and validation
//   - Delay progression and capping
//   - Attempt cap and predicate short-circuit
//   - Exact sleep durations under paused time
//   - Payment retry predicate across error shapes

use crate::core_types::{ErrorAction, ErrorCategory, ErrorDetails};
use crate::error::{GatewayError, GatewayExtensions};
use crate::retry::{
    is_retryable_payment_error, retry_payment_operation, retry_with_backoff, RetryConfig,
    RetryExecutor,
};
use crate::tests::helpers::create_fast_test_retry_config;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;
use tokio::time::Instant;

#[cfg(test)]
mod retry_config_tests {
    use super::*;

    #[test]
    fn test_retry_config_defaults() {
        // Arrange
        let config = RetryConfig::default();

        // Act & Assert
        assert_eq!(config.max_attempts, 3, "Should allow 3 attempts in total");
        assert_eq!(config.base_delay, Duration::from_secs(1));
        assert_eq!(config.max_delay, Duration::from_secs(10));
        assert_eq!(config.backoff_multiplier, 2.0);
        assert_eq!(config.jitter_ratio, 0.0, "Jitter should be off by default");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_delay_doubles_then_caps() {
        let config = RetryConfig::default();

        assert_eq!(config.calculate_delay(1), Duration::from_millis(1000));
        assert_eq!(config.calculate_delay(2), Duration::from_millis(2000));
        assert_eq!(config.calculate_delay(3), Duration::from_millis(4000));
        assert_eq!(config.calculate_delay(4), Duration::from_millis(8000));
        assert_eq!(
            config.calculate_delay(5),
            Duration::from_millis(10_000),
            "16s should be capped at max_delay"
        );
        assert_eq!(config.calculate_delay(500), Duration::from_millis(10_000));
    }

    #[test]
    fn test_jitter_only_adds_to_delay() {
        let config = RetryConfig {
            jitter_ratio: 0.5,
            ..RetryConfig::default()
        };

        for _ in 0..20 {
            let delay = config.calculate_delay(2);
            assert!(delay >= Duration::from_millis(2000));
            assert!(delay <= Duration::from_millis(3000));
        }
    }

    #[test]
    fn test_validate_rejects_inconsistent_bounds() {
        let zero_attempts = RetryConfig {
            max_attempts: 0,
            ..RetryConfig::default()
        };
        let inverted = RetryConfig {
            base_delay: Duration::from_secs(5),
            max_delay: Duration::from_secs(1),
            ..RetryConfig::default()
        };
        let flat = RetryConfig {
            backoff_multiplier: 1.0,
            ..RetryConfig::default()
        };
        let nan = RetryConfig {
            backoff_multiplier: f64::NAN,
            ..RetryConfig::default()
        };
        let jitter = RetryConfig {
            jitter_ratio: 1.5,
            ..RetryConfig::default()
        };

        for config in [zero_attempts, inverted, flat, nan, jitter] {
            assert!(config.validate().is_err(), "{config:?} should be rejected");
        }
    }
}

#[cfg(test)]
mod retry_executor_tests {
    use super::*;

    #[tokio::test]
    async fn test_success_on_first_attempt_does_not_retry() {
        // Arrange
        let executor = RetryExecutor::new(create_fast_test_retry_config());
        let calls = AtomicU32::new(0);

        // Act
        let result: Result<&str, String> = executor
            .execute(|| async {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok("link")
            })
            .await;

        // Assert
        assert_eq!(result, Ok("link"));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_recovers_after_transient_failures() {
        let executor = RetryExecutor::new(create_fast_test_retry_config());
        let calls = AtomicU32::new(0);

        let result: Result<u32, String> = executor
            .execute(|| async {
                let call = calls.fetch_add(1, Ordering::SeqCst) + 1;
                if call < 3 {
                    Err(format!("failure {call}"))
                } else {
                    Ok(call)
                }
            })
            .await;

        assert_eq!(result, Ok(3));
    }

    #[tokio::test]
    async fn test_gives_up_after_max_attempts_with_last_error() {
        let executor = RetryExecutor::new(create_fast_test_retry_config());
        let calls = AtomicU32::new(0);

        let result: Result<(), String> = executor
            .execute(|| async {
                let call = calls.fetch_add(1, Ordering::SeqCst) + 1;
                Err(format!("failure {call}"))
            })
            .await;

        assert_eq!(result, Err("failure 3".to_string()));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_predicate_false_stops_immediately() {
        // Arrange
        let config = create_fast_test_retry_config();
        let calls = AtomicU32::new(0);
        let seen_attempts = std::sync::Mutex::new(Vec::new());

        // Act
        let result: Result<(), String> = retry_with_backoff(
            || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err("declined".to_string())
            },
            &config,
            |_err, attempt| {
                seen_attempts.lock().expect("lock").push(attempt);
                false
            },
        )
        .await;

        // Assert
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1, "Should not retry");
        assert_eq!(*seen_attempts.lock().expect("lock"), vec![1]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_sleeps_follow_backoff_schedule() {
        // Test verifies the waits between attempts are exactly 1s then 2s

        // Arrange
        let config = RetryConfig::default();
        let start = Instant::now();
        let call_times = std::sync::Mutex::new(Vec::new());

        // Act
        let result: Result<(), String> = retry_with_backoff(
            || async {
                call_times.lock().expect("lock").push(start.elapsed());
                Err("unavailable".to_string())
            },
            &config,
            |_, _| true,
        )
        .await;

        // Assert
        assert!(result.is_err());
        let times = call_times.lock().expect("lock").clone();
        assert_eq!(
            times,
            vec![
                Duration::ZERO,
                Duration::from_millis(1000),
                Duration::from_millis(3000)
            ]
        );
        assert_eq!(
            start.elapsed(),
            Duration::from_millis(3000),
            "No sleep after the final attempt"
        );
    }

    #[tokio::test]
    async fn test_single_attempt_config_never_sleeps() {
        let config = RetryConfig {
            max_attempts: 1,
            ..RetryConfig::default()
        };
        let calls = AtomicU32::new(0);

        let result: Result<(), String> = retry_with_backoff(
            || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err("nope".to_string())
            },
            &config,
            |_, _| true,
        )
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}

#[cfg(test)]
mod payment_predicate_tests {
    use super::*;

    #[test]
    fn test_transient_failures_are_retryable() {
        assert!(is_retryable_payment_error(&GatewayError::network(
            "connection reset",
            None
        )));
        assert!(is_retryable_payment_error(&GatewayError::message(
            "Gateway Timeout"
        )));
        assert!(is_retryable_payment_error(&GatewayError::http(
            503,
            "Service unavailable"
        )));
        assert!(is_retryable_payment_error(&GatewayError::graphql(
            "Upstream failed",
            GatewayExtensions::with_code("GATEWAY_ERROR"),
        )));
    }

    #[test]
    fn test_declines_and_bad_input_are_not_retryable() {
        assert!(!is_retryable_payment_error(&GatewayError::graphql(
            "Declined",
            GatewayExtensions::with_code("BANK_DECLINED"),
        )));
        assert!(!is_retryable_payment_error(&GatewayError::http(
            400,
            "Bad request"
        )));
        assert!(!is_retryable_payment_error(&GatewayError::message(
            "Something odd happened"
        )));
    }

    #[test]
    fn test_declared_not_retryable_wins_over_category() {
        // Arrange
        let mut details = ErrorDetails::synthetic(
            "GATEWAY_ERROR",
            ErrorCategory::TechnicalError,
            "network partition",
            ErrorAction::Retry,
        );
        details.retryable = false;

        // Act & Assert
        assert!(!is_retryable_payment_error(&GatewayError::classified(
            details
        )));
    }

    #[test]
    fn test_declared_technical_category_is_retryable() {
        let extensions = GatewayExtensions {
            category: Some("TECHNICAL_ERROR".to_string()),
            ..GatewayExtensions::with_code("BRAND_NEW_CODE")
        };

        assert!(is_retryable_payment_error(&GatewayError::graphql(
            "Backend hiccup",
            extensions
        )));
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_payment_operation_stops_on_decline() {
        // Arrange
        let calls = AtomicU32::new(0);

        // Act
        let result: Result<(), GatewayError> = retry_payment_operation(
            || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(GatewayError::graphql(
                    "Insufficient funds",
                    GatewayExtensions::with_code("INSUFFICIENT_FUNDS"),
                ))
            },
            &RetryConfig::default(),
        )
        .await;

        // Assert
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_payment_operation_retries_timeouts_to_the_cap() {
        let calls = AtomicU32::new(0);

        let result: Result<(), GatewayError> = retry_payment_operation(
            || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(GatewayError::message("Gateway timeout"))
            },
            &RetryConfig::default(),
        )
        .await;

        assert!(matches!(result, Err(GatewayError::Message { .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }
}
