use crate::error::{PaymentError, PaymentResult};
use crate::internals::retry::RetryConfig;
use crate::internals::tracker::{DEFAULT_ALTERNATIVES_THRESHOLD, DEFAULT_MIN_RETRY_INTERVAL};
use crate::logging::log_debug;
use crate::messaging::MAX_AUTO_RETRIES;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

pub const ENV_MAX_ATTEMPTS: &str = "PAYMENT_RETRY_MAX_ATTEMPTS";
pub const ENV_BASE_DELAY_MS: &str = "PAYMENT_RETRY_BASE_DELAY_MS";
pub const ENV_MAX_DELAY_MS: &str = "PAYMENT_RETRY_MAX_DELAY_MS";
pub const ENV_BACKOFF_MULTIPLIER: &str = "PAYMENT_RETRY_BACKOFF_MULTIPLIER";
pub const ENV_ALTERNATIVES_THRESHOLD: &str = "PAYMENT_ALTERNATIVES_THRESHOLD";
pub const ENV_AUTO_RETRY_DELAY_MS: &str = "PAYMENT_AUTO_RETRY_DELAY_MS";

/// Checkout-wide recovery settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentConfig {
    /// Backoff used for every gateway call
    pub retry: RetryConfig,
    /// Failed attempts after which alternative payment methods are offered
    pub alternatives_threshold: u32,
    /// Minimum spacing between two shopper-initiated attempts
    pub min_retry_interval: Duration,
    /// Wait before an automatic retry re-submits the payment
    pub auto_retry_delay: Duration,
    /// Cap on automatic retries per failure sequence
    pub max_auto_retries: u32,
}

impl Default for PaymentConfig {
    fn default() -> Self {
        Self {
            retry: RetryConfig::default(),
            alternatives_threshold: DEFAULT_ALTERNATIVES_THRESHOLD,
            min_retry_interval: DEFAULT_MIN_RETRY_INTERVAL,
            auto_retry_delay: Duration::from_secs(2),
            max_auto_retries: MAX_AUTO_RETRIES,
        }
    }
}

impl PaymentConfig {
    /// Validate the configuration
    ///
    /// # Errors
    ///
    /// Returns [`PaymentError::Configuration`] if the retry bounds are
    /// inconsistent or the alternatives threshold is zero.
    pub fn validate(&self) -> PaymentResult<()> {
        self.retry.validate()?;
        if self.alternatives_threshold == 0 {
            return Err(PaymentError::configuration_error(
                "alternatives_threshold must be at least 1",
            ));
        }
        Ok(())
    }

    /// Load configuration from environment variables
    /// Unset variables keep their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`PaymentError::Configuration`] if a variable is set but does
    /// not parse, or if the resulting configuration fails validation.
    pub fn from_env() -> PaymentResult<Self> {
        log_debug!("Loading payment configuration from environment");
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from a parsed config section keyed by the same
    /// names as the environment variables.
    pub fn from_section(section: &HashMap<String, String>) -> PaymentResult<Self> {
        Self::from_lookup(|key| section.get(key).cloned())
    }

    fn from_lookup<F>(lookup: F) -> PaymentResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(max_attempts) = Self::parse_param::<u32, _>(&lookup, ENV_MAX_ATTEMPTS)? {
            config.retry.max_attempts = max_attempts;
        }
        if let Some(base_ms) = Self::parse_param::<u64, _>(&lookup, ENV_BASE_DELAY_MS)? {
            config.retry.base_delay = Duration::from_millis(base_ms);
        }
        if let Some(max_ms) = Self::parse_param::<u64, _>(&lookup, ENV_MAX_DELAY_MS)? {
            config.retry.max_delay = Duration::from_millis(max_ms);
        }
        if let Some(multiplier) = Self::parse_param::<f64, _>(&lookup, ENV_BACKOFF_MULTIPLIER)? {
            config.retry.backoff_multiplier = multiplier;
        }
        if let Some(threshold) = Self::parse_param::<u32, _>(&lookup, ENV_ALTERNATIVES_THRESHOLD)? {
            config.alternatives_threshold = threshold;
        }
        if let Some(delay_ms) = Self::parse_param::<u64, _>(&lookup, ENV_AUTO_RETRY_DELAY_MS)? {
            config.auto_retry_delay = Duration::from_millis(delay_ms);
        }

        config.validate()?;

        log_debug!(
            max_attempts = config.retry.max_attempts,
            base_delay_ms = config.retry.base_delay.as_millis() as u64,
            max_delay_ms = config.retry.max_delay.as_millis() as u64,
            alternatives_threshold = config.alternatives_threshold,
            "Payment configuration loaded and validated"
        );

        Ok(config)
    }

    /// Parse one parameter; missing is fine, malformed is an error
    fn parse_param<T, F>(lookup: &F, key: &str) -> PaymentResult<Option<T>>
    where
        T: std::str::FromStr,
        F: Fn(&str) -> Option<String>,
    {
        match lookup(key) {
            None => Ok(None),
            Some(raw) => raw.trim().parse::<T>().map(Some).map_err(|_| {
                PaymentError::configuration_error(format!("Invalid value for {key}: {raw:?}"))
            }),
        }
    }
}
