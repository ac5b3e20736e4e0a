//! Error types for payment operations.
//!
//! Two error types live here:
//!
//! - [`GatewayError`] is what a [`PaymentGateway`](crate::core_types::PaymentGateway)
//!   implementation returns. It keeps the raw shape of the failure (GraphQL
//!   extensions, transport error, HTTP status) so the classifier can turn it
//!   into an [`ErrorDetails`].
//! - [`PaymentError`] covers failures of this crate itself: bad configuration
//!   or a checkout session used out of order.
//!
//! # Example
//!
//! ```rust
//! use payment_recovery::classifier::classify_gateway_error;
//! use payment_recovery::error::GatewayError;
//!
//! let err = GatewayError::message("Gateway timeout while creating order");
//! let details = classify_gateway_error(&err, 0);
//! assert_eq!(details.error_code, "GATEWAY_TIMEOUT");
//! assert!(details.retryable);
//! ```

use crate::core_types::{ErrorCategory, ErrorDetails, ErrorSeverity};
use crate::logging::{log_error, log_warn};
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

/// Result type for gateway calls.
pub type GatewayResult<T> = std::result::Result<T, GatewayError>;

/// Result type for crate-level operations.
pub type PaymentResult<T> = std::result::Result<T, PaymentError>;

/// The `extensions` object the payment backend attaches to GraphQL errors.
///
/// Unknown keys are preserved in `extra` so they end up in the technical
/// details shown to support. Backends are loose about types: numeric or
/// boolean values of the known fields are read as strings, anything else
/// as absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GatewayExtensions {
    #[serde(
        default,
        deserialize_with = "scalar_as_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub code: Option<String>,
    #[serde(
        default,
        deserialize_with = "scalar_as_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub juspay_error_code: Option<String>,
    #[serde(
        default,
        deserialize_with = "scalar_as_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub juspay_response_code: Option<String>,
    #[serde(
        default,
        deserialize_with = "scalar_as_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub juspay_response_message: Option<String>,
    #[serde(
        default,
        deserialize_with = "scalar_as_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub message: Option<String>,
    #[serde(
        default,
        deserialize_with = "scalar_as_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub category: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl GatewayExtensions {
    /// Build extensions carrying only an error code.
    pub fn with_code(code: impl Into<String>) -> Self {
        Self {
            juspay_error_code: Some(code.into()),
            ..Self::default()
        }
    }

    /// The gateway error code, preferring the gateway-specific field over the
    /// generic GraphQL `code`.
    pub fn error_code(&self) -> &str {
        non_empty(self.juspay_error_code.as_deref())
            .or_else(|| non_empty(self.code.as_deref()))
            .unwrap_or(ErrorDetails::UNKNOWN_CODE)
    }

    pub fn category(&self) -> Option<ErrorCategory> {
        self.category.as_deref().and_then(ErrorCategory::parse)
    }
}

fn scalar_as_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<serde_json::Value>::deserialize(deserializer)? {
        Some(serde_json::Value::String(value)) => Some(value),
        Some(serde_json::Value::Number(value)) => Some(value.to_string()),
        Some(serde_json::Value::Bool(value)) => Some(value.to_string()),
        _ => None,
    })
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

/// Failure reported by a payment gateway call.
///
/// | Variant | Raw shape |
/// |---------|-----------|
/// | `Graphql` | Backend error with structured `extensions` |
/// | `Network` | Transport failure, no response received |
/// | `Http` | Response with a non-success status |
/// | `Classified` | Backend already produced an [`ErrorDetails`] |
/// | `Message` | Free-text failure |
/// | `Other` | Anything else an integration wants to surface |
#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("Gateway rejected request: {message}")]
    Graphql {
        message: String,
        extensions: GatewayExtensions,
    },

    #[error("Network error: {message}")]
    Network {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Gateway returned HTTP {status}: {message}")]
    Http { status: u16, message: String },

    #[error("Payment failed: {details}")]
    Classified { details: Box<ErrorDetails> },

    #[error("{message}")]
    Message { message: String },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl GatewayError {
    // =========================================================================
    // Constructor methods with automatic logging
    // =========================================================================

    pub fn graphql(message: impl Into<String>, extensions: GatewayExtensions) -> Self {
        let message = message.into();
        log_warn!(
            error_type = "gateway_graphql",
            error_code = %extensions.error_code(),
            message = %message,
            "Payment gateway rejected request"
        );
        Self::Graphql {
            message,
            extensions,
        }
    }

    pub fn network(
        message: impl Into<String>,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        let message = message.into();
        log_warn!(
            error_type = "gateway_network",
            message = %message,
            has_source = source.is_some(),
            "Payment gateway unreachable"
        );
        Self::Network { message, source }
    }

    pub fn http(status: u16, message: impl Into<String>) -> Self {
        let message = message.into();
        if status >= 500 {
            log_error!(
                error_type = "gateway_http",
                status = status,
                message = %message,
                "Payment gateway server error"
            );
        } else {
            log_warn!(
                error_type = "gateway_http",
                status = status,
                message = %message,
                "Payment gateway client error"
            );
        }
        Self::Http { status, message }
    }

    pub fn classified(details: ErrorDetails) -> Self {
        log_warn!(
            error_type = "gateway_classified",
            error_code = %details.error_code,
            category = %details.error_category,
            retryable = details.retryable,
            "Payment gateway returned classified failure"
        );
        Self::Classified {
            details: Box::new(details),
        }
    }

    pub fn message(message: impl Into<String>) -> Self {
        let message = message.into();
        log_warn!(
            error_type = "gateway_message",
            message = %message,
            "Payment gateway call failed"
        );
        Self::Message { message }
    }

    // =========================================================================
    // Inspection
    // =========================================================================

    /// The free-text message carried by the error, if any.
    pub fn raw_message(&self) -> Option<String> {
        let message = match self {
            Self::Graphql { message, .. }
            | Self::Network { message, .. }
            | Self::Http { message, .. }
            | Self::Message { message } => message.clone(),
            Self::Classified { details } => details.error_message.clone(),
            Self::Other(err) => err.to_string(),
        };
        (!message.is_empty()).then_some(message)
    }

    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Retryability the error itself declares, if it declares one.
    pub fn declared_retryable(&self) -> Option<bool> {
        match self {
            Self::Classified { details } => Some(details.retryable),
            _ => None,
        }
    }

    /// Category the error itself declares, if it declares one.
    pub fn declared_category(&self) -> Option<ErrorCategory> {
        match self {
            Self::Classified { details } => Some(details.error_category),
            Self::Graphql { extensions, .. } => extensions.category(),
            _ => None,
        }
    }

    /// Transport-level failure, or a message mentioning the network.
    pub fn is_network(&self) -> bool {
        matches!(self, Self::Network { .. })
            || self
                .raw_message()
                .is_some_and(|message| message.contains("network"))
    }

    pub fn is_timeout(&self) -> bool {
        self.raw_message()
            .is_some_and(|message| message.to_lowercase().contains("timeout"))
    }

    pub fn is_server_error(&self) -> bool {
        self.status_code()
            .is_some_and(|status| (500..600).contains(&status))
    }
}

/// Failures of this crate itself, as opposed to failures of the gateway.
#[derive(Error, Debug)]
pub enum PaymentError {
    #[error("Payment configuration error: {message}")]
    Configuration { message: String },

    #[error("Invalid checkout state: {message}")]
    InvalidState { message: String },
}

impl PaymentError {
    pub fn configuration_error(message: impl Into<String>) -> Self {
        let message = message.into();
        log_error!(
            error_type = "configuration_error",
            message = %message,
            "Payment configuration validation failed"
        );
        Self::Configuration { message }
    }

    pub fn invalid_state(message: impl Into<String>) -> Self {
        let message = message.into();
        log_warn!(
            error_type = "invalid_state",
            message = %message,
            "Checkout session used out of order"
        );
        Self::InvalidState { message }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Configuration { .. } => ErrorCategory::TechnicalError,
            Self::InvalidState { .. } => ErrorCategory::ValidationError,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            Self::Configuration { .. } => ErrorSeverity::Error,
            Self::InvalidState { .. } => ErrorSeverity::Warning,
        }
    }

    /// Neither variant goes away by trying again.
    pub fn is_retryable(&self) -> bool {
        false
    }

    pub fn user_message(&self) -> String {
        match self {
            Self::Configuration { .. } => {
                "Payments are temporarily unavailable. Please contact support".to_string()
            }
            Self::InvalidState { .. } => {
                "This payment has already been submitted. Please refresh the page".to_string()
            }
        }
    }
}
