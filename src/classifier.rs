//! Payment failure classification.
//!
//! Turns whatever a gateway integration throws at us into an [`ErrorDetails`].
//! The raw failure is first reduced to a [`RawFailure`], decided once at the
//! boundary, and then classified in a fixed priority order:
//!
//! 1. A known gateway error code in structured metadata wins outright.
//! 2. Network failures become `NETWORK_ERROR`.
//! 3. Messages mentioning a timeout become `GATEWAY_TIMEOUT`.
//! 4. Any other message is kept, with a friendlier text derived by keyword.
//! 5. Everything else is `UNKNOWN_ERROR`.
//!
//! Classification never fails. All categories other than the table-driven
//! ones are retryable.

use crate::core_types::{ErrorAction, ErrorCategory, ErrorDetails};
use crate::error::{GatewayError, GatewayExtensions};
use crate::logging::log_debug;
use once_cell::sync::Lazy;
use std::collections::HashMap;

/// Static classification of one known gateway error code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorCodeMapping {
    pub category: ErrorCategory,
    pub action: ErrorAction,
    pub retryable: bool,
    pub user_message: &'static str,
}

const fn mapping(
    category: ErrorCategory,
    action: ErrorAction,
    retryable: bool,
    user_message: &'static str,
) -> ErrorCodeMapping {
    ErrorCodeMapping {
        category,
        action,
        retryable,
        user_message,
    }
}

static ERROR_CODE_MAP: Lazy<HashMap<&'static str, ErrorCodeMapping>> = Lazy::new(|| {
    use ErrorAction as A;
    use ErrorCategory as C;

    HashMap::from([
        // User input errors
        (
            "INVALID_CARD_NUMBER",
            mapping(
                C::UserError,
                A::ReEnterDetails,
                true,
                "The card number you entered is invalid. Please check and try again.",
            ),
        ),
        (
            "INVALID_CVV",
            mapping(
                C::UserError,
                A::ReEnterDetails,
                true,
                "The CVV is incorrect. Please enter the 3-digit code from the back of your card.",
            ),
        ),
        (
            "CARD_EXPIRED",
            mapping(
                C::UserError,
                A::TryAnotherMethod,
                false,
                "This card has expired. Please use a different card.",
            ),
        ),
        (
            "INVALID_EXPIRY_DATE",
            mapping(
                C::UserError,
                A::ReEnterDetails,
                true,
                "The expiry date is invalid. Please check the date on your card.",
            ),
        ),
        (
            "INVALID_VPA",
            mapping(
                C::UserError,
                A::ReEnterDetails,
                true,
                "The UPI ID you entered is invalid. Please check and try again.",
            ),
        ),
        // Business errors
        (
            "INSUFFICIENT_FUNDS",
            mapping(
                C::BusinessError,
                A::CheckBalance,
                false,
                "Your account has insufficient funds. Please use a different payment method.",
            ),
        ),
        (
            "TRANSACTION_LIMIT_EXCEEDED",
            mapping(
                C::BusinessError,
                A::ContactBank,
                false,
                "Transaction limit exceeded. Please contact your bank or try a different card.",
            ),
        ),
        (
            "CARD_NOT_SUPPORTED",
            mapping(
                C::BusinessError,
                A::TryAnotherMethod,
                false,
                "This card is not supported. Please try a different payment method.",
            ),
        ),
        (
            "PAYMENT_METHOD_NOT_ENABLED",
            mapping(
                C::BusinessError,
                A::TryAnotherMethod,
                false,
                "This payment method is not available. Please select another option.",
            ),
        ),
        (
            "BANK_DECLINED",
            mapping(
                C::BusinessError,
                A::ContactBank,
                false,
                "Your bank has declined this transaction. Please contact your bank for details.",
            ),
        ),
        // Technical errors
        (
            "GATEWAY_TIMEOUT",
            mapping(
                C::TechnicalError,
                A::Retry,
                true,
                "The payment gateway timed out. Please try again.",
            ),
        ),
        (
            "GATEWAY_ERROR",
            mapping(
                C::TechnicalError,
                A::Retry,
                true,
                "A technical error occurred. Please try again.",
            ),
        ),
        (
            "NETWORK_ERROR",
            mapping(
                C::TechnicalError,
                A::Retry,
                true,
                "Network connection failed. Please check your internet and try again.",
            ),
        ),
        (
            "SERVICE_UNAVAILABLE",
            mapping(
                C::TechnicalError,
                A::Retry,
                true,
                "Payment service is temporarily unavailable. Please try again in a moment.",
            ),
        ),
        // Shopper dropped out
        (
            "TRANSACTION_CANCELLED",
            mapping(
                C::UserDropped,
                A::None,
                true,
                "You cancelled the payment. Click pay again to retry.",
            ),
        ),
        (
            "SESSION_EXPIRED",
            mapping(
                C::UserDropped,
                A::Retry,
                true,
                "Your session expired. Please try again.",
            ),
        ),
        // Validation errors
        (
            "INVALID_ORDER",
            mapping(
                C::ValidationError,
                A::ContactSupport,
                false,
                "Order validation failed. Please contact support.",
            ),
        ),
        (
            "INVALID_AMOUNT",
            mapping(
                C::ValidationError,
                A::ContactSupport,
                false,
                "Invalid payment amount. Please contact support.",
            ),
        ),
    ])
});

/// Look up a gateway error code in the static mapping table.
pub fn lookup(code: &str) -> Option<&'static ErrorCodeMapping> {
    ERROR_CODE_MAP.get(code)
}

/// Every code the mapping table knows about.
pub fn known_codes() -> impl Iterator<Item = &'static str> {
    ERROR_CODE_MAP.keys().copied()
}

/// A raw failure reduced to the shapes the classifier understands.
#[derive(Debug, Clone, PartialEq)]
pub enum RawFailure {
    /// Structured gateway metadata carrying an error code.
    Structured {
        code: String,
        message: Option<String>,
        extensions: GatewayExtensions,
    },
    /// The backend already classified the failure.
    Classified(Box<ErrorDetails>),
    /// The request never got a response.
    Network { message: Option<String> },
    /// Only free text is available.
    Message { text: String },
    /// Nothing usable.
    Opaque,
}

impl RawFailure {
    /// Reduce a gateway error.
    ///
    /// GraphQL errors only count as structured when their code is in the
    /// mapping table; otherwise their message is all we can use.
    pub fn from_gateway_error(error: &GatewayError) -> Self {
        match error {
            GatewayError::Graphql {
                message,
                extensions,
            } => Self::from_extensions(non_empty(message), extensions.clone()),
            GatewayError::Network { message, .. } => Self::Network {
                message: non_empty(message),
            },
            GatewayError::Classified { details } => Self::Classified(details.clone()),
            GatewayError::Http { .. } | GatewayError::Message { .. } | GatewayError::Other(_) => {
                Self::from_message(error.raw_message())
            }
        }
    }

    /// Reduce a GraphQL error value as returned by the storefront API.
    ///
    /// Looks for `extensions` on the error itself or on the first entry of
    /// `graphQLErrors`, then for a `networkError`, then for a `message`.
    /// Metadata without a known code, or that does not parse, is skipped.
    pub fn from_json(value: &serde_json::Value) -> Self {
        let message = value
            .get("message")
            .and_then(serde_json::Value::as_str)
            .and_then(non_empty);

        let extensions = value.get("extensions").or_else(|| {
            value
                .get("graphQLErrors")
                .and_then(|errors| errors.get(0))
                .and_then(|first| first.get("extensions"))
        });

        if let Some(raw) = extensions.filter(|raw| raw.is_object()) {
            match serde_json::from_value::<GatewayExtensions>(raw.clone()) {
                Ok(extensions) if lookup(extensions.error_code()).is_some() => {
                    return Self::from_extensions(message, extensions);
                }
                Ok(_) => {}
                Err(err) => {
                    log_debug!(
                        error = %err,
                        "Unparseable gateway error extensions, classifying by message"
                    );
                }
            }
        }

        let network_flagged = value
            .get("networkError")
            .is_some_and(|flag| !flag.is_null() && flag != &serde_json::Value::Bool(false));
        if network_flagged {
            return Self::Network { message };
        }

        Self::from_message(message)
    }

    fn from_extensions(message: Option<String>, extensions: GatewayExtensions) -> Self {
        let code = extensions.error_code().to_string();
        if lookup(&code).is_some() {
            Self::Structured {
                code,
                message,
                extensions,
            }
        } else {
            Self::from_message(message)
        }
    }

    fn from_message(message: Option<String>) -> Self {
        match message {
            Some(text) => Self::Message { text },
            None => Self::Opaque,
        }
    }
}

fn non_empty(message: &str) -> Option<String> {
    (!message.is_empty()).then(|| message.to_string())
}

/// Classify a raw failure. `retry_count` is how many attempts preceded this one.
pub fn classify(raw: &RawFailure, retry_count: u32) -> ErrorDetails {
    let details = match raw {
        RawFailure::Structured {
            code,
            message,
            extensions,
        } => match lookup(code) {
            Some(mapping) => from_mapping(code, mapping, message.as_deref(), extensions, retry_count),
            None => classify_text(message.as_deref(), retry_count),
        },
        RawFailure::Classified(details) => {
            let mut details = details.as_ref().clone();
            details.retry_count = Some(retry_count);
            details
        }
        RawFailure::Network { .. } => network_error(retry_count),
        RawFailure::Message { text } => classify_text(Some(text), retry_count),
        RawFailure::Opaque => ErrorDetails::unknown(retry_count),
    };

    log_debug!(
        error_code = %details.error_code,
        category = %details.error_category,
        action = %details.suggested_action,
        retryable = details.retryable,
        retry_count = retry_count,
        "Classified payment failure"
    );

    details
}

/// Classify a gateway error directly.
pub fn classify_gateway_error(error: &GatewayError, retry_count: u32) -> ErrorDetails {
    classify(&RawFailure::from_gateway_error(error), retry_count)
}

/// Classify a GraphQL error value directly.
pub fn classify_json(value: &serde_json::Value, retry_count: u32) -> ErrorDetails {
    classify(&RawFailure::from_json(value), retry_count)
}

fn from_mapping(
    code: &str,
    mapping: &ErrorCodeMapping,
    message: Option<&str>,
    extensions: &GatewayExtensions,
    retry_count: u32,
) -> ErrorDetails {
    let error_message = message
        .or(extensions.message.as_deref().filter(|m| !m.is_empty()))
        .unwrap_or(mapping.user_message)
        .to_string();

    ErrorDetails {
        error_code: code.to_string(),
        error_category: mapping.category,
        error_message,
        user_message: mapping.user_message.to_string(),
        suggested_action: mapping.action,
        retryable: mapping.retryable,
        retry_count: Some(retry_count),
        gateway_response_code: extensions.juspay_response_code.clone(),
        gateway_response_message: extensions.juspay_response_message.clone(),
        technical_details: serde_json::to_string_pretty(extensions).ok(),
    }
}

fn classify_text(message: Option<&str>, retry_count: u32) -> ErrorDetails {
    let Some(text) = message.filter(|text| !text.is_empty()) else {
        return ErrorDetails::unknown(retry_count);
    };

    if text.contains("network") {
        return network_error(retry_count);
    }

    if text.to_lowercase().contains("timeout") {
        return ErrorDetails {
            error_code: "GATEWAY_TIMEOUT".to_string(),
            error_category: ErrorCategory::TechnicalError,
            error_message: "Request timed out".to_string(),
            user_message: "The request timed out. Please try again.".to_string(),
            suggested_action: ErrorAction::Retry,
            retryable: true,
            ..ErrorDetails::unknown(retry_count)
        };
    }

    ErrorDetails {
        error_message: text.to_string(),
        user_message: user_friendly_message(text),
        ..ErrorDetails::unknown(retry_count)
    }
}

fn network_error(retry_count: u32) -> ErrorDetails {
    ErrorDetails {
        error_code: "NETWORK_ERROR".to_string(),
        error_category: ErrorCategory::TechnicalError,
        error_message: "Network error occurred".to_string(),
        user_message: "Network connection failed. Please check your internet and try again."
            .to_string(),
        suggested_action: ErrorAction::Retry,
        retryable: true,
        ..ErrorDetails::unknown(retry_count)
    }
}

/// Derive shopper-facing text from a technical message by keyword.
///
/// Falls back to the message itself when no keyword matches.
pub fn user_friendly_message(technical_message: &str) -> String {
    let lower = technical_message.to_lowercase();

    let friendly = if lower.contains("invalid") && lower.contains("card") {
        "Please check your card details and try again."
    } else if lower.contains("declined") {
        "Your payment was declined. Please contact your bank or try a different card."
    } else if lower.contains("insufficient") {
        "Insufficient funds. Please use a different payment method."
    } else if lower.contains("expired") {
        "This card has expired. Please use a different card."
    } else if lower.contains("timeout") {
        "The request timed out. Please try again."
    } else if lower.contains("network") {
        "Network error. Please check your connection and try again."
    } else {
        return technical_message.to_string();
    };

    friendly.to_string()
}
