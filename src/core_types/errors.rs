//! Error vocabulary surfaced to the checkout UI
//!
//! Every payment failure, whatever its origin, ends up as an [`ErrorDetails`]
//! tagged with exactly one [`ErrorCategory`] and one [`ErrorAction`].

use serde::{Deserialize, Serialize};
use std::fmt;

/// High-level categorization of payment failures.
///
/// The category decides the default retry eligibility and the tone of the
/// message shown to the shopper.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCategory {
    /// The shopper entered something wrong (card number, CVV, UPI ID).
    UserError,

    /// The payment was understood but refused (funds, limits, bank decline).
    BusinessError,

    /// Gateway, network or backend trouble. Usually transient.
    TechnicalError,

    /// The shopper abandoned or cancelled the payment.
    UserDropped,

    /// The order or amount failed validation before any charge was attempted.
    ValidationError,

    /// Nothing more specific could be determined.
    UnknownError,
}

impl ErrorCategory {
    /// Wire name, matching the backend's error category strings.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::UserError => "USER_ERROR",
            Self::BusinessError => "BUSINESS_ERROR",
            Self::TechnicalError => "TECHNICAL_ERROR",
            Self::UserDropped => "USER_DROPPED",
            Self::ValidationError => "VALIDATION_ERROR",
            Self::UnknownError => "UNKNOWN_ERROR",
        }
    }

    /// Parse a backend category string. Unrecognized values yield `None`.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_uppercase().as_str() {
            "USER_ERROR" => Some(Self::UserError),
            "BUSINESS_ERROR" => Some(Self::BusinessError),
            "TECHNICAL_ERROR" => Some(Self::TechnicalError),
            "USER_DROPPED" => Some(Self::UserDropped),
            "VALIDATION_ERROR" => Some(Self::ValidationError),
            "UNKNOWN_ERROR" => Some(Self::UnknownError),
            _ => None,
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What the shopper should do next to get past a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorAction {
    Retry,
    ReEnterDetails,
    ContactSupport,
    TryAnotherMethod,
    CheckBalance,
    ContactBank,
    None,
}

impl ErrorAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Retry => "RETRY",
            Self::ReEnterDetails => "RE_ENTER_DETAILS",
            Self::ContactSupport => "CONTACT_SUPPORT",
            Self::TryAnotherMethod => "TRY_ANOTHER_METHOD",
            Self::CheckBalance => "CHECK_BALANCE",
            Self::ContactBank => "CONTACT_BANK",
            Self::None => "NONE",
        }
    }
}

impl fmt::Display for ErrorAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Severity used by the UI to pick the alert style, and by us for log levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorSeverity {
    /// Action failed and needs the shopper's attention.
    Error,
    /// Recoverable, usually by retrying or correcting input.
    Warning,
    /// Expected outcome such as a cancelled payment.
    Info,
}

/// Structured description of one payment failure.
///
/// Produced fresh by [`classify`](crate::classifier::classify) on every
/// failure. Only the checkout flow overlays an escalated `user_message` and
/// `retry_count` before handing it to the UI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorDetails {
    /// Gateway or synthetic error code, e.g. `INSUFFICIENT_FUNDS`.
    pub error_code: String,
    pub error_category: ErrorCategory,
    /// Technical message, for logs only.
    pub error_message: String,
    /// Message safe to show to the shopper.
    pub user_message: String,
    pub suggested_action: ErrorAction,
    pub retryable: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retry_count: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gateway_response_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gateway_response_message: Option<String>,
    /// Pretty-printed gateway metadata, for support tickets.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub technical_details: Option<String>,
}

impl ErrorDetails {
    pub const UNKNOWN_CODE: &'static str = "UNKNOWN_ERROR";

    /// The fallback record used whenever nothing better can be derived.
    pub fn unknown(retry_count: u32) -> Self {
        Self {
            error_code: Self::UNKNOWN_CODE.to_string(),
            error_category: ErrorCategory::UnknownError,
            error_message: "An unexpected error occurred".to_string(),
            user_message: "Something went wrong. Please try again or contact support.".to_string(),
            suggested_action: ErrorAction::Retry,
            retryable: true,
            retry_count: Some(retry_count),
            gateway_response_code: None,
            gateway_response_message: None,
            technical_details: None,
        }
    }

    /// Locally synthesized failure that never reached the gateway.
    pub fn synthetic(
        error_code: impl Into<String>,
        error_category: ErrorCategory,
        message: impl Into<String>,
        suggested_action: ErrorAction,
    ) -> Self {
        let message = message.into();
        Self {
            error_code: error_code.into(),
            error_category,
            error_message: message.clone(),
            user_message: message,
            suggested_action,
            retryable: true,
            retry_count: None,
            gateway_response_code: None,
            gateway_response_message: None,
            technical_details: None,
        }
    }

    pub fn with_retry_count(mut self, retry_count: u32) -> Self {
        self.retry_count = Some(retry_count);
        self
    }

    pub fn with_user_message(mut self, user_message: impl Into<String>) -> Self {
        self.user_message = user_message.into();
        self
    }

    pub fn is_technical(&self) -> bool {
        self.error_category == ErrorCategory::TechnicalError
    }
}

impl fmt::Display for ErrorDetails {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({}): {}",
            self.error_code, self.error_category, self.error_message
        )
    }
}

/// Display projection of an [`ErrorDetails`] for an alert box.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorSummary {
    pub title: String,
    pub message: String,
    pub action_text: String,
    pub severity: ErrorSeverity,
}
