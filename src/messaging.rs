//! Shopper-facing messaging and escalation policy.
//!
//! The same failure should not produce the same text three times in a row.
//! [`progressive_message`] escalates with the failure count, and
//! [`should_auto_retry`] decides when the checkout may quietly try again on
//! the shopper's behalf.

use crate::core_types::{ErrorAction, ErrorCategory, ErrorDetails, ErrorSeverity, ErrorSummary};

/// Automatic retries allowed per failure sequence.
pub const MAX_AUTO_RETRIES: u32 = 2;

const SECOND_ATTEMPT_NOTICE: &str = " This is your second attempt.";

/// Escalation text after repeated technical failures.
pub const TECHNICAL_ESCALATION_MESSAGE: &str =
    "We're experiencing technical difficulties. Please try a different payment method or contact support.";

/// Escalation text after repeated failures of any other kind.
pub const GENERIC_ESCALATION_MESSAGE: &str =
    "Multiple attempts failed. Please try a different payment method or contact support for assistance.";

/// Message to show for the `failure_count`-th consecutive failure.
pub fn progressive_message(details: &ErrorDetails, failure_count: u32) -> String {
    match failure_count {
        0 | 1 => details.user_message.clone(),
        2 => format!("{}{}", details.user_message, SECOND_ATTEMPT_NOTICE),
        _ => match details.error_category {
            ErrorCategory::TechnicalError => TECHNICAL_ESCALATION_MESSAGE.to_string(),
            ErrorCategory::UserError
            | ErrorCategory::BusinessError
            | ErrorCategory::UserDropped
            | ErrorCategory::ValidationError
            | ErrorCategory::UnknownError => GENERIC_ESCALATION_MESSAGE.to_string(),
        },
    }
}

/// Whether the checkout should retry without the shopper asking.
///
/// Only retryable technical failures qualify, and only while fewer than
/// [`MAX_AUTO_RETRIES`] retries preceded this failure.
pub fn should_auto_retry(details: &ErrorDetails) -> bool {
    should_auto_retry_within(details, MAX_AUTO_RETRIES)
}

/// [`should_auto_retry`] with a configurable cap.
pub fn should_auto_retry_within(details: &ErrorDetails, max_auto_retries: u32) -> bool {
    details.retryable
        && details.error_category == ErrorCategory::TechnicalError
        && details.retry_count.unwrap_or(0) < max_auto_retries
}

/// Button label for a suggested action.
pub fn action_label(action: ErrorAction) -> &'static str {
    match action {
        ErrorAction::Retry => "Try Again",
        ErrorAction::ReEnterDetails => "Re-enter Details",
        ErrorAction::TryAnotherMethod | ErrorAction::CheckBalance => {
            "Choose Another Payment Method"
        }
        ErrorAction::ContactBank => "Contact Bank",
        ErrorAction::ContactSupport => "Contact Support",
        ErrorAction::None => "Continue",
    }
}

/// Alert title and severity for a category.
pub fn category_presentation(category: ErrorCategory) -> (&'static str, ErrorSeverity) {
    match category {
        ErrorCategory::UserError => ("Please Check Your Details", ErrorSeverity::Warning),
        ErrorCategory::BusinessError => ("Payment Not Authorized", ErrorSeverity::Error),
        ErrorCategory::TechnicalError => ("Technical Error", ErrorSeverity::Warning),
        ErrorCategory::UserDropped => ("Payment Cancelled", ErrorSeverity::Info),
        ErrorCategory::ValidationError => ("Validation Error", ErrorSeverity::Error),
        ErrorCategory::UnknownError => ("Payment Error", ErrorSeverity::Error),
    }
}

/// Alert box projection of a failure.
pub fn error_summary(details: &ErrorDetails) -> ErrorSummary {
    let (title, severity) = category_presentation(details.error_category);
    ErrorSummary {
        title: title.to_string(),
        message: details.user_message.clone(),
        action_text: action_label(details.suggested_action).to_string(),
        severity,
    }
}
