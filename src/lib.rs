//! # payment-recovery
//!
//! Payment failure classification and recovery for storefront checkouts.
//!
//! ## Key Features
//!
//! - **Classification**: Any gateway failure becomes a structured [`ErrorDetails`]
//!   with a category, a suggested action and a shopper-safe message
//! - **Backoff**: Exponential-backoff retries that only retry transient failures
//! - **Tracking**: Per-order attempt counts that drive escalation
//! - **Escalation**: Messages that change as failures repeat, and capped automatic retries
//! - **Orchestration**: A checkout session state machine tying it all together
//!
//! ## Example
//!
//! ```rust
//! use payment_recovery::classifier::classify_json;
//! use payment_recovery::messaging::{error_summary, progressive_message};
//! use payment_recovery::ErrorCategory;
//!
//! let raw = serde_json::json!({
//!     "message": "Card declined",
//!     "extensions": { "juspayErrorCode": "INSUFFICIENT_FUNDS" }
//! });
//!
//! let details = classify_json(&raw, 0);
//! assert_eq!(details.error_category, ErrorCategory::BusinessError);
//! assert!(!details.retryable);
//!
//! let summary = error_summary(&details);
//! assert_eq!(summary.title, "Payment Not Authorized");
//! assert!(progressive_message(&details, 2).ends_with("This is your second attempt."));
//! ```

// Allow missing errors documentation - errors are self-documenting via type signatures
#![allow(clippy::missing_errors_doc)]

// Logging utilities (re-exports tracing with log_* naming) - internal only
pub(crate) mod logging;

pub mod checkout;
pub mod classifier;
pub mod config;
pub mod core_types;
pub mod error;
pub(crate) mod internals;
pub mod messaging;
pub mod providers;

pub use internals::{events, retry, tracker};

#[cfg(test)]
pub mod tests;

// Re-export main types
pub use checkout::{AutoRetryHandle, PaymentFailure, PaymentOutcome, PaymentSession, PaymentState};
pub use classifier::{classify, classify_gateway_error, classify_json, RawFailure};
pub use config::PaymentConfig;
pub use error::{GatewayError, GatewayExtensions, GatewayResult, PaymentError, PaymentResult};
pub use providers::RetryingGateway;
pub use retry::{
    is_retryable_payment_error, retry_payment_operation, retry_with_backoff, RetryConfig,
    RetryExecutor,
};
pub use tracker::RetryTracker;

// Re-export core types
pub use core_types::{
    ErrorAction, ErrorCategory, ErrorDetails, ErrorSeverity, ErrorSummary, InMemorySessionStore,
    PaymentGateway, PaymentMethod, PaymentMethodKind, SessionStore, StoredCard,
};
