//! Payment error analytics events.
//!
//! Every failure surfaced to the shopper can be turned into an
//! [`ErrorAnalyticsEvent`] for dashboards and support. Events are emitted as
//! structured `tracing` records; a subscriber decides where they go.
//!
//! # Usage
//!
//! ```rust
//! use payment_recovery::core_types::{ErrorAction, ErrorCategory, ErrorDetails};
//! use payment_recovery::events::{track_error, ErrorContext};
//!
//! let details = ErrorDetails::synthetic(
//!     "INVALID_VPA",
//!     ErrorCategory::UserError,
//!     "Please verify your UPI ID",
//!     ErrorAction::ReEnterDetails,
//! );
//! let context = ErrorContext::for_order("ORD-1").with_payment_method("UPI");
//! let event = track_error(&details, &context);
//! assert_eq!(event.error_code, "INVALID_VPA");
//! assert!(!event.resolved);
//! ```

use crate::core_types::{ErrorCategory, ErrorDetails};
use crate::logging::log_info;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Pre-defined event type string for payment failures.
pub const PAYMENT_ERROR: &str = "payment_error";

/// Where a failure happened, as far as analytics cares.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorContext {
    pub order_id: Option<String>,
    pub customer_id: Option<String>,
    pub payment_method: Option<String>,
}

impl ErrorContext {
    pub fn for_order(order_id: impl Into<String>) -> Self {
        Self {
            order_id: Some(order_id.into()),
            ..Self::default()
        }
    }

    pub fn with_customer(mut self, customer_id: impl Into<String>) -> Self {
        self.customer_id = Some(customer_id.into());
        self
    }

    pub fn with_payment_method(mut self, payment_method: impl Into<String>) -> Self {
        self.payment_method = Some(payment_method.into());
        self
    }
}

/// Analytics record for one surfaced payment failure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorAnalyticsEvent {
    /// Unique identifier for this event (UUID v4).
    pub id: Uuid,
    pub error_code: String,
    pub error_category: ErrorCategory,
    pub order_id: Option<String>,
    pub customer_id: Option<String>,
    pub payment_method: Option<String>,
    /// When the event was created (UTC).
    pub timestamp: DateTime<Utc>,
    pub retry_count: Option<u32>,
    /// Whether the shopper eventually got past this failure.
    pub resolved: bool,
}

impl ErrorAnalyticsEvent {
    pub fn new(details: &ErrorDetails, context: &ErrorContext) -> Self {
        Self {
            id: Uuid::new_v4(),
            error_code: details.error_code.clone(),
            error_category: details.error_category,
            order_id: context.order_id.clone(),
            customer_id: context.customer_id.clone(),
            payment_method: context.payment_method.clone(),
            timestamp: Utc::now(),
            retry_count: details.retry_count,
            resolved: false,
        }
    }
}

/// Build an analytics event for `details` and emit it.
pub fn track_error(details: &ErrorDetails, context: &ErrorContext) -> ErrorAnalyticsEvent {
    let event = ErrorAnalyticsEvent::new(details, context);

    log_info!(
        event_type = PAYMENT_ERROR,
        event_id = %event.id,
        error_code = %event.error_code,
        category = %event.error_category,
        order_id = event.order_id.as_deref().unwrap_or(""),
        customer_id = event.customer_id.as_deref().unwrap_or(""),
        payment_method = event.payment_method.as_deref().unwrap_or(""),
        retry_count = event.retry_count.unwrap_or(0),
        "Payment error"
    );

    event
}
