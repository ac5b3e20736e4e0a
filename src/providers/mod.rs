//! Payment gateway decorators
//!
//! - **retrying**: wraps any [`PaymentGateway`](crate::core_types::PaymentGateway)
//!   so every call goes through the payment backoff policy

pub mod retrying;

pub use retrying::RetryingGateway;
