//! Core types shared by the classifier, retry engine and checkout flow
//!
//! ## Organization
//! - `errors` - Error vocabulary shown to the shopper
//! - `gateway` - Payment gateway trait and payloads
//! - `storage` - Session storage for the return handler

pub mod errors;
pub mod gateway;
pub mod storage;

// Re-export commonly used types
pub use errors::{ErrorAction, ErrorCategory, ErrorDetails, ErrorSeverity, ErrorSummary};
pub use gateway::{
    normalize_payment_methods, CardMutationResult, PaymentGateway, PaymentMethod,
    PaymentMethodKind, StoredCard, VpaVerification,
};
pub use storage::{InMemorySessionStore, ResumptionContext, SessionStore};
