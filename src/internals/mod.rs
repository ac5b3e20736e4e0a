//! Internal building blocks for payment-recovery
//!
//! Retry, tracking and analytics helpers. The public pieces are re-exported
//! through `lib.rs` (`retry`, `tracker`, `events`).

pub mod events;
pub mod retry;
pub mod tracker;
