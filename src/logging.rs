//! Logging utilities for payment-recovery
//!
//! Re-exports tracing macros with log_* naming so every module logs the same way.

pub use tracing::{
    debug as log_debug,
    error as log_error,
    info as log_info,
    warn as log_warn,
};
