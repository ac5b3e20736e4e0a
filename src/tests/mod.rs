// Test modules for payment-recovery crate
//
// Each source file has a corresponding test file that focuses on business
// logic verification.

// Test helper utilities (fake gateway, fast retry config)
pub mod helpers;

pub mod retry;
