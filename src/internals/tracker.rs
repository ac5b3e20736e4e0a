//! Per-operation attempt tracking
//!
//! Counts payment attempts per operation id (usually the order code) so the
//! checkout can escalate its messaging and offer alternative payment methods
//! after repeated failures. One tracker belongs to one checkout session.

use crate::logging::log_debug;

use std::collections::HashMap;
use std::time::Duration;
use tokio::time::Instant;

/// Attempts after which alternative payment methods are offered.
pub const DEFAULT_ALTERNATIVES_THRESHOLD: u32 = 3;

/// Minimum spacing between two attempts for the same operation.
pub const DEFAULT_MIN_RETRY_INTERVAL: Duration = Duration::from_millis(1000);

#[derive(Debug, Clone, Copy)]
struct AttemptRecord {
    attempts: u32,
    last_attempt: Instant,
}

/// In-memory attempt counter keyed by operation id.
#[derive(Debug, Default)]
pub struct RetryTracker {
    records: HashMap<String, AttemptRecord>,
}

impl RetryTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an attempt and return the new attempt count.
    pub fn record_attempt(&mut self, operation_id: &str) -> u32 {
        let now = Instant::now();
        let record = self
            .records
            .entry(operation_id.to_string())
            .and_modify(|record| {
                record.attempts += 1;
                record.last_attempt = now;
            })
            .or_insert(AttemptRecord {
                attempts: 1,
                last_attempt: now,
            });

        log_debug!(
            operation_id = %operation_id,
            attempts = record.attempts,
            "Recorded payment attempt"
        );
        record.attempts
    }

    pub fn attempt_count(&self, operation_id: &str) -> u32 {
        self.records
            .get(operation_id)
            .map_or(0, |record| record.attempts)
    }

    /// Whether the shopper should be steered towards another payment method.
    pub fn should_show_alternatives(&self, operation_id: &str, threshold: u32) -> bool {
        self.attempt_count(operation_id) >= threshold
    }

    /// Drop all state for `operation_id`.
    pub fn reset(&mut self, operation_id: &str) {
        if self.records.remove(operation_id).is_some() {
            log_debug!(operation_id = %operation_id, "Reset payment attempts");
        }
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }

    /// True when there was no previous attempt, or the previous one is at
    /// least `min_delay` old.
    pub fn should_allow_retry(&self, operation_id: &str, min_delay: Duration) -> bool {
        self.records
            .get(operation_id)
            .map_or(true, |record| record.last_attempt.elapsed() >= min_delay)
    }

    /// Time of the last attempt, if any.
    pub fn last_attempt(&self, operation_id: &str) -> Option<Instant> {
        self.records
            .get(operation_id)
            .map(|record| record.last_attempt)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
