//! Session-scoped storage for the payment return handler
//!
//! Before redirecting to the hosted payment page the checkout writes just
//! enough context for the return handler to pick the order back up.

use std::collections::HashMap;

pub const ORDER_CODE_KEY: &str = "payment_order_code";
pub const AMOUNT_KEY: &str = "payment_amount";
pub const PAYMENT_METHOD_KEY: &str = "payment_method";
pub const VPA_KEY: &str = "payment_vpa";

/// Key/value storage scoped to one browser or client session.
pub trait SessionStore: Send {
    fn set_item(&mut self, key: &str, value: String);
    fn get_item(&self, key: &str) -> Option<String>;
    fn remove_item(&mut self, key: &str);
}

/// Plain in-memory [`SessionStore`].
#[derive(Debug, Default, Clone)]
pub struct InMemorySessionStore {
    items: HashMap<String, String>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl SessionStore for InMemorySessionStore {
    fn set_item(&mut self, key: &str, value: String) {
        self.items.insert(key.to_string(), value);
    }

    fn get_item(&self, key: &str) -> Option<String> {
        self.items.get(key).cloned()
    }

    fn remove_item(&mut self, key: &str) {
        self.items.remove(key);
    }
}

/// What the return handler needs to resume a payment after the redirect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResumptionContext {
    pub order_code: String,
    /// Order total in minor currency units.
    pub amount: u64,
    /// Only recorded for UPI payments.
    pub payment_method: Option<String>,
    /// Verified UPI ID, only for UPI payments.
    pub vpa: Option<String>,
}

impl ResumptionContext {
    pub fn write_to(&self, store: &mut dyn SessionStore) {
        store.set_item(ORDER_CODE_KEY, self.order_code.clone());
        store.set_item(AMOUNT_KEY, self.amount.to_string());
        match (&self.payment_method, &self.vpa) {
            (Some(method), Some(vpa)) => {
                store.set_item(PAYMENT_METHOD_KEY, method.clone());
                store.set_item(VPA_KEY, vpa.clone());
            }
            _ => {
                store.remove_item(PAYMENT_METHOD_KEY);
                store.remove_item(VPA_KEY);
            }
        }
    }

    /// Read the context back. Returns `None` when the order code or a
    /// parseable amount is missing.
    pub fn read_from(store: &dyn SessionStore) -> Option<Self> {
        let order_code = store.get_item(ORDER_CODE_KEY)?;
        let amount = store.get_item(AMOUNT_KEY)?.parse().ok()?;
        Some(Self {
            order_code,
            amount,
            payment_method: store.get_item(PAYMENT_METHOD_KEY),
            vpa: store.get_item(VPA_KEY),
        })
    }
}
