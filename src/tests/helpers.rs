//! Test helper utilities for payment-recovery unit tests
//!
//! IMPORTANT: These helpers are test-only and should NEVER be used in production code.

// Allow dead code in test utilities - functions are used across different test files
#![allow(dead_code)]

use crate::config::PaymentConfig;
use crate::core_types::{
    CardMutationResult, InMemorySessionStore, PaymentGateway, PaymentMethod, StoredCard,
    VpaVerification,
};
use crate::error::{GatewayError, GatewayResult};
use crate::retry::RetryConfig;
use crate::checkout::PaymentSession;
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::time::Duration;

type LinkResponder = Box<dyn Fn(u32) -> GatewayResult<Option<String>> + Send + Sync>;

/// Scripted in-memory gateway that counts every call.
///
/// The payment link responder receives the 1-indexed call number so tests
/// can fail the first few calls and succeed afterwards. VPA and card
/// mutation failures are switched at runtime, since the session owns the
/// gateway once built.
pub struct FakeGateway {
    link_responder: LinkResponder,
    methods: Vec<PaymentMethod>,
    cards: Vec<StoredCard>,
    vpa_status: String,
    fail_methods: bool,
    fail_vpa: AtomicBool,
    fail_card_mutations: AtomicBool,
    reject_card_mutations: AtomicBool,
    link_calls: AtomicU32,
    vpa_calls: AtomicU32,
    methods_calls: AtomicU32,
    cards_calls: AtomicU32,
    mutation_calls: AtomicU32,
}

impl FakeGateway {
    pub fn with_link(url: &str) -> Self {
        let url = url.to_string();
        Self::with_link_responder(move |_| Ok(Some(url.clone())))
    }

    pub fn with_link_responder<F>(responder: F) -> Self
    where
        F: Fn(u32) -> GatewayResult<Option<String>> + Send + Sync + 'static,
    {
        Self {
            link_responder: Box::new(responder),
            methods: vec![
                PaymentMethod::new("CARD", true),
                PaymentMethod::new("UPI", true),
                PaymentMethod::new("WALLET", false),
            ],
            cards: vec![card("tok_visa", "4242"), card("tok_master", "4444")],
            vpa_status: "VALID".to_string(),
            fail_methods: false,
            fail_vpa: AtomicBool::new(false),
            fail_card_mutations: AtomicBool::new(false),
            reject_card_mutations: AtomicBool::new(false),
            link_calls: AtomicU32::new(0),
            vpa_calls: AtomicU32::new(0),
            methods_calls: AtomicU32::new(0),
            cards_calls: AtomicU32::new(0),
            mutation_calls: AtomicU32::new(0),
        }
    }

    /// Every payment link request times out.
    pub fn timing_out() -> Self {
        Self::with_link_responder(|_| Err(GatewayError::message("Gateway timeout")))
    }

    pub fn with_vpa_status(mut self, status: &str) -> Self {
        self.vpa_status = status.to_string();
        self
    }

    pub fn failing_methods(mut self) -> Self {
        self.fail_methods = true;
        self
    }

    /// Make VPA verification fail with a non-retryable gateway error.
    pub fn set_vpa_failing(&self, failing: bool) {
        self.fail_vpa.store(failing, Ordering::SeqCst);
    }

    /// Make card delete and rename fail with a non-retryable gateway error.
    pub fn set_card_mutations_failing(&self, failing: bool) {
        self.fail_card_mutations.store(failing, Ordering::SeqCst);
    }

    /// Make card delete and rename answer `success: false`.
    pub fn set_card_mutations_rejected(&self, rejected: bool) {
        self.reject_card_mutations.store(rejected, Ordering::SeqCst);
    }

    fn card_mutation(&self, card: Option<StoredCard>) -> GatewayResult<CardMutationResult> {
        self.mutation_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_card_mutations.load(Ordering::SeqCst) {
            return Err(GatewayError::http(400, "Card mutation failed"));
        }
        if self.reject_card_mutations.load(Ordering::SeqCst) {
            return Ok(CardMutationResult {
                success: false,
                message: Some("Card could not be updated".to_string()),
                card: None,
            });
        }
        Ok(CardMutationResult {
            success: true,
            message: Some("Card updated".to_string()),
            card,
        })
    }

    pub fn link_calls(&self) -> u32 {
        self.link_calls.load(Ordering::SeqCst)
    }

    pub fn vpa_calls(&self) -> u32 {
        self.vpa_calls.load(Ordering::SeqCst)
    }

    pub fn methods_calls(&self) -> u32 {
        self.methods_calls.load(Ordering::SeqCst)
    }

    pub fn cards_calls(&self) -> u32 {
        self.cards_calls.load(Ordering::SeqCst)
    }

    pub fn mutation_calls(&self) -> u32 {
        self.mutation_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PaymentGateway for FakeGateway {
    async fn fetch_payment_link(&self, _order_code: &str) -> GatewayResult<Option<String>> {
        let call = self.link_calls.fetch_add(1, Ordering::SeqCst) + 1;
        (self.link_responder)(call)
    }

    async fn fetch_payment_methods(
        &self,
        _customer_id: Option<&str>,
    ) -> GatewayResult<Vec<PaymentMethod>> {
        self.methods_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_methods {
            return Err(GatewayError::http(400, "Bad request"));
        }
        Ok(self.methods.clone())
    }

    async fn verify_vpa(&self, _vpa: &str) -> GatewayResult<VpaVerification> {
        self.vpa_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_vpa.load(Ordering::SeqCst) {
            return Err(GatewayError::http(400, "VPA lookup failed"));
        }
        Ok(VpaVerification::with_status(self.vpa_status.as_str()))
    }

    async fn fetch_stored_cards(&self, _customer_id: &str) -> GatewayResult<Vec<StoredCard>> {
        self.cards_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.cards.clone())
    }

    async fn delete_stored_card(&self, _card_token: &str) -> GatewayResult<CardMutationResult> {
        self.card_mutation(None)
    }

    async fn update_card_nickname(
        &self,
        card_token: &str,
        nickname: &str,
    ) -> GatewayResult<CardMutationResult> {
        let mut card = StoredCard::new(card_token);
        card.nickname = Some(nickname.to_string());
        self.card_mutation(Some(card))
    }
}

pub fn card(token: &str, last4: &str) -> StoredCard {
    let mut card = StoredCard::new(token);
    card.last4 = Some(last4.to_string());
    card.brand = Some("VISA".to_string());
    card
}

/// Fast retry configuration so backoff tests stay quick even without paused time
pub fn create_fast_test_retry_config() -> RetryConfig {
    RetryConfig {
        max_attempts: 3,
        base_delay: Duration::from_millis(10),
        max_delay: Duration::from_millis(50),
        backoff_multiplier: 2.0,
        jitter_ratio: 0.0,
    }
}

pub fn create_test_session(
    order_code: &str,
    gateway: FakeGateway,
) -> PaymentSession<FakeGateway, InMemorySessionStore> {
    PaymentSession::new(order_code, 49_900, gateway, InMemorySessionStore::new())
        .with_config(PaymentConfig::default())
        .expect("default config is valid")
}
