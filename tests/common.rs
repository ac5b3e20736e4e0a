//! Test helper utilities for payment-recovery integration tests
//!
//! Provides a scripted gateway that plays back queued responses, so a test
//! can describe a whole checkout ("two timeouts, then a link") up front.
//!
//! IMPORTANT: These helpers are test-only and should NEVER be used in production code.

// Allow dead code in test utilities - functions are used across different test files
#![allow(dead_code)]

use async_trait::async_trait;
use payment_recovery::core_types::{
    CardMutationResult, InMemorySessionStore, PaymentGateway, PaymentMethod, StoredCard,
    VpaVerification,
};
use payment_recovery::{GatewayError, GatewayExtensions, GatewayResult, PaymentSession};
use std::collections::VecDeque;
use std::sync::Mutex;

/// One scripted answer to a payment link request.
pub enum LinkStep {
    Link(&'static str),
    Empty,
    Timeout,
    Network,
    ServerError(u16),
    Code(&'static str),
}

impl LinkStep {
    fn play(&self) -> GatewayResult<Option<String>> {
        match self {
            Self::Link(url) => Ok(Some((*url).to_string())),
            Self::Empty => Ok(None),
            Self::Timeout => Err(GatewayError::message("Gateway timeout")),
            Self::Network => Err(GatewayError::network("connection refused", None)),
            Self::ServerError(status) => Err(GatewayError::http(*status, "Upstream failure")),
            Self::Code(code) => Err(GatewayError::graphql(
                format!("Payment failed: {code}"),
                GatewayExtensions::with_code(*code),
            )),
        }
    }
}

/// Gateway that answers link requests from a queue.
///
/// Once the queue runs dry the last step repeats.
pub struct ScriptedGateway {
    steps: Mutex<VecDeque<LinkStep>>,
    last: Mutex<Option<LinkStep>>,
    link_requests: Mutex<Vec<String>>,
}

impl ScriptedGateway {
    pub fn new(steps: impl IntoIterator<Item = LinkStep>) -> Self {
        Self {
            steps: Mutex::new(steps.into_iter().collect()),
            last: Mutex::new(None),
            link_requests: Mutex::new(Vec::new()),
        }
    }

    pub fn link_requests(&self) -> Vec<String> {
        self.link_requests.lock().expect("lock poisoned").clone()
    }
}

#[async_trait]
impl PaymentGateway for ScriptedGateway {
    async fn fetch_payment_link(&self, order_code: &str) -> GatewayResult<Option<String>> {
        self.link_requests
            .lock()
            .expect("lock poisoned")
            .push(order_code.to_string());

        let next = self.steps.lock().expect("lock poisoned").pop_front();
        let mut last = self.last.lock().expect("lock poisoned");
        if let Some(step) = next {
            *last = Some(step);
        }
        match last.as_ref() {
            Some(step) => step.play(),
            None => Ok(None),
        }
    }

    async fn fetch_payment_methods(
        &self,
        _customer_id: Option<&str>,
    ) -> GatewayResult<Vec<PaymentMethod>> {
        Ok(vec![
            PaymentMethod::new("UPI", true),
            PaymentMethod::new("CARD", true),
            PaymentMethod::new("NB", true),
        ])
    }

    async fn verify_vpa(&self, vpa: &str) -> GatewayResult<VpaVerification> {
        let status = if vpa.ends_with("@okbank") {
            "VALID"
        } else {
            "INVALID"
        };
        Ok(VpaVerification::with_status(status))
    }

    async fn fetch_stored_cards(&self, _customer_id: &str) -> GatewayResult<Vec<StoredCard>> {
        Ok(vec![StoredCard::new("tok_saved")])
    }

    async fn delete_stored_card(&self, _card_token: &str) -> GatewayResult<CardMutationResult> {
        Ok(CardMutationResult {
            success: true,
            message: None,
            card: None,
        })
    }

    async fn update_card_nickname(
        &self,
        _card_token: &str,
        _nickname: &str,
    ) -> GatewayResult<CardMutationResult> {
        Err(GatewayError::http(404, "Card not found"))
    }
}

pub fn create_session(
    order_code: &str,
    steps: impl IntoIterator<Item = LinkStep>,
) -> PaymentSession<ScriptedGateway, InMemorySessionStore> {
    PaymentSession::new(
        order_code,
        25_000,
        ScriptedGateway::new(steps),
        InMemorySessionStore::new(),
    )
}
