//! Gateway decorator adding exponential backoff to every call

use crate::core_types::{CardMutationResult, PaymentGateway, PaymentMethod, StoredCard, VpaVerification};
use crate::error::GatewayResult;
use crate::internals::retry::{retry_payment_operation, RetryConfig};
use async_trait::async_trait;

/// Wraps a gateway so each call is retried with the payment retry policy.
///
/// Only transient failures (technical, network, timeout, 5xx) are retried;
/// declines and input errors come back after the first attempt.
///
/// [`PaymentSession`](crate::checkout::PaymentSession) already retries every
/// gateway call with its own [`RetryConfig`]. Wrapping a session's gateway in
/// this type multiplies the attempts: with the defaults a persistent timeout
/// reaches the inner gateway 3 × 3 = 9 times per submission. Use it for
/// callers that talk to the gateway directly.
#[derive(Debug, Clone)]
pub struct RetryingGateway<G> {
    inner: G,
    config: RetryConfig,
}

impl<G> RetryingGateway<G> {
    pub fn new(inner: G, config: RetryConfig) -> Self {
        Self { inner, config }
    }

    pub fn inner(&self) -> &G {
        &self.inner
    }

    pub fn config(&self) -> &RetryConfig {
        &self.config
    }
}

#[async_trait]
impl<G: PaymentGateway> PaymentGateway for RetryingGateway<G> {
    async fn fetch_payment_link(&self, order_code: &str) -> GatewayResult<Option<String>> {
        retry_payment_operation(|| self.inner.fetch_payment_link(order_code), &self.config).await
    }

    async fn fetch_payment_methods(
        &self,
        customer_id: Option<&str>,
    ) -> GatewayResult<Vec<PaymentMethod>> {
        retry_payment_operation(
            || self.inner.fetch_payment_methods(customer_id),
            &self.config,
        )
        .await
    }

    async fn verify_vpa(&self, vpa: &str) -> GatewayResult<VpaVerification> {
        retry_payment_operation(|| self.inner.verify_vpa(vpa), &self.config).await
    }

    async fn fetch_stored_cards(&self, customer_id: &str) -> GatewayResult<Vec<StoredCard>> {
        retry_payment_operation(|| self.inner.fetch_stored_cards(customer_id), &self.config).await
    }

    async fn delete_stored_card(&self, card_token: &str) -> GatewayResult<CardMutationResult> {
        retry_payment_operation(|| self.inner.delete_stored_card(card_token), &self.config).await
    }

    async fn update_card_nickname(
        &self,
        card_token: &str,
        nickname: &str,
    ) -> GatewayResult<CardMutationResult> {
        retry_payment_operation(
            || self.inner.update_card_nickname(card_token, nickname),
            &self.config,
        )
        .await
    }
}
