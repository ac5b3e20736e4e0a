//! Payment orchestration for one checkout session.
//!
//! [`PaymentSession`] drives a single order through
//! `Idle → Validating → RequestingLink → Redirecting`, or into `Failed`
//! from which the shopper (or an automatic retry) can submit again.
//!
//! Failures never escape as errors: every failure path ends in a
//! [`PaymentFailure`] carrying a displayable [`ErrorDetails`], whose message
//! escalates with the number of attempts made for the order.
//!
//! # Example
//!
//! ```rust,no_run
//! use payment_recovery::checkout::{PaymentOutcome, PaymentSession};
//! use payment_recovery::core_types::{InMemorySessionStore, PaymentGateway};
//!
//! # async fn example(gateway: impl PaymentGateway) -> payment_recovery::PaymentResult<()> {
//! let mut session = PaymentSession::new("ORD-1", 49_900, gateway, InMemorySessionStore::new());
//! session.select_method("CARD");
//!
//! match session.submit_payment().await? {
//!     PaymentOutcome::Redirect { url } => println!("redirect to {url}"),
//!     PaymentOutcome::Failed(failure) => {
//!         println!("{}", failure.summary.message);
//!         if failure.auto_retry.is_some() {
//!             session.run_auto_retry().await?;
//!         }
//!     }
//! }
//! # Ok(())
//! # }
//! ```

use crate::classifier::classify_gateway_error;
use crate::config::PaymentConfig;
use crate::core_types::{
    ErrorAction, ErrorCategory, ErrorDetails, ErrorSummary, PaymentGateway, PaymentMethod,
    PaymentMethodKind, ResumptionContext, SessionStore, StoredCard, CardMutationResult,
};
use crate::error::{PaymentError, PaymentResult};
use crate::events::{track_error, ErrorContext};
use crate::internals::retry::retry_payment_operation;
use crate::internals::tracker::RetryTracker;
use crate::logging::{log_debug, log_info, log_warn};
use crate::messaging::{error_summary, progressive_message, should_auto_retry_within};

use std::time::Duration;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;

/// Where a payment attempt sequence currently stands.
#[derive(Debug, Clone)]
pub enum PaymentState {
    Idle,
    Validating,
    RequestingLink,
    /// Terminal: the shopper is being sent to the hosted payment page.
    Redirecting { url: String },
    /// The last attempt failed; a new submit starts over at `Validating`.
    Failed(Box<PaymentFailure>),
}

impl PaymentState {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Validating => "validating",
            Self::RequestingLink => "requesting_link",
            Self::Redirecting { .. } => "redirecting",
            Self::Failed(_) => "failed",
        }
    }
}

/// A scheduled automatic retry. Cancelling it turns the retry into a no-op.
#[derive(Debug, Clone)]
pub struct AutoRetryHandle {
    token: CancellationToken,
    delay: Duration,
}

impl AutoRetryHandle {
    fn new(delay: Duration) -> Self {
        Self {
            token: CancellationToken::new(),
            delay,
        }
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }
}

/// Everything the UI needs to render a failed attempt.
#[derive(Debug, Clone)]
pub struct PaymentFailure {
    /// Classified failure with the escalated message already applied.
    pub details: ErrorDetails,
    pub summary: ErrorSummary,
    /// Attempts made for this order so far, this one included.
    pub attempt_count: u32,
    /// Offer other payment methods instead of another try.
    pub show_alternatives: bool,
    /// Set when the session will retry on its own after a delay.
    pub auto_retry: Option<AutoRetryHandle>,
}

/// Result of submitting a payment.
#[derive(Debug, Clone)]
pub enum PaymentOutcome {
    /// Hand the shopper to this URL. The session is finished.
    Redirect { url: String },
    Failed(Box<PaymentFailure>),
}

/// Payment orchestration for one order in one checkout session.
///
/// Owns its [`RetryTracker`], so sessions never share attempt counts.
pub struct PaymentSession<G, S> {
    gateway: G,
    store: S,
    config: PaymentConfig,
    tracker: RetryTracker,
    order_code: String,
    amount: u64,
    customer_id: Option<String>,
    selected_method: Option<PaymentMethodKind>,
    selected_card: Option<StoredCard>,
    upi_id: String,
    upi_verified: bool,
    available_methods: Vec<PaymentMethod>,
    stored_cards: Vec<StoredCard>,
    state: PaymentState,
    pending_auto_retry: Option<AutoRetryHandle>,
}

impl<G, S> PaymentSession<G, S>
where
    G: PaymentGateway,
    S: SessionStore,
{
    /// Start a session for `order_code`. `amount` is in minor currency units.
    pub fn new(order_code: impl Into<String>, amount: u64, gateway: G, store: S) -> Self {
        Self {
            gateway,
            store,
            config: PaymentConfig::default(),
            tracker: RetryTracker::new(),
            order_code: order_code.into(),
            amount,
            customer_id: None,
            selected_method: None,
            selected_card: None,
            upi_id: String::new(),
            upi_verified: false,
            available_methods: Vec::new(),
            stored_cards: Vec::new(),
            state: PaymentState::Idle,
            pending_auto_retry: None,
        }
    }

    /// Replace the default configuration.
    ///
    /// # Errors
    ///
    /// Returns [`PaymentError::Configuration`] if `config` fails validation,
    /// e.g. a zero attempt budget or alternatives threshold.
    pub fn with_config(mut self, config: PaymentConfig) -> PaymentResult<Self> {
        config.validate()?;
        self.config = config;
        Ok(self)
    }

    pub fn with_customer(mut self, customer_id: impl Into<String>) -> Self {
        self.customer_id = Some(customer_id.into());
        self
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn state(&self) -> &PaymentState {
        &self.state
    }

    pub fn order_code(&self) -> &str {
        &self.order_code
    }

    pub fn tracker(&self) -> &RetryTracker {
        &self.tracker
    }

    pub fn attempt_count(&self) -> u32 {
        self.tracker.attempt_count(&self.order_code)
    }

    pub fn show_alternatives(&self) -> bool {
        self.tracker
            .should_show_alternatives(&self.order_code, self.config.alternatives_threshold)
    }

    /// Whether enough time passed since the last attempt to allow another.
    pub fn should_allow_retry(&self) -> bool {
        self.tracker
            .should_allow_retry(&self.order_code, self.config.min_retry_interval)
    }

    pub fn selected_method(&self) -> Option<&PaymentMethodKind> {
        self.selected_method.as_ref()
    }

    pub fn selected_card(&self) -> Option<&StoredCard> {
        self.selected_card.as_ref()
    }

    pub fn is_upi_verified(&self) -> bool {
        self.upi_verified
    }

    pub fn available_methods(&self) -> &[PaymentMethod] {
        &self.available_methods
    }

    pub fn stored_cards(&self) -> &[StoredCard] {
        &self.stored_cards
    }

    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    pub fn session_store(&self) -> &S {
        &self.store
    }

    pub fn pending_auto_retry(&self) -> Option<&AutoRetryHandle> {
        self.pending_auto_retry.as_ref()
    }

    // =========================================================================
    // Setup
    // =========================================================================

    /// Load the enabled payment methods, and the stored cards when the
    /// customer is known.
    pub async fn load_payment_methods(&mut self) -> Result<(), ErrorDetails> {
        let customer_id = self.customer_id.as_deref();
        let methods = retry_payment_operation(
            || self.gateway.fetch_payment_methods(customer_id),
            &self.config.retry,
        )
        .await
        .map_err(|err| {
            classify_gateway_error(&err, 0)
                .with_user_message("Failed to load payment methods. Please try again.")
        })?;

        self.available_methods = methods.into_iter().filter(|m| m.enabled).collect();

        if let Some(customer_id) = self.customer_id.as_deref() {
            let cards = retry_payment_operation(
                || self.gateway.fetch_stored_cards(customer_id),
                &self.config.retry,
            )
            .await
            .map_err(|err| {
                classify_gateway_error(&err, 0)
                    .with_user_message("Failed to load saved cards. Please try again.")
            })?;
            self.stored_cards = cards;
        }

        log_debug!(
            order_code = %self.order_code,
            methods = self.available_methods.len(),
            stored_cards = self.stored_cards.len(),
            "Loaded payment options"
        );
        Ok(())
    }

    /// Switch payment method. Starts the attempt count over.
    pub fn select_method(&mut self, method_type: &str) {
        self.selected_method = Some(PaymentMethodKind::from_type(method_type));
        self.selected_card = None;
        self.upi_id.clear();
        self.upi_verified = false;
        self.restart("payment method changed");
    }

    /// Pay with a stored card. Starts the attempt count over.
    pub fn select_card(&mut self, card: StoredCard) {
        self.selected_card = Some(card);
        self.selected_method = Some(PaymentMethodKind::Card);
        self.restart("stored card changed");
    }

    /// Enter a UPI ID. Any earlier verification no longer applies.
    pub fn set_upi_id(&mut self, upi_id: impl Into<String>) {
        self.upi_id = upi_id.into();
        self.upi_verified = false;
    }

    /// Verify the entered UPI ID with the gateway.
    pub async fn verify_vpa(&mut self) -> Result<(), ErrorDetails> {
        if self.upi_id.is_empty() || !self.upi_id.contains('@') {
            self.upi_verified = false;
            return Err(invalid_vpa(
                "Please enter a valid UPI ID (format: username@bank)",
            ));
        }

        let vpa = self.upi_id.as_str();
        let result =
            retry_payment_operation(|| self.gateway.verify_vpa(vpa), &self.config.retry).await;

        match result {
            Ok(verification) if verification.is_valid() => {
                self.upi_verified = true;
                Ok(())
            }
            Ok(verification) => {
                self.upi_verified = false;
                log_debug!(status = %verification.status, "UPI ID rejected by gateway");
                Err(invalid_vpa("Invalid UPI ID. Please check and try again."))
            }
            Err(err) => {
                self.upi_verified = false;
                Err(classify_gateway_error(&err, 0)
                    .with_user_message("Failed to verify UPI ID. Please try again."))
            }
        }
    }

    /// Delete a stored card and drop it from the local list.
    pub async fn delete_stored_card(
        &mut self,
        card_token: &str,
    ) -> Result<CardMutationResult, ErrorDetails> {
        let result = retry_payment_operation(
            || self.gateway.delete_stored_card(card_token),
            &self.config.retry,
        )
        .await
        .map_err(|err| classify_gateway_error(&err, 0))?;

        if result.success {
            self.stored_cards.retain(|card| card.token != card_token);
            if self
                .selected_card
                .as_ref()
                .is_some_and(|card| card.token == card_token)
            {
                self.selected_card = None;
                self.selected_method = None;
                self.restart("selected card deleted");
            }
        }
        Ok(result)
    }

    /// Rename a stored card and update the local copy.
    pub async fn update_card_nickname(
        &mut self,
        card_token: &str,
        nickname: &str,
    ) -> Result<CardMutationResult, ErrorDetails> {
        let result = retry_payment_operation(
            || self.gateway.update_card_nickname(card_token, nickname),
            &self.config.retry,
        )
        .await
        .map_err(|err| classify_gateway_error(&err, 0))?;

        if result.success {
            for card in self
                .stored_cards
                .iter_mut()
                .chain(self.selected_card.iter_mut())
                .filter(|card| card.token == card_token)
            {
                card.nickname = Some(nickname.to_string());
            }
        }
        Ok(result)
    }

    // =========================================================================
    // Payment
    // =========================================================================

    /// Submit the payment.
    ///
    /// # Errors
    ///
    /// Returns [`PaymentError::InvalidState`] if the session already handed
    /// the shopper off to the payment page. Payment failures are not errors;
    /// they come back as [`PaymentOutcome::Failed`].
    pub async fn submit_payment(&mut self) -> PaymentResult<PaymentOutcome> {
        if let PaymentState::Redirecting { .. } = self.state {
            return Err(PaymentError::invalid_state(format!(
                "payment for order {} was already redirected",
                self.order_code
            )));
        }

        // A new submission supersedes any scheduled one.
        self.cancel_auto_retry();

        self.transition(PaymentState::Validating);
        let attempt = self.tracker.record_attempt(&self.order_code);

        if let Some(details) = self.validate_selection() {
            return Ok(self.fail(details, attempt));
        }

        self.transition(PaymentState::RequestingLink);
        let order_code = self.order_code.as_str();
        let link = retry_payment_operation(
            || self.gateway.fetch_payment_link(order_code),
            &self.config.retry,
        )
        .await;

        match link {
            Ok(Some(url)) if !url.is_empty() => Ok(self.redirect(url)),
            Ok(_) => {
                let details = ErrorDetails {
                    error_code: "GATEWAY_ERROR".to_string(),
                    error_category: ErrorCategory::TechnicalError,
                    error_message: "Failed to create payment link".to_string(),
                    user_message: "Failed to create payment link. Please try again.".to_string(),
                    suggested_action: ErrorAction::Retry,
                    retryable: true,
                    ..ErrorDetails::unknown(attempt - 1)
                };
                Ok(self.fail(details, attempt))
            }
            Err(err) => {
                let details = classify_gateway_error(&err, attempt - 1);
                Ok(self.fail(details, attempt))
            }
        }
    }

    /// Wait out the scheduled automatic retry and submit again.
    ///
    /// Returns `None` when nothing is scheduled or the retry was cancelled
    /// before it fired.
    pub async fn run_auto_retry(&mut self) -> PaymentResult<Option<PaymentOutcome>> {
        let Some(handle) = self.pending_auto_retry.take() else {
            return Ok(None);
        };

        tokio::select! {
            biased;
            _ = handle.token.cancelled() => {
                log_debug!(order_code = %self.order_code, "Automatic payment retry cancelled");
                return Ok(None);
            }
            _ = sleep(handle.delay) => {}
        }

        log_info!(
            order_code = %self.order_code,
            attempt = self.attempt_count() + 1,
            "Running automatic payment retry"
        );
        self.submit_payment().await.map(Some)
    }

    /// Cancel the scheduled automatic retry, if any.
    pub fn cancel_auto_retry(&mut self) {
        if let Some(handle) = self.pending_auto_retry.take() {
            handle.cancel();
        }
    }

    fn validate_selection(&self) -> Option<ErrorDetails> {
        match &self.selected_method {
            None => Some(ErrorDetails::synthetic(
                "PAYMENT_METHOD_REQUIRED",
                ErrorCategory::ValidationError,
                "Please select a payment method",
                ErrorAction::TryAnotherMethod,
            )),
            Some(PaymentMethodKind::Upi) if !self.upi_verified => {
                Some(invalid_vpa("Please verify your UPI ID"))
            }
            Some(_) => None,
        }
    }

    fn redirect(&mut self, url: String) -> PaymentOutcome {
        let is_upi = self.selected_method == Some(PaymentMethodKind::Upi);
        let context = ResumptionContext {
            order_code: self.order_code.clone(),
            amount: self.amount,
            payment_method: is_upi.then(|| PaymentMethodKind::Upi.as_str().to_string()),
            vpa: is_upi.then(|| self.upi_id.clone()),
        };
        context.write_to(&mut self.store);

        let attempts = self.attempt_count();
        self.tracker.reset(&self.order_code);

        log_info!(
            order_code = %self.order_code,
            attempts = attempts,
            "Payment link created, redirecting"
        );

        self.transition(PaymentState::Redirecting { url: url.clone() });
        PaymentOutcome::Redirect { url }
    }

    fn fail(&mut self, mut details: ErrorDetails, attempt: u32) -> PaymentOutcome {
        details = details.with_retry_count(attempt.saturating_sub(1));
        details.user_message = progressive_message(&details, attempt);

        let show_alternatives = self.show_alternatives();
        let auto_retry = should_auto_retry_within(&details, self.config.max_auto_retries)
            .then(|| AutoRetryHandle::new(self.config.auto_retry_delay));
        self.pending_auto_retry = auto_retry.clone();

        let mut context = ErrorContext::for_order(self.order_code.as_str());
        if let Some(customer_id) = &self.customer_id {
            context = context.with_customer(customer_id.as_str());
        }
        if let Some(method) = &self.selected_method {
            context = context.with_payment_method(method.as_str());
        }
        track_error(&details, &context);

        log_warn!(
            order_code = %self.order_code,
            error_code = %details.error_code,
            category = %details.error_category,
            attempt = attempt,
            show_alternatives = show_alternatives,
            auto_retry = auto_retry.is_some(),
            "Payment attempt failed"
        );

        let failure = Box::new(PaymentFailure {
            summary: error_summary(&details),
            details,
            attempt_count: attempt,
            show_alternatives,
            auto_retry,
        });
        self.transition(PaymentState::Failed(failure.clone()));
        PaymentOutcome::Failed(failure)
    }

    fn restart(&mut self, reason: &'static str) {
        self.cancel_auto_retry();
        self.tracker.reset(&self.order_code);
        if !matches!(self.state, PaymentState::Redirecting { .. }) {
            self.transition(PaymentState::Idle);
        }
        log_debug!(order_code = %self.order_code, reason = reason, "Payment attempts reset");
    }

    fn transition(&mut self, next: PaymentState) {
        log_debug!(
            order_code = %self.order_code,
            from = self.state.name(),
            to = next.name(),
            "Payment state transition"
        );
        self.state = next;
    }
}

impl<G, S> Drop for PaymentSession<G, S> {
    fn drop(&mut self) {
        if let Some(handle) = self.pending_auto_retry.take() {
            handle.cancel();
        }
    }
}

fn invalid_vpa(message: &str) -> ErrorDetails {
    ErrorDetails::synthetic(
        "INVALID_VPA",
        ErrorCategory::UserError,
        message,
        ErrorAction::ReEnterDetails,
    )
}
