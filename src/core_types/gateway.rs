//! Payment gateway trait and the payloads it exchanges
//!
//! The gateway itself (GraphQL transport, card tokenization, bank redirects)
//! lives outside this crate. Implementations only need to map their failures
//! into [`GatewayError`] so the classifier can make sense of them.

use crate::error::GatewayResult;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Payment method offered by the gateway for the current order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentMethod {
    pub payment_method_type: String,
    #[serde(default)]
    pub enabled: bool,
    /// Gateway-specific fields (display names, icons, issuer lists).
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl PaymentMethod {
    pub fn new(payment_method_type: impl Into<String>, enabled: bool) -> Self {
        Self {
            payment_method_type: payment_method_type.into(),
            enabled,
            extra: serde_json::Map::new(),
        }
    }

    pub fn kind(&self) -> PaymentMethodKind {
        PaymentMethodKind::from_type(&self.payment_method_type)
    }
}

/// The payment method families the checkout flow treats differently.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PaymentMethodKind {
    /// UPI requires a verified VPA before a payment link is requested.
    Upi,
    Card,
    NetBanking,
    Wallet,
    Other(String),
}

impl PaymentMethodKind {
    pub fn from_type(method_type: &str) -> Self {
        match method_type.trim().to_uppercase().as_str() {
            "UPI" => Self::Upi,
            "CARD" => Self::Card,
            "NB" | "NETBANKING" | "NET_BANKING" => Self::NetBanking,
            "WALLET" => Self::Wallet,
            _ => Self::Other(method_type.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Upi => "UPI",
            Self::Card => "CARD",
            Self::NetBanking => "NB",
            Self::Wallet => "WALLET",
            Self::Other(other) => other,
        }
    }
}

/// Card saved against a customer by the gateway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredCard {
    pub token: String,
    #[serde(default)]
    pub last4: Option<String>,
    #[serde(default)]
    pub brand: Option<String>,
    #[serde(default)]
    pub expiry_month: Option<String>,
    #[serde(default)]
    pub expiry_year: Option<String>,
    #[serde(default)]
    pub nickname: Option<String>,
}

impl StoredCard {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            last4: None,
            brand: None,
            expiry_month: None,
            expiry_year: None,
            nickname: None,
        }
    }
}

/// Result of a VPA (UPI ID) lookup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VpaVerification {
    pub status: String,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl VpaVerification {
    pub fn with_status(status: impl Into<String>) -> Self {
        Self {
            status: status.into(),
            extra: serde_json::Map::new(),
        }
    }

    pub fn is_valid(&self) -> bool {
        self.status == "VALID"
    }
}

/// Outcome of a stored-card mutation (delete, rename).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardMutationResult {
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub card: Option<StoredCard>,
}

/// Operations the checkout needs from the payment gateway.
///
/// Every method may fail with a gateway-shaped error; callers never inspect
/// it directly but pass it to the classifier.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Create a hosted payment page for the order. `None` or an empty string
    /// means the gateway could not create one.
    async fn fetch_payment_link(&self, order_code: &str) -> GatewayResult<Option<String>>;

    async fn fetch_payment_methods(
        &self,
        customer_id: Option<&str>,
    ) -> GatewayResult<Vec<PaymentMethod>>;

    async fn verify_vpa(&self, vpa: &str) -> GatewayResult<VpaVerification>;

    async fn fetch_stored_cards(&self, customer_id: &str) -> GatewayResult<Vec<StoredCard>>;

    async fn delete_stored_card(&self, card_token: &str) -> GatewayResult<CardMutationResult>;

    async fn update_card_nickname(
        &self,
        card_token: &str,
        nickname: &str,
    ) -> GatewayResult<CardMutationResult>;
}

/// Normalize the backend's payment-method payload.
///
/// The backend answers either with a bare array or with an object holding a
/// `payment_methods` array. Anything else, including entries that do not
/// parse, yields no methods.
pub fn normalize_payment_methods(payload: serde_json::Value) -> Vec<PaymentMethod> {
    let entries = match payload {
        serde_json::Value::Array(entries) => entries,
        serde_json::Value::Object(mut object) => match object.remove("payment_methods") {
            Some(serde_json::Value::Array(entries)) => entries,
            _ => return Vec::new(),
        },
        _ => return Vec::new(),
    };

    entries
        .into_iter()
        .filter_map(|entry| serde_json::from_value(entry).ok())
        .collect()
}
