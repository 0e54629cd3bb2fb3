use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use super::tenant::Tenant;

pub const MERCHANT_ID_PREFIX: &str = "OrNo";
pub const MERCHANT_ID_SUFFIX: &str = "Acumen";

/// How the merchant transaction id body is generated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MerchantIdScheme {
    /// `OrNo{uuid}Acumen`
    #[default]
    Uuid,
    /// `OrNo{unix millis}Acumen`. Two ids minted in the same millisecond collide.
    Timestamp,
}

/// Client-generated correlation id sent to the payment gateway
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct MerchantTransactionId(String);

impl MerchantTransactionId {
    pub fn generate(scheme: MerchantIdScheme) -> Self {
        match scheme {
            MerchantIdScheme::Uuid => Self::from_body(Uuid::new_v4().simple()),
            MerchantIdScheme::Timestamp => {
                let millis = OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000;
                Self::from_body(millis)
            }
        }
    }

    fn from_body(body: impl std::fmt::Display) -> Self {
        Self(format!("{}{}{}", MERCHANT_ID_PREFIX, body, MERCHANT_ID_SUFFIX))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for MerchantTransactionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Auth-token endpoint response
#[derive(Debug, Deserialize)]
pub struct AuthTokenResponse {
    pub access_token: String,
}

/// Checkout-session creation payload
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutSessionRequest {
    pub access_token: String,
    pub amount: u32,
    pub merchant_transaction_id: MerchantTransactionId,
    pub currency: String,
    pub force_default_method: bool,
    pub entity_id: String,
    pub nonce: String,
    pub shopper_result_url: String,
    pub default_payment_method: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutSessionResponse {
    pub checkout_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutTheme {
    pub brand: BrandTheme,
    pub cards: CardsTheme,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BrandTheme {
    pub primary: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardsTheme {
    pub background: String,
    // config sources may lowercase or snake_case keys
    #[serde(alias = "background_hover", alias = "backgroundhover")]
    pub background_hover: String,
}

impl Default for CheckoutTheme {
    fn default() -> Self {
        Self {
            brand: BrandTheme {
                primary: "#ff0000".to_string(),
            },
            cards: CardsTheme {
                background: "#00ff00".to_string(),
                background_hover: "#F3F3F4".to_string(),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WidgetOptions {
    pub theme: CheckoutTheme,
}

/// Configuration handed to the checkout widget's `initiate`
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WidgetConfig {
    pub key: String,
    pub checkout_id: String,
    pub options: WidgetOptions,
}

/// A rendered widget: its configuration and the DOM target it was mounted into
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WidgetMount {
    pub config: WidgetConfig,
    pub target: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckoutEventKind {
    Completed,
    Cancelled,
    Expired,
}

/// Event raised by the checkout widget
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckoutEvent {
    #[serde(rename = "type")]
    pub kind: CheckoutEventKind,
    #[serde(default)]
    pub payload: serde_json::Value,
}

impl CheckoutEvent {
    pub fn new(kind: CheckoutEventKind, payload: serde_json::Value) -> Self {
        Self { kind, payload }
    }
}

/// Top-up attempt lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckoutState {
    Idle,
    TokenRequested,
    SessionRequested,
    WidgetActive,
    Completed,
    Cancelled,
    Expired,
    Failed,
}

impl CheckoutState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Completed | Self::Cancelled | Self::Expired | Self::Failed
        )
    }
}

impl From<CheckoutEventKind> for CheckoutState {
    fn from(kind: CheckoutEventKind) -> Self {
        match kind {
            CheckoutEventKind::Completed => Self::Completed,
            CheckoutEventKind::Cancelled => Self::Cancelled,
            CheckoutEventKind::Expired => Self::Expired,
        }
    }
}

/// One top-up attempt, from `add credits` to its terminal widget event
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TopUpAttempt {
    pub attempt_id: Uuid,
    /// Tenant record as it will be (or was) sent to the tenant API
    pub tenant: Tenant,
    pub merchant_transaction_id: MerchantTransactionId,
    pub checkout_id: Option<String>,
    pub state: CheckoutState,
    pub widget: Option<WidgetMount>,
    pub last_error: Option<String>,
    /// Set when the optimistic balance increment was left in place without a
    /// confirmed tenant update behind it
    pub reconciliation_gap: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl TopUpAttempt {
    pub fn new(tenant: Tenant, merchant_transaction_id: MerchantTransactionId) -> Self {
        let now = OffsetDateTime::now_utc();
        Self {
            attempt_id: Uuid::new_v4(),
            tenant,
            merchant_transaction_id,
            checkout_id: None,
            state: CheckoutState::Idle,
            widget: None,
            last_error: None,
            reconciliation_gap: false,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn transition(&mut self, state: CheckoutState) {
        self.state = state;
        self.updated_at = OffsetDateTime::now_utc();
    }
}
