use serde::Deserialize;

use crate::models::checkout::{CheckoutTheme, MerchantIdScheme};

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub tenant_api: TenantApiConfig,
    pub payment: PaymentConfig,
    #[serde(default)]
    pub topup: TopUpConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// Remote tenant API (list, registration, balance updates)
#[derive(Debug, Clone, Deserialize)]
pub struct TenantApiConfig {
    pub base_url: String,
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PaymentConfig {
    pub auth_token_url: String,
    pub checkout_url: String,
    pub entity_id: String,
    /// Public key handed to the browser-side checkout widget
    pub public_key: String,
    #[serde(default = "default_currency")]
    pub currency: String,
    #[serde(default = "default_amount")]
    pub amount: u32,
    pub nonce: String,
    pub shopper_result_url: String,
    #[serde(default = "default_true")]
    pub force_default_method: bool,
    #[serde(default = "default_payment_method")]
    pub default_payment_method: String,
    #[serde(default)]
    pub merchant_id_scheme: MerchantIdScheme,
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
    // Retries after the first call, for auth-token and checkout-session requests only
    #[serde(default = "default_retry_attempts")]
    pub retry_attempts: u8,
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,
    #[serde(default)]
    pub widget: WidgetSettings,
    /// Settled attempts kept for status queries; older ones are evicted
    #[serde(default = "default_retained_attempts")]
    pub retained_attempts: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WidgetSettings {
    #[serde(default = "default_widget_target")]
    pub target: String,
    #[serde(default)]
    pub theme: CheckoutTheme,
    /// How long a rendered widget waits for its first event before it is treated as expired
    #[serde(default = "default_session_ttl_secs")]
    pub session_ttl_secs: u64,
}

impl Default for WidgetSettings {
    fn default() -> Self {
        Self {
            target: default_widget_target(),
            theme: CheckoutTheme::default(),
            session_ttl_secs: default_session_ttl_secs(),
        }
    }
}

/// Balance adjustments applied around a top-up.
///
/// `optimistic_increment` lands on the in-memory balance when the operator
/// starts a top-up, `settlement_increment` after the tenant API accepts the
/// updated record. Neither is ever reverted.
#[derive(Debug, Clone, Deserialize)]
pub struct TopUpConfig {
    #[serde(default = "default_optimistic_increment")]
    pub optimistic_increment: f64,
    #[serde(default = "default_settlement_increment")]
    pub settlement_increment: f64,
}

impl Default for TopUpConfig {
    fn default() -> Self {
        Self {
            optimistic_increment: default_optimistic_increment(),
            settlement_increment: default_settlement_increment(),
        }
    }
}

fn default_request_timeout_ms() -> u64 {
    15_000
}

fn default_currency() -> String {
    "ZAR".to_string()
}

fn default_amount() -> u32 {
    1
}

fn default_true() -> bool {
    true
}

fn default_payment_method() -> String {
    "CARD".to_string()
}

fn default_retry_attempts() -> u8 {
    2
}

fn default_retry_backoff_ms() -> u64 {
    200
}

fn default_retained_attempts() -> usize {
    256
}

fn default_widget_target() -> String {
    "#payment-form".to_string()
}

fn default_session_ttl_secs() -> u64 {
    30 * 60
}

fn default_optimistic_increment() -> f64 {
    50.0
}

fn default_settlement_increment() -> f64 {
    20.0
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        // Load .env file if it exists (for environment variable overrides)
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(config::File::with_name("config").required(true))
            .add_source(
                config::Environment::with_prefix("BILLING_CONSOLE")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}
