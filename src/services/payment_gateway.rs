use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{de::DeserializeOwned, Serialize};
use tracing::{info, instrument, warn};

use crate::{
    config::PaymentConfig,
    error::{ApiError, Result},
    models::checkout::{AuthTokenResponse, CheckoutSessionRequest, CheckoutSessionResponse},
};

/// Hosted payment gateway: access tokens and checkout sessions
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn request_access_token(&self) -> Result<String>;

    /// Returns the checkout id for the new session
    async fn create_checkout_session(&self, request: &CheckoutSessionRequest) -> Result<String>;
}

/// Bounded retry with linear backoff
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u8,
    pub backoff: Duration,
}

impl RetryPolicy {
    pub fn from_config(config: &PaymentConfig) -> Self {
        Self {
            max_retries: config.retry_attempts,
            backoff: Duration::from_millis(config.retry_backoff_ms),
        }
    }

    pub fn delay_for(&self, attempt: u8) -> Duration {
        self.backoff * attempt as u32
    }

    /// Server errors and throttling are worth another try; other statuses are final
    pub fn is_retryable(status: StatusCode) -> bool {
        status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS
    }
}

pub struct HttpPaymentGateway {
    auth_token_url: String,
    checkout_url: String,
    retry: RetryPolicy,
    http_client: reqwest::Client,
}

impl HttpPaymentGateway {
    pub fn new(config: &PaymentConfig) -> std::result::Result<Self, reqwest::Error> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .connect_timeout(Duration::from_secs(10))
            .build()?;

        Ok(Self {
            auth_token_url: config.auth_token_url.clone(),
            checkout_url: config.checkout_url.clone(),
            retry: RetryPolicy::from_config(config),
            http_client,
        })
    }

    /// POST a JSON body, retrying transport failures and retryable statuses
    async fn post_json<B, R>(&self, url: &str, body: &B, label: &str) -> Result<R>
    where
        B: Serialize + ?Sized + Sync,
        R: DeserializeOwned,
    {
        let mut attempts = 0;
        let mut last_err = None;

        while attempts <= self.retry.max_retries {
            let response = self.http_client.post(url).json(body).send().await;

            match response {
                Ok(resp) => {
                    if !resp.status().is_success() {
                        let status = resp.status();
                        let text = resp.text().await.unwrap_or_default();
                        let message = format!("{} error {}: {}", label, status.as_u16(), text);

                        if RetryPolicy::is_retryable(status) {
                            attempts += 1;
                            warn!("{} (attempt {})", message, attempts);
                            last_err = Some(message);
                            if attempts <= self.retry.max_retries {
                                tokio::time::sleep(self.retry.delay_for(attempts)).await;
                            }
                            continue;
                        }
                        return Err(ApiError::PaymentGateway(message));
                    }

                    return resp.json::<R>().await.map_err(|e| {
                        ApiError::PaymentGateway(format!("Failed to parse {} response: {}", label, e))
                    });
                }
                Err(e) => {
                    attempts += 1;
                    let message = format!("{} request failed: {}", label, e);
                    warn!("{} (attempt {})", message, attempts);
                    last_err = Some(message);
                    if attempts <= self.retry.max_retries {
                        tokio::time::sleep(self.retry.delay_for(attempts)).await;
                    }
                }
            }
        }

        Err(ApiError::PaymentGateway(
            last_err.unwrap_or_else(|| format!("{} request failed", label)),
        ))
    }
}

#[async_trait]
impl PaymentGateway for HttpPaymentGateway {
    #[instrument(skip(self))]
    async fn request_access_token(&self) -> Result<String> {
        let empty = serde_json::json!({});
        let response: AuthTokenResponse = self
            .post_json(&self.auth_token_url, &empty, "Auth token")
            .await?;

        info!("Obtained payment gateway access token");

        Ok(response.access_token)
    }

    #[instrument(skip(self, request), fields(merchant_transaction_id = %request.merchant_transaction_id))]
    async fn create_checkout_session(&self, request: &CheckoutSessionRequest) -> Result<String> {
        let response: CheckoutSessionResponse = self
            .post_json(&self.checkout_url, request, "Checkout session")
            .await?;

        info!("Created checkout session {}", response.checkout_id);

        Ok(response.checkout_id)
    }
}
