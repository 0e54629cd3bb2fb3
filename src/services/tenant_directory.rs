use anyhow::Context;
use async_trait::async_trait;
use reqwest::{Response, Url};
use tracing::{info, instrument};

use crate::{
    config::TenantApiConfig,
    error::{ApiError, Result},
    models::{
        session::OperatorSession,
        tenant::{Tenant, TenantRegistrationRequest},
    },
};

/// Remote tenant API consumed by the console
#[async_trait]
pub trait TenantDirectory: Send + Sync {
    /// GET `{base}/tenants`
    async fn fetch(&self, session: &OperatorSession) -> Result<Vec<Tenant>>;

    /// POST `{base}/registration`
    async fn register(
        &self,
        session: &OperatorSession,
        request: &TenantRegistrationRequest,
    ) -> Result<serde_json::Value>;

    /// PUT `{base}/tenant/{tenant_id}` with the full record.
    ///
    /// The response body is returned as-is and never compared with the request.
    async fn update(&self, session: &OperatorSession, tenant: &Tenant)
        -> Result<serde_json::Value>;
}

pub struct HttpTenantDirectory {
    base_url: Url,
    http_client: reqwest::Client,
}

impl HttpTenantDirectory {
    pub fn new(config: &TenantApiConfig) -> anyhow::Result<Self> {
        let base_url = Url::parse(&config.base_url)
            .with_context(|| format!("Invalid tenant API base URL {}", config.base_url))?;
        if base_url.cannot_be_a_base() {
            anyhow::bail!("Tenant API base URL {} cannot take a path", config.base_url);
        }

        let http_client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_millis(config.request_timeout_ms))
            .connect_timeout(std::time::Duration::from_secs(10))
            .build()?;

        Ok(Self {
            base_url,
            http_client,
        })
    }

    /// Appends path segments to the base URL, percent-encoding each one
    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| {
                ApiError::TenantApi(format!(
                    "Tenant API base URL {} cannot take a path",
                    self.base_url
                ))
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn tenants_url(&self) -> Result<Url> {
        self.endpoint(&["tenants"])
    }

    fn registration_url(&self) -> Result<Url> {
        self.endpoint(&["registration"])
    }

    fn tenant_url(&self, tenant_id: &str) -> Result<Url> {
        self.endpoint(&["tenant", tenant_id])
    }

    async fn ensure_success(response: Response, action: &str) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let text = response.text().await.unwrap_or_default();
        Err(ApiError::TenantApi(format!(
            "{} failed with status {}: {}",
            action,
            status.as_u16(),
            text
        )))
    }

    /// Reads a body that may be empty or non-JSON without failing the call
    async fn lenient_json(response: Response) -> Result<serde_json::Value> {
        let text = response
            .text()
            .await
            .map_err(|e| ApiError::TenantApi(format!("Failed to read response: {}", e)))?;

        if text.trim().is_empty() {
            return Ok(serde_json::Value::Null);
        }

        Ok(serde_json::from_str(&text).unwrap_or(serde_json::Value::String(text)))
    }
}

#[async_trait]
impl TenantDirectory for HttpTenantDirectory {
    #[instrument(skip(self, session))]
    async fn fetch(&self, session: &OperatorSession) -> Result<Vec<Tenant>> {
        let response = self
            .http_client
            .get(self.tenants_url()?)
            .bearer_auth(session.access_token())
            .send()
            .await
            .map_err(|e| ApiError::TenantApi(format!("Tenant list request failed: {}", e)))?;

        let tenants: Vec<Tenant> = Self::ensure_success(response, "Tenant list")
            .await?
            .json()
            .await
            .map_err(|e| ApiError::TenantApi(format!("Invalid tenant list: {}", e)))?;

        info!("Fetched {} tenants", tenants.len());

        Ok(tenants)
    }

    #[instrument(skip(self, session, request))]
    async fn register(
        &self,
        session: &OperatorSession,
        request: &TenantRegistrationRequest,
    ) -> Result<serde_json::Value> {
        let response = self
            .http_client
            .post(self.registration_url()?)
            .bearer_auth(session.access_token())
            .json(request)
            .send()
            .await
            .map_err(|e| ApiError::TenantApi(format!("Registration request failed: {}", e)))?;

        let response = Self::ensure_success(response, "Tenant registration").await?;

        info!("Registered tenant {}", request.tenant_name);

        Self::lenient_json(response).await
    }

    #[instrument(skip(self, session, tenant), fields(tenant_id = %tenant.tenant_id))]
    async fn update(
        &self,
        session: &OperatorSession,
        tenant: &Tenant,
    ) -> Result<serde_json::Value> {
        let response = self
            .http_client
            .put(self.tenant_url(&tenant.tenant_id)?)
            .bearer_auth(session.access_token())
            .json(tenant)
            .send()
            .await
            .map_err(|e| ApiError::TenantApi(format!("Tenant update request failed: {}", e)))?;

        let response = Self::ensure_success(response, "Tenant update").await?;

        info!(
            "Updated tenant {} with balance {}",
            tenant.tenant_id, tenant.tenant_balance
        );

        Self::lenient_json(response).await
    }
}
