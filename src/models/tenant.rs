use serde::{Deserialize, Serialize};
use validator::Validate;

/// Columns of the tenant directory table, in display order
pub const TENANT_COLUMNS: [&str; 7] = [
    "tenantId",
    "tenantName",
    "tenantEmail",
    "tenantTier",
    "isActive",
    "tenantBalance",
    "addCredits",
];

/// Tenant record as exchanged with the remote tenant API
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tenant {
    pub tenant_id: String,
    #[serde(default)]
    pub tenant_name: String,
    #[serde(default)]
    pub tenant_email: String,
    #[serde(default)]
    pub tenant_tier: String,
    #[serde(default)]
    pub is_active: bool,
    #[serde(default)]
    pub tenant_balance: f64,
    /// Fields the console does not display (address, phone, ...), kept so
    /// balance updates send back the full record
    #[serde(flatten, default)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Request to register a new tenant with the directory service
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct TenantRegistrationRequest {
    #[validate(length(min = 1, max = 255))]
    pub tenant_name: String,

    #[validate(email)]
    pub tenant_email: String,

    #[validate(length(min = 1, max = 50))]
    pub tenant_tier: String,

    #[serde(default)]
    pub tenant_phone: Option<String>,

    #[serde(default)]
    pub tenant_address: Option<String>,
}

/// The per-row "add credits" affordance
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RowAction {
    pub method: &'static str,
    pub href: String,
}

impl RowAction {
    pub fn add_credits(tenant_id: &str) -> Self {
        Self {
            method: "POST",
            href: format!("/api/v1/tenants/{}/credits", encode_path_segment(tenant_id)),
        }
    }
}

/// Percent-encodes `segment` so it stays a single URL path segment
fn encode_path_segment(segment: &str) -> String {
    let Ok(mut url) = reqwest::Url::parse("http://segment.invalid/") else {
        return segment.to_string();
    };
    if let Ok(mut path) = url.path_segments_mut() {
        path.clear().push(segment);
    }
    url.path().trim_start_matches('/').to_string()
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TenantRow {
    #[serde(flatten)]
    pub tenant: Tenant,
    pub add_credits: RowAction,
}

impl From<&Tenant> for TenantRow {
    fn from(tenant: &Tenant) -> Self {
        let mut tenant = tenant.clone();
        // the row's own action owns this key
        tenant.extra.remove("addCredits");

        Self {
            add_credits: RowAction::add_credits(&tenant.tenant_id),
            tenant,
        }
    }
}

/// Rendered directory view
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TenantTable {
    pub is_loading: bool,
    pub columns: Vec<&'static str>,
    pub rows: Vec<TenantRow>,
    pub pending_tenant_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub load_error: Option<String>,
}
