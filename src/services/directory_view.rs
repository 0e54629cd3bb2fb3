use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{info, instrument, warn};

use crate::{
    config::TopUpConfig,
    error::{ApiError, Result},
    models::{
        checkout::TopUpAttempt,
        session::OperatorSession,
        tenant::{Tenant, TenantRegistrationRequest, TenantRow, TenantTable, TENANT_COLUMNS},
    },
    services::{checkout_orchestrator::CheckoutOrchestrator, tenant_directory::TenantDirectory},
};

#[derive(Debug)]
struct DirectoryState {
    tenants: Vec<Tenant>,
    is_loading: bool,
    loaded: bool,
    pending_tenant_id: Option<String>,
    load_error: Option<String>,
}

impl Default for DirectoryState {
    fn default() -> Self {
        Self {
            tenants: Vec::new(),
            is_loading: true,
            loaded: false,
            pending_tenant_id: None,
            load_error: None,
        }
    }
}

/// In-memory tenant directory backing the console's tenant table.
///
/// Balances here are the console's view only. They drift from the tenant API
/// through the optimistic top-up increment and are replaced wholesale on the
/// next successful load.
pub struct TenantDirectoryView {
    directory: Arc<dyn TenantDirectory>,
    topup: TopUpConfig,
    state: RwLock<DirectoryState>,
}

impl TenantDirectoryView {
    pub fn new(directory: Arc<dyn TenantDirectory>, topup: TopUpConfig) -> Self {
        Self {
            directory,
            topup,
            state: RwLock::new(DirectoryState::default()),
        }
    }

    /// Fetch the tenant list, replacing the in-memory rows.
    ///
    /// The loading flag is cleared whether the fetch succeeds or fails.
    #[instrument(skip(self, session))]
    pub async fn load(&self, session: &OperatorSession) -> Result<usize> {
        let result = self.directory.fetch(session).await;

        let mut state = self.state.write().await;
        state.is_loading = false;

        match result {
            Ok(tenants) => {
                let count = tenants.len();
                state.tenants = tenants;
                state.loaded = true;
                state.load_error = None;
                info!("Loaded {} tenants into directory view", count);
                Ok(count)
            }
            Err(e) => {
                warn!("Tenant directory load failed: {}", e);
                state.load_error = Some(e.to_string());
                Err(e)
            }
        }
    }

    /// Loads on first use; a failed load is retried on the next call
    pub async fn ensure_loaded(&self, session: &OperatorSession) -> Result<()> {
        if self.state.read().await.loaded {
            return Ok(());
        }
        self.load(session).await.map(|_| ())
    }

    pub async fn render(&self) -> TenantTable {
        let state = self.state.read().await;

        TenantTable {
            is_loading: state.is_loading,
            columns: TENANT_COLUMNS.to_vec(),
            rows: state.tenants.iter().map(TenantRow::from).collect(),
            pending_tenant_id: state.pending_tenant_id.clone(),
            load_error: state.load_error.clone(),
        }
    }

    pub async fn tenant(&self, tenant_id: &str) -> Option<Tenant> {
        self.state
            .read()
            .await
            .tenants
            .iter()
            .find(|t| t.tenant_id == tenant_id)
            .cloned()
    }

    /// Tenant most recently picked for a top-up (last click wins)
    pub async fn pending_tenant_id(&self) -> Option<String> {
        self.state.read().await.pending_tenant_id.clone()
    }

    /// Start a credit top-up for a tenant row.
    ///
    /// Marks the tenant as pending, applies the optimistic increment to the
    /// in-memory balance and hands a snapshot of the row to the orchestrator.
    /// Every call starts an independent attempt.
    #[instrument(skip(self, session, orchestrator))]
    pub async fn add_credits(
        &self,
        tenant_id: &str,
        session: &OperatorSession,
        orchestrator: &CheckoutOrchestrator,
    ) -> Result<TopUpAttempt> {
        let snapshot = {
            let mut state = self.state.write().await;
            let tenant = state
                .tenants
                .iter_mut()
                .find(|t| t.tenant_id == tenant_id)
                .ok_or_else(|| ApiError::NotFound(format!("Tenant {} not found", tenant_id)))?;

            tenant.tenant_balance += self.topup.optimistic_increment;
            let snapshot = tenant.clone();
            state.pending_tenant_id = Some(tenant_id.to_string());
            snapshot
        };

        info!(
            "Add credits for tenant {}: optimistic balance {}",
            tenant_id, snapshot.tenant_balance
        );

        orchestrator.start(snapshot, session.clone()).await
    }

    /// Adds to a tenant's in-memory balance, returning the updated row
    pub async fn apply_credit(&self, tenant_id: &str, amount: f64) -> Option<Tenant> {
        let mut state = self.state.write().await;
        let tenant = state.tenants.iter_mut().find(|t| t.tenant_id == tenant_id)?;
        tenant.tenant_balance += amount;
        Some(tenant.clone())
    }

    pub async fn register(
        &self,
        session: &OperatorSession,
        request: &TenantRegistrationRequest,
    ) -> Result<serde_json::Value> {
        self.directory.register(session, request).await
    }
}
