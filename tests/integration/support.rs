use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicBool, AtomicUsize, Ordering},
        Arc, Mutex,
    },
    time::Duration,
};

use async_trait::async_trait;
use billing_console::{
    config::{
        Config, PaymentConfig, ServerConfig, TenantApiConfig, TopUpConfig, WidgetSettings,
    },
    error::{ApiError, Result},
    models::{
        checkout::{
            CheckoutSessionRequest, CheckoutState, CheckoutTheme, MerchantIdScheme, TopUpAttempt,
            WidgetConfig, WidgetMount,
        },
        session::OperatorSession,
        tenant::{Tenant, TenantRegistrationRequest},
    },
    services::{
        CheckoutOrchestrator, CheckoutWidget, PaymentGateway, TenantDirectory,
        TenantDirectoryView, WidgetEvents, WidgetHandle,
    },
};
use uuid::Uuid;

pub fn tenant(id: &str, balance: f64) -> Tenant {
    Tenant {
        tenant_id: id.to_string(),
        tenant_name: format!("Tenant {}", id),
        tenant_email: format!("{}@tenants.test", id),
        tenant_tier: "Basic".to_string(),
        is_active: true,
        tenant_balance: balance,
        extra: Default::default(),
    }
}

pub fn session() -> OperatorSession {
    OperatorSession::new("operator-token")
}

pub fn payment_config() -> PaymentConfig {
    PaymentConfig {
        auth_token_url: "http://gateway.test/api/auth-token".to_string(),
        checkout_url: "http://gateway.test/api/create-checkout-id".to_string(),
        entity_id: "entity-123".to_string(),
        public_key: "public-key-123".to_string(),
        currency: "ZAR".to_string(),
        amount: 1,
        nonce: "UNQ00012345678".to_string(),
        shopper_result_url: "https://console.test/result".to_string(),
        force_default_method: true,
        default_payment_method: "CARD".to_string(),
        merchant_id_scheme: MerchantIdScheme::Uuid,
        request_timeout_ms: 2_000,
        retry_attempts: 2,
        retry_backoff_ms: 1,
        retained_attempts: 256,
        widget: WidgetSettings {
            target: "#payment-form".to_string(),
            theme: CheckoutTheme::default(),
            session_ttl_secs: 60,
        },
    }
}

pub fn test_config() -> Config {
    Config {
        server: ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
        },
        tenant_api: TenantApiConfig {
            base_url: "http://tenants.test".to_string(),
            request_timeout_ms: 2_000,
        },
        payment: payment_config(),
        topup: TopUpConfig::default(),
    }
}

/// In-memory tenant API recording every call
#[derive(Default)]
pub struct FakeTenantDirectory {
    tenants: Mutex<Vec<Tenant>>,
    pub fail_fetch: AtomicBool,
    pub fail_update: AtomicBool,
    pub fetch_calls: AtomicUsize,
    updates: Mutex<Vec<Tenant>>,
    registrations: Mutex<Vec<TenantRegistrationRequest>>,
    tokens: Mutex<Vec<String>>,
}

impl FakeTenantDirectory {
    pub fn with_tenants(tenants: Vec<Tenant>) -> Self {
        Self {
            tenants: Mutex::new(tenants),
            ..Default::default()
        }
    }

    pub fn updates(&self) -> Vec<Tenant> {
        self.updates.lock().unwrap().clone()
    }

    pub fn registrations(&self) -> Vec<TenantRegistrationRequest> {
        self.registrations.lock().unwrap().clone()
    }

    pub fn tokens(&self) -> Vec<String> {
        self.tokens.lock().unwrap().clone()
    }

    fn remember(&self, session: &OperatorSession) {
        self.tokens
            .lock()
            .unwrap()
            .push(session.access_token().to_string());
    }
}

#[async_trait]
impl TenantDirectory for FakeTenantDirectory {
    async fn fetch(&self, session: &OperatorSession) -> Result<Vec<Tenant>> {
        self.remember(session);
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_fetch.load(Ordering::SeqCst) {
            return Err(ApiError::TenantApi("tenant list unavailable".to_string()));
        }
        Ok(self.tenants.lock().unwrap().clone())
    }

    async fn register(
        &self,
        session: &OperatorSession,
        request: &TenantRegistrationRequest,
    ) -> Result<serde_json::Value> {
        self.remember(session);
        self.registrations.lock().unwrap().push(request.clone());
        Ok(serde_json::json!({ "message": "Tenant Created" }))
    }

    async fn update(
        &self,
        session: &OperatorSession,
        tenant: &Tenant,
    ) -> Result<serde_json::Value> {
        self.remember(session);
        if self.fail_update.load(Ordering::SeqCst) {
            return Err(ApiError::TenantApi("tenant update rejected".to_string()));
        }
        self.updates.lock().unwrap().push(tenant.clone());
        Ok(serde_json::json!({ "message": "Tenant Updated" }))
    }
}

/// Payment gateway double with per-step failure switches
#[derive(Default)]
pub struct FakeGateway {
    pub fail_token: AtomicBool,
    pub fail_session: AtomicBool,
    pub token_calls: AtomicUsize,
    pub session_calls: AtomicUsize,
    session_requests: Mutex<Vec<CheckoutSessionRequest>>,
}

impl FakeGateway {
    pub fn session_requests(&self) -> Vec<CheckoutSessionRequest> {
        self.session_requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl PaymentGateway for FakeGateway {
    async fn request_access_token(&self) -> Result<String> {
        let n = self.token_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_token.load(Ordering::SeqCst) {
            return Err(ApiError::PaymentGateway("auth token endpoint down".to_string()));
        }
        Ok(format!("access-token-{}", n))
    }

    async fn create_checkout_session(&self, request: &CheckoutSessionRequest) -> Result<String> {
        let n = self.session_calls.fetch_add(1, Ordering::SeqCst);
        self.session_requests.lock().unwrap().push(request.clone());
        if self.fail_session.load(Ordering::SeqCst) {
            return Err(ApiError::PaymentGateway("checkout endpoint down".to_string()));
        }
        Ok(format!("checkout-{}", n))
    }
}

/// Widget double that keeps each attempt's callbacks so tests can fire them
#[derive(Default)]
pub struct RecordingWidget {
    initiated: Mutex<Vec<WidgetConfig>>,
    renders: Arc<Mutex<Vec<String>>>,
    events: Arc<Mutex<HashMap<Uuid, WidgetEvents>>>,
    unregistered: Mutex<Vec<Uuid>>,
}

impl RecordingWidget {
    pub fn unregistered(&self) -> Vec<Uuid> {
        self.unregistered.lock().unwrap().clone()
    }

    pub fn initiated(&self) -> Vec<WidgetConfig> {
        self.initiated.lock().unwrap().clone()
    }

    pub fn renders(&self) -> Vec<String> {
        self.renders.lock().unwrap().clone()
    }

    pub fn events_for(&self, attempt_id: Uuid) -> WidgetEvents {
        self.events
            .lock()
            .unwrap()
            .get(&attempt_id)
            .cloned()
            .expect("widget events for attempt")
    }
}

impl CheckoutWidget for RecordingWidget {
    fn initiate(
        &self,
        config: WidgetConfig,
        events: WidgetEvents,
    ) -> Result<Box<dyn WidgetHandle>> {
        self.initiated.lock().unwrap().push(config.clone());
        self.events
            .lock()
            .unwrap()
            .insert(events.attempt_id(), events);
        Ok(Box::new(RecordingHandle {
            config,
            renders: self.renders.clone(),
        }))
    }

    // callbacks stay reachable so tests can fire late events
    fn unregister(&self, attempt_id: Uuid) {
        self.unregistered.lock().unwrap().push(attempt_id);
    }
}

struct RecordingHandle {
    config: WidgetConfig,
    renders: Arc<Mutex<Vec<String>>>,
}

impl WidgetHandle for RecordingHandle {
    fn render(&mut self, target: &str) -> Result<WidgetMount> {
        self.renders.lock().unwrap().push(target.to_string());
        Ok(WidgetMount {
            config: self.config.clone(),
            target: target.to_string(),
        })
    }
}

/// Directory view and orchestrator wired to the doubles above
pub struct Harness {
    pub tenants: Arc<FakeTenantDirectory>,
    pub gateway: Arc<FakeGateway>,
    pub widget: Arc<RecordingWidget>,
    pub view: Arc<TenantDirectoryView>,
    pub orchestrator: CheckoutOrchestrator,
}

impl Harness {
    pub fn new(tenants: Vec<Tenant>) -> Self {
        Self::with_payment(tenants, payment_config())
    }

    pub fn with_payment(tenants: Vec<Tenant>, payment: PaymentConfig) -> Self {
        let tenants = Arc::new(FakeTenantDirectory::with_tenants(tenants));
        let gateway = Arc::new(FakeGateway::default());
        let widget = Arc::new(RecordingWidget::default());
        let view = Arc::new(TenantDirectoryView::new(
            tenants.clone(),
            TopUpConfig::default(),
        ));
        let orchestrator = CheckoutOrchestrator::new(
            gateway.clone(),
            widget.clone(),
            tenants.clone(),
            view.clone(),
            payment,
            TopUpConfig::default(),
        );

        Self {
            tenants,
            gateway,
            widget,
            view,
            orchestrator,
        }
    }

    pub async fn loaded(tenants: Vec<Tenant>) -> Self {
        let harness = Self::new(tenants);
        harness.view.load(&session()).await.expect("initial load");
        harness
    }

    pub async fn balance(&self, tenant_id: &str) -> f64 {
        self.view
            .tenant(tenant_id)
            .await
            .expect("tenant in view")
            .tenant_balance
    }
}

/// Polls the orchestrator until an attempt reaches `state`
pub async fn wait_for_state(
    orchestrator: &CheckoutOrchestrator,
    attempt_id: Uuid,
    state: CheckoutState,
) -> TopUpAttempt {
    for _ in 0..100 {
        if let Some(attempt) = orchestrator.attempt(attempt_id).await {
            if attempt.state == state {
                return attempt;
            }
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("attempt {} never reached {:?}", attempt_id, state);
}
