use std::{collections::HashMap, sync::Arc, time::Duration};

use tokio::sync::{mpsc, RwLock};
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

use crate::{
    config::{PaymentConfig, TopUpConfig},
    error::{ApiError, Result},
    models::{
        checkout::{
            CheckoutEvent, CheckoutEventKind, CheckoutSessionRequest, CheckoutState,
            MerchantTransactionId, TopUpAttempt, WidgetConfig, WidgetOptions,
        },
        session::OperatorSession,
        tenant::Tenant,
    },
    services::{
        checkout_widget::{CheckoutWidget, WidgetEvents, WidgetSignal},
        directory_view::TenantDirectoryView,
        payment_gateway::PaymentGateway,
        tenant_directory::TenantDirectory,
    },
};

/// Everything one top-up attempt needs, owned by that attempt alone
struct AttemptContext {
    attempt: TopUpAttempt,
    session: OperatorSession,
}

/// Drives a top-up from access token to the widget's terminal event.
///
/// Each call to [`CheckoutOrchestrator::start`] runs its own chain
/// (token, session, widget, callback) over a private [`AttemptContext`];
/// concurrent attempts for the same or different tenants share nothing but
/// the in-memory directory view. Attempt snapshots are mirrored into a
/// registry for status queries.
#[derive(Clone)]
pub struct CheckoutOrchestrator {
    gateway: Arc<dyn PaymentGateway>,
    widget: Arc<dyn CheckoutWidget>,
    tenants: Arc<dyn TenantDirectory>,
    view: Arc<TenantDirectoryView>,
    payment: Arc<PaymentConfig>,
    topup: TopUpConfig,
    attempts: Arc<RwLock<HashMap<Uuid, TopUpAttempt>>>,
}

impl CheckoutOrchestrator {
    pub fn new(
        gateway: Arc<dyn PaymentGateway>,
        widget: Arc<dyn CheckoutWidget>,
        tenants: Arc<dyn TenantDirectory>,
        view: Arc<TenantDirectoryView>,
        payment: PaymentConfig,
        topup: TopUpConfig,
    ) -> Self {
        Self {
            gateway,
            widget,
            tenants,
            view,
            payment: Arc::new(payment),
            topup,
            attempts: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub async fn attempt(&self, attempt_id: Uuid) -> Option<TopUpAttempt> {
        self.attempts.read().await.get(&attempt_id).cloned()
    }

    /// All attempts seen since startup, oldest first
    pub async fn attempts(&self) -> Vec<TopUpAttempt> {
        let mut attempts: Vec<_> = self.attempts.read().await.values().cloned().collect();
        attempts.sort_by_key(|a| a.created_at);
        attempts
    }

    /// Run token, session and widget steps for a tenant snapshot.
    ///
    /// Returns once the widget is rendered; the terminal event is handled by a
    /// background task bound to this attempt. A failure at any step halts the
    /// chain, marks the attempt failed and is returned to the caller.
    #[instrument(skip(self, tenant, session), fields(tenant_id = %tenant.tenant_id))]
    pub async fn start(&self, tenant: Tenant, session: OperatorSession) -> Result<TopUpAttempt> {
        let merchant_transaction_id =
            MerchantTransactionId::generate(self.payment.merchant_id_scheme);
        let mut ctx = AttemptContext {
            attempt: TopUpAttempt::new(tenant, merchant_transaction_id),
            session,
        };
        self.record(&ctx).await;

        info!(
            attempt_id = %ctx.attempt.attempt_id,
            merchant_transaction_id = %ctx.attempt.merchant_transaction_id,
            "Starting checkout"
        );

        // Idle -> TokenRequested
        self.advance(&mut ctx, CheckoutState::TokenRequested).await;
        let access_token = match self.gateway.request_access_token().await {
            Ok(token) => token,
            Err(e) => return Err(self.fail(&mut ctx, e).await),
        };

        // TokenRequested -> SessionRequested
        self.advance(&mut ctx, CheckoutState::SessionRequested).await;
        let request = self.session_request(access_token, &ctx.attempt.merchant_transaction_id);
        let checkout_id = match self.gateway.create_checkout_session(&request).await {
            Ok(id) => id,
            Err(e) => return Err(self.fail(&mut ctx, e).await),
        };
        ctx.attempt.checkout_id = Some(checkout_id.clone());

        // SessionRequested -> WidgetActive
        let (sender, receiver) = mpsc::channel(1);
        let events = WidgetEvents::new(ctx.attempt.attempt_id, sender);
        let config = WidgetConfig {
            key: self.payment.public_key.clone(),
            checkout_id,
            options: WidgetOptions {
                theme: self.payment.widget.theme.clone(),
            },
        };

        let mount = match self
            .widget
            .initiate(config, events)
            .and_then(|mut handle| handle.render(&self.payment.widget.target))
        {
            Ok(mount) => mount,
            Err(e) => return Err(self.fail(&mut ctx, e).await),
        };
        ctx.attempt.widget = Some(mount);
        self.advance(&mut ctx, CheckoutState::WidgetActive).await;

        let attempt = ctx.attempt.clone();
        let orchestrator = self.clone();
        tokio::spawn(async move {
            orchestrator.await_widget_event(ctx, receiver).await;
        });

        Ok(attempt)
    }

    fn session_request(
        &self,
        access_token: String,
        merchant_transaction_id: &MerchantTransactionId,
    ) -> CheckoutSessionRequest {
        CheckoutSessionRequest {
            access_token,
            amount: self.payment.amount,
            merchant_transaction_id: merchant_transaction_id.clone(),
            currency: self.payment.currency.clone(),
            force_default_method: self.payment.force_default_method,
            entity_id: self.payment.entity_id.clone(),
            nonce: self.payment.nonce.clone(),
            shopper_result_url: self.payment.shopper_result_url.clone(),
            default_payment_method: self.payment.default_payment_method.clone(),
        }
    }

    /// Waits for the first widget event, or treats the widget as expired once
    /// the session TTL elapses
    async fn await_widget_event(
        self,
        mut ctx: AttemptContext,
        mut receiver: mpsc::Receiver<WidgetSignal>,
    ) {
        let ttl = Duration::from_secs(self.payment.widget.session_ttl_secs);
        let outcome = tokio::time::timeout(ttl, receiver.recv()).await;

        // No further events are accepted for this attempt
        self.widget.unregister(ctx.attempt.attempt_id);

        match outcome {
            Ok(Some(signal)) => {
                let outcome = self.settle(&mut ctx, signal.event).await;
                if signal.reply.send(outcome).is_err() {
                    debug!(
                        attempt_id = %ctx.attempt.attempt_id,
                        "Widget event sender went away before settlement"
                    );
                }
            }
            Ok(None) => {
                warn!(
                    attempt_id = %ctx.attempt.attempt_id,
                    "Checkout widget dropped its callbacks without an event"
                );
                let event = CheckoutEvent::new(
                    CheckoutEventKind::Expired,
                    serde_json::json!({ "reason": "widget_dropped" }),
                );
                let _ = self.settle(&mut ctx, event).await;
            }
            Err(_) => {
                let event = CheckoutEvent::new(
                    CheckoutEventKind::Expired,
                    serde_json::json!({ "reason": "session_ttl_elapsed" }),
                );
                let _ = self.settle(&mut ctx, event).await;
            }
        }
    }

    /// Apply a terminal widget event to the attempt
    async fn settle(&self, ctx: &mut AttemptContext, event: CheckoutEvent) -> Result<TopUpAttempt> {
        let attempt_id = ctx.attempt.attempt_id;

        match event.kind {
            CheckoutEventKind::Completed => {
                info!(attempt_id = %attempt_id, payload = %event.payload, "Checkout completed");
                self.advance(ctx, CheckoutState::Completed).await;

                if let Err(e) = self.tenants.update(&ctx.session, &ctx.attempt.tenant).await {
                    error!(
                        attempt_id = %attempt_id,
                        tenant_id = %ctx.attempt.tenant.tenant_id,
                        "Balance update after completed checkout failed: {}",
                        e
                    );
                    ctx.attempt.last_error = Some(e.to_string());
                    ctx.attempt.reconciliation_gap = true;
                    self.record(ctx).await;
                    return Err(e);
                }

                ctx.attempt.tenant.tenant_balance += self.topup.settlement_increment;
                match self
                    .view
                    .apply_credit(&ctx.attempt.tenant.tenant_id, self.topup.settlement_increment)
                    .await
                {
                    Some(tenant) => info!(
                        attempt_id = %attempt_id,
                        "Tenant {} balance now {}",
                        tenant.tenant_id,
                        tenant.tenant_balance
                    ),
                    None => warn!(
                        attempt_id = %attempt_id,
                        "Tenant {} left the directory view before settlement",
                        ctx.attempt.tenant.tenant_id
                    ),
                }
            }
            CheckoutEventKind::Cancelled | CheckoutEventKind::Expired => {
                let state = CheckoutState::from(event.kind);
                info!(attempt_id = %attempt_id, payload = %event.payload, "Checkout {:?}", state);
                warn!(
                    attempt_id = %attempt_id,
                    tenant_id = %ctx.attempt.tenant.tenant_id,
                    "Optimistic increment of {} left in place after {:?} checkout",
                    self.topup.optimistic_increment,
                    state
                );
                ctx.attempt.reconciliation_gap = true;
                self.advance(ctx, state).await;
            }
        }

        self.record(ctx).await;
        Ok(ctx.attempt.clone())
    }

    async fn advance(&self, ctx: &mut AttemptContext, state: CheckoutState) {
        debug!(
            attempt_id = %ctx.attempt.attempt_id,
            "Checkout {:?} -> {:?}",
            ctx.attempt.state,
            state
        );
        ctx.attempt.transition(state);
        self.record(ctx).await;
    }

    async fn fail(&self, ctx: &mut AttemptContext, err: ApiError) -> ApiError {
        error!(
            attempt_id = %ctx.attempt.attempt_id,
            "Checkout halted in {:?}: {}",
            ctx.attempt.state,
            err
        );
        ctx.attempt.last_error = Some(err.to_string());
        ctx.attempt.reconciliation_gap = true;
        ctx.attempt.transition(CheckoutState::Failed);
        self.record(ctx).await;
        err
    }

    async fn record(&self, ctx: &AttemptContext) {
        let mut attempts = self.attempts.write().await;
        attempts.insert(ctx.attempt.attempt_id, ctx.attempt.clone());

        if ctx.attempt.state.is_terminal() {
            evict_settled(&mut attempts, self.payment.retained_attempts);
        }
    }
}

/// Keeps at most `keep` terminal attempts, dropping the least recently updated
fn evict_settled(attempts: &mut HashMap<Uuid, TopUpAttempt>, keep: usize) {
    let mut settled: Vec<_> = attempts
        .values()
        .filter(|a| a.state.is_terminal())
        .map(|a| (a.updated_at, a.attempt_id))
        .collect();

    if settled.len() <= keep {
        return;
    }

    settled.sort_unstable();
    let excess = settled.len() - keep;
    for (_, attempt_id) in settled.into_iter().take(excess) {
        attempts.remove(&attempt_id);
    }
    debug!("Evicted {} settled checkout attempts", excess);
}
