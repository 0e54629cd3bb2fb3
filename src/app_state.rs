use crate::{
    config::Config,
    services::{
        CheckoutOrchestrator, HostedCheckoutWidget, HttpPaymentGateway, HttpTenantDirectory,
        PaymentGateway, TenantDirectory, TenantDirectoryView, TransactionIntake,
    },
};
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub directory_view: Arc<TenantDirectoryView>,
    pub orchestrator: CheckoutOrchestrator,
    pub checkout_widget: Arc<HostedCheckoutWidget>,
    pub transaction_intake: Arc<TransactionIntake>,
}

impl AppState {
    pub fn new(config: Config) -> Result<Self, anyhow::Error> {
        let tenants: Arc<dyn TenantDirectory> =
            Arc::new(HttpTenantDirectory::new(&config.tenant_api)?);
        let gateway: Arc<dyn PaymentGateway> = Arc::new(HttpPaymentGateway::new(&config.payment)?);

        Ok(Self::with_services(config, tenants, gateway))
    }

    /// Build state around explicit tenant and payment backends
    pub fn with_services(
        config: Config,
        tenants: Arc<dyn TenantDirectory>,
        gateway: Arc<dyn PaymentGateway>,
    ) -> Self {
        let Config { payment, topup, .. } = config;

        let directory_view = Arc::new(TenantDirectoryView::new(tenants.clone(), topup.clone()));
        let checkout_widget = Arc::new(HostedCheckoutWidget::new());
        let orchestrator = CheckoutOrchestrator::new(
            gateway,
            checkout_widget.clone(),
            tenants,
            directory_view.clone(),
            payment,
            topup,
        );

        Self {
            directory_view,
            orchestrator,
            checkout_widget,
            transaction_intake: Arc::new(TransactionIntake::new()),
        }
    }
}
