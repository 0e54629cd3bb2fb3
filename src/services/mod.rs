// Service modules
pub mod checkout_orchestrator;
pub mod checkout_widget;
pub mod directory_view;
pub mod payment_gateway;
pub mod tenant_directory;
pub mod transaction_intake;

pub use checkout_orchestrator::CheckoutOrchestrator;
pub use checkout_widget::{CheckoutWidget, HostedCheckoutWidget, WidgetEvents, WidgetHandle};
pub use directory_view::TenantDirectoryView;
pub use payment_gateway::{HttpPaymentGateway, PaymentGateway, RetryPolicy};
pub use tenant_directory::{HttpTenantDirectory, TenantDirectory};
pub use transaction_intake::TransactionIntake;
