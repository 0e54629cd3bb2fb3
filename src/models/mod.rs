// Request/Response models
pub mod checkout;
pub mod common;
pub mod session;
pub mod tenant;
pub mod transaction;
