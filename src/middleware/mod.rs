// Middleware modules
pub mod logging;
pub mod session;

// Export operator session middleware
pub use session::operator_session_middleware;

// Export logging middleware
pub use logging::logging_middleware;
