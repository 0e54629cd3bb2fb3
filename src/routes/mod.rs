// Route modules
pub mod checkouts;
pub mod tenants;
pub mod transactions;

use crate::{
    app_state::AppState,
    middleware::{logging_middleware, operator_session_middleware},
    models::common::MessageResponse,
};
use axum::{
    middleware,
    routing::{get, post},
    Json, Router,
};
use tower::ServiceBuilder;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

/// Create the main console router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .nest("/api/v1", api_v1_routes())
        .layer(middleware::from_fn(logging_middleware))
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                .layer(TraceLayer::new_for_http())
                .layer(PropagateRequestIdLayer::x_request_id()),
        )
        .with_state(state)
}

/// API v1 routes, all acting on behalf of a signed-in operator
fn api_v1_routes() -> Router<AppState> {
    Router::new()
        .route("/tenants", get(tenants::list_tenants))
        .route("/tenants/refresh", post(tenants::refresh_tenants))
        .route("/tenants/registration", post(tenants::register_tenant))
        .route("/tenants/{tenant_id}/credits", post(tenants::add_credits))
        .route("/checkouts", get(checkouts::list_checkouts))
        .route("/checkouts/{attempt_id}", get(checkouts::get_checkout))
        .route(
            "/checkouts/{attempt_id}/events",
            post(checkouts::post_checkout_event),
        )
        .route("/transactions", post(transactions::submit_transaction))
        .route(
            "/transactions/categories",
            get(transactions::list_categories),
        )
        .layer(middleware::from_fn(operator_session_middleware))
}

/// GET /health
async fn health() -> Json<MessageResponse> {
    Json(MessageResponse::new("ok"))
}
