use axum::{
    extract::{Path, State},
    Json,
};
use tracing::instrument;
use uuid::Uuid;

use crate::{
    app_state::AppState,
    error::{ApiError, AppJson, Result},
    models::{
        checkout::{CheckoutEvent, TopUpAttempt},
        common::SuccessResponse,
    },
};

/// GET /api/v1/checkouts
#[instrument(skip(state))]
pub async fn list_checkouts(
    State(state): State<AppState>,
) -> Json<SuccessResponse<Vec<TopUpAttempt>>> {
    Json(SuccessResponse::new(state.orchestrator.attempts().await))
}

/// GET /api/v1/checkouts/{attempt_id}
#[instrument(skip(state))]
pub async fn get_checkout(
    State(state): State<AppState>,
    Path(attempt_id): Path<Uuid>,
) -> Result<Json<SuccessResponse<TopUpAttempt>>> {
    let attempt = state
        .orchestrator
        .attempt(attempt_id)
        .await
        .ok_or_else(|| ApiError::NotFound(format!("Checkout attempt {} not found", attempt_id)))?;

    Ok(Json(SuccessResponse::new(attempt)))
}

/// POST /api/v1/checkouts/{attempt_id}/events
///
/// Called by the browser-side widget's completed/cancelled/expired callbacks.
///
/// Request body:
/// ```json
/// { "type": "completed", "payload": { ... } }
/// ```
#[instrument(skip(state, event))]
pub async fn post_checkout_event(
    State(state): State<AppState>,
    Path(attempt_id): Path<Uuid>,
    AppJson(event): AppJson<CheckoutEvent>,
) -> Result<Json<SuccessResponse<TopUpAttempt>>> {
    let attempt = state.checkout_widget.dispatch(attempt_id, event).await?;

    Ok(Json(SuccessResponse::new(attempt)))
}
