use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use tracing::{instrument, warn};
use validator::Validate;

use crate::{
    app_state::AppState,
    error::{ApiError, AppJson, Result},
    models::{
        checkout::TopUpAttempt,
        common::SuccessResponse,
        session::OperatorSession,
        tenant::{TenantRegistrationRequest, TenantTable},
    },
};

/// GET /api/v1/tenants
///
/// Loads the directory on first use. A failed load is reported in the table's
/// `loadError` rather than as an error status.
#[instrument(skip(state, session))]
pub async fn list_tenants(
    State(state): State<AppState>,
    session: OperatorSession,
) -> Result<Json<SuccessResponse<TenantTable>>> {
    if let Err(e) = state.directory_view.ensure_loaded(&session).await {
        warn!("Rendering tenant table without a successful load: {}", e);
    }

    Ok(Json(SuccessResponse::new(
        state.directory_view.render().await,
    )))
}

/// POST /api/v1/tenants/refresh
#[instrument(skip(state, session))]
pub async fn refresh_tenants(
    State(state): State<AppState>,
    session: OperatorSession,
) -> Result<Json<SuccessResponse<TenantTable>>> {
    state.directory_view.load(&session).await?;

    Ok(Json(SuccessResponse::new(
        state.directory_view.render().await,
    )))
}

/// POST /api/v1/tenants/registration
#[instrument(skip(state, session, request))]
pub async fn register_tenant(
    State(state): State<AppState>,
    session: OperatorSession,
    AppJson(request): AppJson<TenantRegistrationRequest>,
) -> Result<(StatusCode, Json<SuccessResponse<serde_json::Value>>)> {
    request
        .validate()
        .map_err(|e| ApiError::BadRequest(format!("Validation error: {}", e)))?;

    let response = state.directory_view.register(&session, &request).await?;

    Ok((StatusCode::CREATED, Json(SuccessResponse::new(response))))
}

/// POST /api/v1/tenants/{tenant_id}/credits
///
/// Starts a top-up and returns the attempt with its widget mount once the
/// checkout widget is rendered.
#[instrument(skip(state, session))]
pub async fn add_credits(
    State(state): State<AppState>,
    session: OperatorSession,
    Path(tenant_id): Path<String>,
) -> Result<(StatusCode, Json<SuccessResponse<TopUpAttempt>>)> {
    state.directory_view.ensure_loaded(&session).await?;

    let attempt = state
        .directory_view
        .add_credits(&tenant_id, &session, &state.orchestrator)
        .await?;

    Ok((StatusCode::CREATED, Json(SuccessResponse::new(attempt))))
}
