use axum::{extract::State, http::StatusCode, Json};
use tracing::instrument;

use crate::{
    app_state::AppState,
    error::{AppJson, Result},
    models::{
        common::SuccessResponse,
        transaction::{
            TransactionAccepted, TransactionCategories, TransactionDraft, TRANSACTION_CATEGORIES,
        },
    },
};

/// POST /api/v1/transactions
#[instrument(skip(state, draft))]
pub async fn submit_transaction(
    State(state): State<AppState>,
    AppJson(draft): AppJson<TransactionDraft>,
) -> Result<(StatusCode, Json<SuccessResponse<TransactionAccepted>>)> {
    let transaction = state.transaction_intake.submit(draft)?;

    Ok((
        StatusCode::ACCEPTED,
        Json(SuccessResponse::new(TransactionAccepted {
            transaction,
            persisted: false,
        })),
    ))
}

/// GET /api/v1/transactions/categories
pub async fn list_categories() -> Json<SuccessResponse<TransactionCategories>> {
    Json(SuccessResponse::new(TransactionCategories {
        categories: TRANSACTION_CATEGORIES.to_vec(),
    }))
}
