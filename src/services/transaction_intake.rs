use std::sync::atomic::{AtomicU64, Ordering};

use tracing::{info, instrument};
use validator::Validate;

use crate::{
    error::{ApiError, Result},
    models::transaction::TransactionDraft,
};

/// Intake for ad-hoc ledger entries.
///
/// Valid drafts are logged and counted; there is no downstream consumer yet.
#[derive(Debug, Default)]
pub struct TransactionIntake {
    accepted: AtomicU64,
}

impl TransactionIntake {
    pub fn new() -> Self {
        Self::default()
    }

    #[instrument(skip(self, draft), fields(transaction_id = %draft.id))]
    pub fn submit(&self, draft: TransactionDraft) -> Result<TransactionDraft> {
        draft
            .validate()
            .map_err(|e| ApiError::BadRequest(format!("Validation error: {}", e)))?;

        self.accepted.fetch_add(1, Ordering::Relaxed);
        info!(
            date = %draft.date,
            amount = draft.amount,
            description = %draft.description,
            "New transaction"
        );

        Ok(draft)
    }

    pub fn accepted_count(&self) -> u64 {
        self.accepted.load(Ordering::Relaxed)
    }
}
