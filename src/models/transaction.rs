use serde::{Deserialize, Serialize};
use time::macros::format_description;
use validator::{Validate, ValidationError};

/// Categories offered by the transaction intake form
pub const TRANSACTION_CATEGORIES: [&str; 5] =
    ["Groceries", "Bills", "Entertainment", "Travel", "Other"];

/// Ad-hoc ledger entry captured by the intake form
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct TransactionDraft {
    #[validate(length(min = 1, max = 255))]
    pub id: String,

    /// ISO 8601 calendar date (`YYYY-MM-DD`)
    #[validate(custom(function = "validate_iso_date"))]
    pub date: String,

    #[validate(length(min = 1, max = 1000))]
    pub description: String,

    #[validate(range(min = 0.0))]
    pub amount: f64,
}

fn validate_iso_date(value: &str) -> Result<(), ValidationError> {
    time::Date::parse(value, format_description!("[year]-[month]-[day]"))
        .map(|_| ())
        .map_err(|_| ValidationError::new("iso_date"))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionAccepted {
    pub transaction: TransactionDraft,
    /// Drafts are validated and logged only; nothing downstream consumes them yet
    pub persisted: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionCategories {
    pub categories: Vec<&'static str>,
}
