use serde::Serialize;
use sqlx::FromRow;

/// One dated monetary entry ("message").
#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct LedgerEntry {
    pub id: i64,
    pub date: String, // YYYY-MM-DD
    pub description: String,
    pub amount: f64,
}

/// Sum of amounts for a single date.
#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct DailyTotal {
    pub date: String,
    pub total: f64,
}
