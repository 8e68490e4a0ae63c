use serde::{Deserialize, Serialize};

#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub date: Option<String>,
    pub page: Option<String>,
    pub per_page: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct BalanceQuery {
    pub date: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CreateEntryRequest {
    pub date: Option<String>,
    pub description: Option<String>,
    pub amount: Option<serde_json::Value>,
}

#[derive(Debug, Serialize)]
pub struct BalanceResponse {
    pub date: String,
    pub total: f64,
}
