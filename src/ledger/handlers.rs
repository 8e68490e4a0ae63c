use axum::{
    extract::State,
    http::StatusCode,
    routing::get,
    Json, Router,
};
use tracing::{info, instrument};

use super::{
    dto::{BalanceQuery, BalanceResponse, CreateEntryRequest, ListQuery},
    repo_types::LedgerEntry,
    services::{self, Page, Pagination},
};
use crate::{
    auth::extractors::AuthUser,
    error::AppError,
    payload::{Params, Payload},
    state::AppState,
};

pub fn ledger_routes() -> Router<AppState> {
    Router::new()
        .route("/api/messages", get(list_entries).post(create_entry))
        .route("/api/balance", get(balance))
}

#[instrument(skip(state))]
pub async fn list_entries(
    State(state): State<AppState>,
    Params(q): Params<ListQuery>,
) -> Result<Json<Page>, AppError> {
    let date = services::parse_optional_date(q.date.as_deref())?;
    let pagination = Pagination::from_params(q.page.as_deref(), q.per_page.as_deref())?;
    let page = services::list(&state.db, date.as_deref(), pagination).await?;
    Ok(Json(page))
}

#[instrument(skip(state, payload), fields(username = %user.username))]
pub async fn create_entry(
    State(state): State<AppState>,
    user: AuthUser,
    Payload(payload): Payload<CreateEntryRequest>,
) -> Result<(StatusCode, Json<LedgerEntry>), AppError> {
    let date = services::parse_optional_date(payload.date.as_deref())?
        .unwrap_or_else(|| services::format_date(services::today()));
    let description = payload.description.unwrap_or_default();
    let amount = services::coerce_amount(payload.amount.as_ref());

    let entry = LedgerEntry::insert(&state.db, &date, &description, amount).await?;
    info!(entry_id = entry.id, date = %entry.date, amount = entry.amount, "entry recorded");
    Ok((StatusCode::CREATED, Json(entry)))
}

#[instrument(skip(state))]
pub async fn balance(
    State(state): State<AppState>,
    Params(q): Params<BalanceQuery>,
) -> Result<Json<BalanceResponse>, AppError> {
    let date = services::parse_optional_date(q.date.as_deref())?
        .unwrap_or_else(|| services::format_date(services::today()));
    let total = LedgerEntry::balance(&state.db, &date).await?;
    Ok(Json(BalanceResponse { date, total }))
}
