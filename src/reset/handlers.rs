use axum::{extract::State, routing::post, Json, Router};
use time::OffsetDateTime;
use tracing::{info, instrument, warn};

use super::{
    dto::{ResetBody, ResetRequestBody, ResetRequestResponse},
    services,
};
use crate::{auth::dto::OkResponse, error::AppError, payload::Payload, state::AppState};

pub fn reset_routes() -> Router<AppState> {
    Router::new()
        .route("/reset-request", post(reset_request))
        .route("/reset", post(reset))
}

#[instrument(skip(state, payload))]
pub async fn reset_request(
    State(state): State<AppState>,
    Payload(payload): Payload<ResetRequestBody>,
) -> Result<Json<ResetRequestResponse>, AppError> {
    let username = payload
        .username
        .filter(|u| !u.trim().is_empty())
        .ok_or_else(|| AppError::invalid_input("missing username"))?;

    let issued = services::issue_reset_token(&state.db, &username, OffsetDateTime::now_utc()).await?;
    if services::deliver(state.mailer.as_deref(), &issued).await {
        info!(%username, "reset token emailed");
        return Ok(Json(ResetRequestResponse::Dispatched { ok: true, sent: true }));
    }

    if state.config.reset_token_fallback {
        warn!(%username, "reset token returned in response body");
        Ok(Json(ResetRequestResponse::Token {
            expiry: issued.expiry_rfc3339(),
            token: issued.token,
        }))
    } else {
        Ok(Json(ResetRequestResponse::Dispatched { ok: true, sent: false }))
    }
}

#[instrument(skip_all)]
pub async fn reset(
    State(state): State<AppState>,
    Payload(payload): Payload<ResetBody>,
) -> Result<Json<OkResponse>, AppError> {
    let (Some(token), Some(new_password)) = (
        payload.token.filter(|t| !t.is_empty()),
        payload.new_password.filter(|p| !p.is_empty()),
    ) else {
        return Err(AppError::invalid_input("missing fields"));
    };
    services::redeem_reset_token(&state.db, &token, &new_password, OffsetDateTime::now_utc()).await?;
    Ok(Json(OkResponse::ok()))
}
