use axum::{
    extract::{FromRef, State},
    http::{header::SET_COOKIE, StatusCode},
    response::{AppendHeaders, IntoResponse},
    routing::post,
    Json, Router,
};
use tracing::{info, instrument, warn};

use crate::{
    auth::{
        dto::{LoginRequest, LoginResponse, OkResponse, RegisterRequest},
        extractors::MaybeUser,
        services::{self, Registration},
        session::{cleared_cookie, SessionKeys},
    },
    error::AppError,
    payload::Payload,
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/login", post(login))
        .route("/logout", post(logout))
        .route("/register", post(register))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    Payload(payload): Payload<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    let (Some(username), Some(password)) = (
        payload.username.filter(|u| !u.is_empty()),
        payload.password.filter(|p| !p.is_empty()),
    ) else {
        return Err(AppError::invalid_input("missing credentials"));
    };

    let Some(user) = services::verify_credentials(&state.db, &username, &password).await? else {
        warn!(%username, "login failed");
        return Err(AppError::InvalidCredentials);
    };

    let keys = SessionKeys::from_ref(&state);
    let token = keys.sign(&user.username, user.role)?;

    info!(user_id = user.id, username = %user.username, "user logged in");
    Ok((
        AppendHeaders([(SET_COOKIE, keys.cookie(&token))]),
        Json(LoginResponse {
            ok: true,
            user: user.username,
            role: user.role,
        }),
    ))
}

#[instrument(skip_all)]
pub async fn logout(MaybeUser(user): MaybeUser) -> impl IntoResponse {
    if let Some(user) = user {
        info!(username = %user.username, "user logged out");
    }
    (
        AppendHeaders([(SET_COOKIE, cleared_cookie())]),
        Json(OkResponse::ok()),
    )
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    MaybeUser(requester): MaybeUser,
    Payload(payload): Payload<RegisterRequest>,
) -> Result<(StatusCode, Json<OkResponse>), AppError> {
    let (Some(username), Some(password)) = (payload.username, payload.password) else {
        return Err(AppError::invalid_input("missing fields"));
    };
    services::register(
        &state.db,
        requester.as_ref().map(|u| u.username.as_str()),
        Registration {
            username,
            password,
            email: payload.email,
            requested_role: payload.role,
        },
    )
    .await?;
    Ok((StatusCode::CREATED, Json(OkResponse::ok())))
}
