use lazy_static::lazy_static;
use regex::Regex;
use sqlx::SqlitePool;
use tracing::{info, warn};

use super::{
    password::{hash_password, verify_or_dummy},
    repo_types::{NewUser, Role, User},
};
use crate::error::AppError;

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

/// Registration input after the request body has been read.
#[derive(Debug, Clone, Default)]
pub struct Registration {
    pub username: String,
    pub password: String,
    pub email: Option<String>,
    pub requested_role: Option<String>,
}

/// Load the account for `username` and check it holds exactly `role`.
pub async fn require_role(db: &SqlitePool, username: &str, role: Role) -> Result<User, AppError> {
    let user = User::find_by_username(db, username)
        .await?
        .ok_or(AppError::Unauthenticated)?;
    if user.role != role {
        warn!(username, required = %role, actual = %user.role, "role check failed");
        return Err(AppError::Forbidden);
    }
    Ok(user)
}

/// Role a new account receives. Anything above `user` needs a requester that is
/// an admin right now, otherwise the request is quietly downgraded.
pub async fn effective_role(
    db: &SqlitePool,
    requester: Option<&str>,
    requested: Option<&str>,
) -> Result<Role, AppError> {
    let Some(requested) = requested.map(str::trim).filter(|r| !r.is_empty()) else {
        return Ok(Role::default());
    };
    let Some(requester) = requester else {
        return Ok(Role::default());
    };
    let is_admin = User::find_by_username(db, requester)
        .await?
        .is_some_and(|u| u.role == Role::Admin);
    if !is_admin {
        return Ok(Role::default());
    }
    Role::try_from(requested.to_owned()).map_err(AppError::InvalidInput)
}

pub async fn register(
    db: &SqlitePool,
    requester: Option<&str>,
    reg: Registration,
) -> Result<User, AppError> {
    let username = reg.username.trim();
    if username.is_empty() || reg.password.is_empty() {
        return Err(AppError::invalid_input("missing fields"));
    }
    let email = reg
        .email
        .as_deref()
        .map(str::trim)
        .filter(|e| !e.is_empty());
    if let Some(email) = email {
        if !is_valid_email(email) {
            return Err(AppError::invalid_input("invalid email"));
        }
    }

    let role = effective_role(db, requester, reg.requested_role.as_deref()).await?;
    let hash = hash_password(&reg.password)?;
    let user = User::create(
        db,
        NewUser {
            username,
            password_hash: &hash,
            email,
            role,
        },
    )
    .await?;
    info!(user_id = user.id, username = %user.username, role = %user.role, "user registered");
    Ok(user)
}

/// The account when `password` matches; `None` for both unknown user and wrong password.
pub async fn verify_credentials(
    db: &SqlitePool,
    username: &str,
    password: &str,
) -> Result<Option<User>, AppError> {
    let user = User::find_by_username(db, username).await?;
    let ok = verify_or_dummy(password, user.as_ref().map(|u| u.password_hash.as_str()))?;
    Ok(user.filter(|_| ok))
}
