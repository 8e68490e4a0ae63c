use base64ct::{Base64UrlUnpadded, Encoding};
use rand::{rngs::OsRng, RngCore};
use sqlx::SqlitePool;
use time::{format_description::well_known::Rfc3339, Duration, OffsetDateTime};
use tracing::{debug, info, warn};

use super::mailer::Mailer;
use crate::auth::{password::hash_password, repo_types::User};
use crate::error::AppError;

pub const RESET_TOKEN_TTL: Duration = Duration::hours(1);
const TOKEN_BYTES: usize = 32;

/// URL-safe random token.
pub fn generate_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    OsRng.fill_bytes(&mut bytes);
    Base64UrlUnpadded::encode_string(&bytes)
}

#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub username: String,
    pub email: Option<String>,
    pub token: String,
    pub expires_at: OffsetDateTime,
}

impl IssuedToken {
    pub fn expiry_rfc3339(&self) -> String {
        self.expires_at.format(&Rfc3339).unwrap_or_default()
    }
}

/// Put the user into pending-reset, overwriting any earlier token.
pub async fn issue_reset_token(
    db: &SqlitePool,
    username: &str,
    now: OffsetDateTime,
) -> Result<IssuedToken, AppError> {
    let user = User::find_by_username(db, username)
        .await?
        .ok_or_else(|| AppError::NotFound("unknown user".into()))?;

    let token = generate_token();
    let expires_at = now + RESET_TOKEN_TTL;
    let expires_at = expires_at.replace_nanosecond(0).unwrap_or(expires_at);
    if !User::set_reset_token(db, &user.username, &token, expires_at.unix_timestamp()).await? {
        return Err(AppError::NotFound("unknown user".into()));
    }

    info!(user_id = user.id, replaced = user.has_pending_reset(), "reset token issued");
    Ok(IssuedToken {
        username: user.username,
        email: user.email,
        token,
        expires_at,
    })
}

/// Account holding `token`, provided the token is still live at `now`.
async fn live_token_holder(
    db: &SqlitePool,
    token: &str,
    now: OffsetDateTime,
) -> Result<User, AppError> {
    let user = User::find_by_reset_token(db, token)
        .await?
        .ok_or(AppError::InvalidToken)?;
    match user.reset_expiry {
        Some(expiry) if now.unix_timestamp() < expiry => Ok(user),
        _ => {
            warn!(user_id = user.id, "expired reset token presented");
            Err(AppError::ExpiredToken)
        }
    }
}

/// Set a new password with a live token and clear the token.
///
/// The token is checked before hashing; the conditional update still guards
/// against a concurrent redemption or re-issue.
pub async fn redeem_reset_token(
    db: &SqlitePool,
    token: &str,
    new_password: &str,
    now: OffsetDateTime,
) -> Result<(), AppError> {
    live_token_holder(db, token, now).await?;
    let hash = hash_password(new_password)?;
    if let Some(user_id) = User::redeem_reset_token(db, token, &hash, now.unix_timestamp()).await? {
        info!(user_id, "password reset");
        return Ok(());
    }
    live_token_holder(db, token, now).await?;
    Err(AppError::InvalidToken)
}

/// Email the token when a mailer and a recipient exist. Failures are logged, not returned.
pub async fn deliver(mailer: Option<&dyn Mailer>, issued: &IssuedToken) -> bool {
    let (Some(mailer), Some(to)) = (mailer, issued.email.as_deref()) else {
        debug!(username = %issued.username, "reset token not emailed: no mailer or address");
        return false;
    };
    let body = format!(
        "A password reset was requested for {}.\n\nReset token: {}\nValid until: {}\n",
        issued.username,
        issued.token,
        issued.expiry_rfc3339()
    );
    match mailer.send(to, "Password reset token", &body).await {
        Ok(()) => true,
        Err(e) => {
            warn!(error = %e, username = %issued.username, "reset email failed");
            false
        }
    }
}

#[cfg(test)]
pub(crate) mod fakes {
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::Mailer;

    /// Records every message instead of sending it.
    #[derive(Default)]
    pub struct RecordingMailer {
        pub sent: Mutex<Vec<(String, String)>>,
    }

    #[async_trait]
    impl Mailer for RecordingMailer {
        async fn send(&self, to: &str, _subject: &str, body: &str) -> anyhow::Result<()> {
            self.sent.lock().unwrap().push((to.to_string(), body.to_string()));
            Ok(())
        }
    }

    pub struct FailingMailer;

    #[async_trait]
    impl Mailer for FailingMailer {
        async fn send(&self, _to: &str, _subject: &str, _body: &str) -> anyhow::Result<()> {
            anyhow::bail!("connection refused")
        }
    }
}
