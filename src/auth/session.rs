use std::time::Duration;

use axum::{
    extract::FromRef,
    http::{
        header::{AUTHORIZATION, COOKIE},
        HeaderMap,
    },
};
use cookie::{Cookie, SameSite};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use time::{Duration as TimeDuration, OffsetDateTime};
use tracing::debug;

use crate::{
    auth::repo_types::Role,
    config::{SessionConfig, MAX_SESSION_TTL_MINUTES},
    state::AppState,
};

pub const SESSION_COOKIE: &str = "ledger_session";

/// Signed session payload carried by the client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClaims {
    pub sub: String, // username
    pub role: Role,  // role resolved at login
    pub iat: usize,
    pub exp: usize,
    pub iss: String,
    pub aud: String,
}

#[derive(Clone)]
pub struct SessionKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    issuer: String,
    audience: String,
    ttl: Duration,
}

impl FromRef<AppState> for SessionKeys {
    fn from_ref(state: &AppState) -> Self {
        SessionKeys::new(&state.config.session)
    }
}

impl SessionKeys {
    pub fn new(cfg: &SessionConfig) -> Self {
        Self {
            encoding: EncodingKey::from_secret(cfg.secret.as_bytes()),
            decoding: DecodingKey::from_secret(cfg.secret.as_bytes()),
            issuer: cfg.issuer.clone(),
            audience: cfg.audience.clone(),
            ttl: Duration::from_secs(cfg.ttl_minutes.clamp(1, MAX_SESSION_TTL_MINUTES) as u64 * 60),
        }
    }

    pub fn sign(&self, username: &str, role: Role) -> anyhow::Result<String> {
        let now = OffsetDateTime::now_utc();
        let exp = now + TimeDuration::seconds(self.ttl.as_secs() as i64);
        let claims = SessionClaims {
            sub: username.to_owned(),
            role,
            iat: now.unix_timestamp() as usize,
            exp: exp.unix_timestamp() as usize,
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
        };
        let token = encode(&Header::default(), &claims, &self.encoding)?;
        debug!(username, %role, "session signed");
        Ok(token)
    }

    pub fn verify(&self, token: &str) -> anyhow::Result<SessionClaims> {
        let mut validation = Validation::default();
        validation.set_audience(std::slice::from_ref(&self.audience));
        validation.set_issuer(std::slice::from_ref(&self.issuer));
        let data = decode::<SessionClaims>(token, &self.decoding, &validation)?;
        Ok(data.claims)
    }

    /// `Set-Cookie` value carrying a freshly signed session.
    pub fn cookie(&self, token: &str) -> String {
        Cookie::build((SESSION_COOKIE, token.to_owned()))
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax)
            .max_age(TimeDuration::seconds(self.ttl.as_secs() as i64))
            .build()
            .to_string()
    }
}

/// `Set-Cookie` value that makes the browser drop the session.
pub fn cleared_cookie() -> String {
    Cookie::build((SESSION_COOKIE, ""))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .max_age(TimeDuration::ZERO)
        .build()
        .to_string()
}

/// Session token from the session cookie, falling back to a bearer header.
pub fn session_token(headers: &HeaderMap) -> Option<String> {
    let from_cookie = headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|raw| Cookie::split_parse(raw))
        .filter_map(Result::ok)
        .find(|c| c.name() == SESSION_COOKIE && !c.value().is_empty())
        .map(|c| c.value().to_owned());

    from_cookie.or_else(|| {
        headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer ").or_else(|| v.strip_prefix("bearer ")))
            .map(|t| t.trim().to_owned())
            .filter(|t| !t.is_empty())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn keys(secret: &str, issuer: &str, audience: &str) -> SessionKeys {
        keys_with_ttl(secret, issuer, audience, 5)
    }

    fn keys_with_ttl(secret: &str, issuer: &str, audience: &str, ttl_minutes: i64) -> SessionKeys {
        SessionKeys::new(&SessionConfig {
            secret: secret.into(),
            issuer: issuer.into(),
            audience: audience.into(),
            ttl_minutes,
        })
    }

    #[test]
    fn oversized_ttl_is_capped_at_a_year() {
        let keys = keys_with_ttl("dev-secret", "ledger", "ledger-web", i64::MAX);
        let claims = keys.verify(&keys.sign("alice", Role::User).unwrap()).unwrap();
        assert_eq!(
            (claims.exp - claims.iat) as i64,
            MAX_SESSION_TTL_MINUTES * 60
        );
        assert!(keys.cookie("t").contains(&format!("Max-Age={}", MAX_SESSION_TTL_MINUTES * 60)));
    }

    #[test]
    fn signed_session_round_trips_username_and_role() {
        let keys = keys("dev-secret", "ledger", "ledger-web");
        let token = keys.sign("alice", Role::Admin).unwrap();
        let claims = keys.verify(&token).unwrap();
        assert_eq!(claims.sub, "alice");
        assert_eq!(claims.role, Role::Admin);
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn foreign_secret_or_audience_is_rejected() {
        let token = keys("one", "ledger", "ledger-web").sign("alice", Role::User).unwrap();
        assert!(keys("two", "ledger", "ledger-web").verify(&token).is_err());
        assert!(keys("one", "ledger", "elsewhere").verify(&token).is_err());
    }

    #[test]
    fn token_is_read_from_cookie_before_bearer() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer from-header"));
        assert_eq!(session_token(&headers).as_deref(), Some("from-header"));

        headers.insert(
            COOKIE,
            HeaderValue::from_static("theme=dark; ledger_session=from-cookie"),
        );
        assert_eq!(session_token(&headers).as_deref(), Some("from-cookie"));
    }

    #[test]
    fn cleared_cookie_expires_immediately() {
        let cookie = cleared_cookie();
        assert!(cookie.starts_with("ledger_session="));
        assert!(cookie.contains("Max-Age=0"));
        assert!(session_token(&HeaderMap::new()).is_none());
    }
}
