use anyhow::Context;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub ttl_minutes: i64,
}

/// Outgoing mail relay. Only built when host, port and sender are all set.
#[derive(Debug, Clone, Deserialize)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub from: String,
    pub username: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub session: SessionConfig,
    pub admin_password: String,
    pub smtp: Option<SmtpConfig>,
    /// Hand the raw reset token back to the caller when no email went out.
    pub reset_token_fallback: bool,
    pub host: String,
    pub port: u16,
}

pub const DEFAULT_SECRET: &str = "dev-secret";
pub const DEFAULT_ADMIN_PASSWORD: &str = "admin";
pub const MAX_SESSION_TTL_MINUTES: i64 = 60 * 24 * 366;

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    pub fn from_vars<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let ttl_minutes = var("SESSION_TTL_MINUTES")
            .map(|v| v.parse::<i64>())
            .transpose()
            .context("SESSION_TTL_MINUTES must be an integer")?
            .unwrap_or(60 * 24 * 7);
        if !(1..=MAX_SESSION_TTL_MINUTES).contains(&ttl_minutes) {
            anyhow::bail!("SESSION_TTL_MINUTES must be between 1 and {MAX_SESSION_TTL_MINUTES}");
        }

        let session = SessionConfig {
            secret: var("SECRET_KEY").unwrap_or_else(|| DEFAULT_SECRET.into()),
            issuer: var("SESSION_ISSUER").unwrap_or_else(|| "ledger".into()),
            audience: var("SESSION_AUDIENCE").unwrap_or_else(|| "ledger-web".into()),
            ttl_minutes,
        };

        let smtp_port = var("SMTP_PORT")
            .map(|v| v.parse::<u16>())
            .transpose()
            .context("SMTP_PORT must be a port number")?;
        let smtp = match (var("SMTP_HOST"), smtp_port, var("SMTP_FROM")) {
            (Some(host), Some(port), Some(from)) if port != 0 => Some(SmtpConfig {
                host,
                port,
                from,
                username: var("SMTP_USER"),
                password: var("SMTP_PASS"),
            }),
            _ => None,
        };

        let reset_token_fallback = match var("RESET_TOKEN_FALLBACK") {
            None => true,
            Some(v) => parse_flag(&v)
                .with_context(|| format!("RESET_TOKEN_FALLBACK must be a boolean, got {v:?}"))?,
        };

        Ok(Self {
            database_url: var("DATABASE_URL").unwrap_or_else(|| "sqlite://ledger.db".into()),
            session,
            admin_password: var("ADMIN_PASS").unwrap_or_else(|| DEFAULT_ADMIN_PASSWORD.into()),
            smtp,
            reset_token_fallback,
            host: var("APP_HOST").unwrap_or_else(|| "0.0.0.0".into()),
            port: var("APP_PORT")
                .map(|v| v.parse::<u16>())
                .transpose()
                .context("APP_PORT must be a port number")?
                .unwrap_or(5000),
        })
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> anyhow::Result<AppConfig> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_vars(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_apply_when_nothing_is_set() {
        let cfg = config_from(&[]).unwrap();
        assert_eq!(cfg.database_url, "sqlite://ledger.db");
        assert_eq!(cfg.session.secret, DEFAULT_SECRET);
        assert_eq!(cfg.admin_password, DEFAULT_ADMIN_PASSWORD);
        assert_eq!(cfg.port, 5000);
        assert!(cfg.smtp.is_none());
        assert!(cfg.reset_token_fallback);
    }

    #[test]
    fn smtp_requires_host_port_and_sender() {
        let cfg = config_from(&[("SMTP_HOST", "mail.local"), ("SMTP_PORT", "587")]).unwrap();
        assert!(cfg.smtp.is_none());

        let cfg = config_from(&[
            ("SMTP_HOST", "mail.local"),
            ("SMTP_PORT", "587"),
            ("SMTP_FROM", "ledger@mail.local"),
            ("SMTP_USER", "bot"),
        ])
        .unwrap();
        let smtp = cfg.smtp.expect("smtp configured");
        assert_eq!(smtp.port, 587);
        assert_eq!(smtp.username.as_deref(), Some("bot"));
        assert!(smtp.password.is_none());
    }

    #[test]
    fn malformed_values_are_rejected() {
        assert!(config_from(&[("SMTP_PORT", "smtp")]).is_err());
        assert!(config_from(&[("RESET_TOKEN_FALLBACK", "maybe")]).is_err());
        assert!(config_from(&[("SESSION_TTL_MINUTES", "-")]).is_err());
    }

    #[test]
    fn session_ttl_must_be_in_range() {
        assert!(config_from(&[("SESSION_TTL_MINUTES", "0")]).is_err());
        assert!(config_from(&[("SESSION_TTL_MINUTES", "-5")]).is_err());
        let huge = i64::MAX.to_string();
        assert!(config_from(&[("SESSION_TTL_MINUTES", huge.as_str())]).is_err());

        let max = MAX_SESSION_TTL_MINUTES.to_string();
        let cfg = config_from(&[("SESSION_TTL_MINUTES", max.as_str())]).unwrap();
        assert_eq!(cfg.session.ttl_minutes, MAX_SESSION_TTL_MINUTES);
    }

    #[test]
    fn fallback_flag_can_be_disabled() {
        let cfg = config_from(&[("RESET_TOKEN_FALLBACK", "off")]).unwrap();
        assert!(!cfg.reset_token_fallback);
    }
}
