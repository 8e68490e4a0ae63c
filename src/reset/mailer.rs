use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use lettre::{
    message::header::ContentType, transport::smtp::authentication::Credentials, Message,
    SmtpTransport, Transport,
};
use tracing::debug;

use crate::config::SmtpConfig;

const SMTP_TIMEOUT: Duration = Duration::from_secs(10);

/// Outbound plain-text email.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, to: &str, subject: &str, body: &str) -> anyhow::Result<()>;
}

/// STARTTLS relay configured from the environment.
#[derive(Debug, Clone)]
pub struct SmtpMailer {
    config: SmtpConfig,
}

impl SmtpMailer {
    pub fn new(config: SmtpConfig) -> Self {
        Self { config }
    }

    fn transport(&self) -> anyhow::Result<SmtpTransport> {
        let mut builder = SmtpTransport::starttls_relay(&self.config.host)
            .with_context(|| format!("smtp relay {}", self.config.host))?
            .port(self.config.port)
            .timeout(Some(SMTP_TIMEOUT));
        if let (Some(user), Some(pass)) = (&self.config.username, &self.config.password) {
            builder = builder.credentials(Credentials::new(user.clone(), pass.clone()));
        }
        Ok(builder.build())
    }

    fn message(&self, to: &str, subject: &str, body: &str) -> anyhow::Result<Message> {
        Message::builder()
            .from(self.config.from.parse().context("invalid SMTP_FROM address")?)
            .to(to.parse().context("invalid recipient address")?)
            .subject(subject)
            .header(ContentType::TEXT_PLAIN)
            .body(body.to_string())
            .context("build email")
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, to: &str, subject: &str, body: &str) -> anyhow::Result<()> {
        let message = self.message(to, subject, body)?;
        let transport = self.transport()?;
        tokio::task::spawn_blocking(move || transport.send(&message))
            .await
            .context("smtp task panicked")?
            .context("smtp send")?;
        debug!(host = %self.config.host, %to, "email sent");
        Ok(())
    }
}
