use std::sync::Arc;

use sqlx::SqlitePool;

use crate::config::AppConfig;
use crate::reports::pdf::{self, PdfRenderer};
use crate::reset::mailer::{Mailer, SmtpMailer};

#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    pub config: Arc<AppConfig>,
    pub mailer: Option<Arc<dyn Mailer>>,
    pub pdf: Option<Arc<dyn PdfRenderer>>,
}

impl AppState {
    pub async fn init(config: AppConfig) -> anyhow::Result<Self> {
        let db = crate::db::connect(&config.database_url).await?;
        let mailer = config
            .smtp
            .clone()
            .map(|smtp| Arc::new(SmtpMailer::new(smtp)) as Arc<dyn Mailer>);

        Ok(Self::from_parts(db, Arc::new(config), mailer, pdf::default_renderer()))
    }

    pub fn from_parts(
        db: SqlitePool,
        config: Arc<AppConfig>,
        mailer: Option<Arc<dyn Mailer>>,
        pdf: Option<Arc<dyn PdfRenderer>>,
    ) -> Self {
        Self {
            db,
            config,
            mailer,
            pdf,
        }
    }

    /// In-memory database, default config, no mail relay.
    #[cfg(test)]
    pub async fn fake() -> Self {
        let config = AppConfig::from_vars(|_| None).expect("default config");
        Self::from_parts(
            crate::db::memory().await,
            Arc::new(config),
            None,
            pdf::default_renderer(),
        )
    }
}
