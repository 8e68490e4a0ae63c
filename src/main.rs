mod app;
mod auth;
mod config;
mod db;
mod error;
mod ledger;
mod payload;
mod reports;
mod reset;
mod state;

use crate::config::{AppConfig, DEFAULT_SECRET};
use crate::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let env_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "ledger=debug,axum=info,tower_http=info".to_string());
    let json_logs = std::env::var("LOG_FORMAT")
        .map(|v| v == "json")
        .unwrap_or(false);

    if json_logs {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    }

    let config = AppConfig::from_env()?;
    if config.session.secret == DEFAULT_SECRET {
        tracing::warn!("SECRET_KEY is not set; sessions are signed with the development secret");
    }
    if config.smtp.is_none() {
        tracing::info!("SMTP not configured; reset tokens cannot be emailed");
    }
    let (host, port) = (config.host.clone(), config.port);

    let app_state = AppState::init(config).await?;
    db::migrate(&app_state.db).await?;
    db::bootstrap_admin(&app_state.db, &app_state.config.admin_password).await?;

    let app = app::build_app(app_state);
    app::serve(app, &host, port).await
}
