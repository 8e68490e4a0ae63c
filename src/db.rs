use std::str::FromStr;

use anyhow::Context;
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    SqlitePool,
};
use tracing::{info, warn};

use crate::auth::{
    password::hash_password,
    repo_types::{NewUser, Role, User},
};
use crate::config::DEFAULT_ADMIN_PASSWORD;

pub const ADMIN_USERNAME: &str = "admin";

pub async fn connect(database_url: &str) -> anyhow::Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str(database_url)
        .with_context(|| format!("parse database url {database_url}"))?
        .create_if_missing(true);
    let db = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await
        .context("connect to database")?;
    Ok(db)
}

/// Apply pending schema migrations. Already-applied versions are skipped.
pub async fn migrate(db: &SqlitePool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations")
        .run(db)
        .await
        .context("run migrations")?;
    Ok(())
}

/// Create the `admin` account when the user table is empty.
pub async fn bootstrap_admin(db: &SqlitePool, admin_password: &str) -> anyhow::Result<bool> {
    if User::count(db).await? > 0 {
        return Ok(false);
    }
    if admin_password == DEFAULT_ADMIN_PASSWORD {
        warn!("creating admin account with the default password; set ADMIN_PASS");
    }
    let hash = hash_password(admin_password)?;
    User::create(
        db,
        NewUser {
            username: ADMIN_USERNAME,
            password_hash: &hash,
            email: None,
            role: Role::Admin,
        },
    )
    .await?;
    info!(username = ADMIN_USERNAME, "admin account created");
    Ok(true)
}

/// Single-connection in-memory database with the schema applied.
#[cfg(test)]
pub async fn memory() -> SqlitePool {
    let db = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await
        .expect("in-memory sqlite");
    migrate(&db).await.expect("migrations apply");
    db
}
