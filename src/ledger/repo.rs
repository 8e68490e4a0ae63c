use sqlx::SqlitePool;

use crate::error::AppError;
use crate::ledger::repo_types::{DailyTotal, LedgerEntry};

impl LedgerEntry {
    pub async fn insert(
        db: &SqlitePool,
        date: &str,
        description: &str,
        amount: f64,
    ) -> Result<LedgerEntry, AppError> {
        let entry = sqlx::query_as::<_, LedgerEntry>(
            r#"
            INSERT INTO messages (date, description, amount)
            VALUES (?, ?, ?)
            RETURNING id, date, description, amount
            "#,
        )
        .bind(date)
        .bind(description)
        .bind(amount)
        .fetch_one(db)
        .await?;
        Ok(entry)
    }

    /// Newest first, optionally restricted to one date.
    pub async fn list_page(
        db: &SqlitePool,
        date: Option<&str>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<LedgerEntry>, AppError> {
        let rows = sqlx::query_as::<_, LedgerEntry>(
            r#"
            SELECT id, date, description, amount
              FROM messages
             WHERE (?1 IS NULL OR date = ?1)
             ORDER BY date DESC, id DESC
             LIMIT ?2 OFFSET ?3
            "#,
        )
        .bind(date)
        .bind(limit)
        .bind(offset)
        .fetch_all(db)
        .await?;
        Ok(rows)
    }

    pub async fn count(db: &SqlitePool, date: Option<&str>) -> Result<i64, AppError> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM messages WHERE (?1 IS NULL OR date = ?1)",
        )
        .bind(date)
        .fetch_one(db)
        .await?;
        Ok(count)
    }

    pub async fn balance(db: &SqlitePool, date: &str) -> Result<f64, AppError> {
        let total = sqlx::query_scalar::<_, f64>(
            "SELECT COALESCE(SUM(amount), 0.0) FROM messages WHERE date = ?",
        )
        .bind(date)
        .fetch_one(db)
        .await?;
        Ok(total)
    }

    /// Entries with `start <= date <= end`, oldest first.
    pub async fn range(db: &SqlitePool, start: &str, end: &str) -> Result<Vec<LedgerEntry>, AppError> {
        let rows = sqlx::query_as::<_, LedgerEntry>(
            r#"
            SELECT id, date, description, amount
              FROM messages
             WHERE date >= ? AND date <= ?
             ORDER BY date, id
            "#,
        )
        .bind(start)
        .bind(end)
        .fetch_all(db)
        .await?;
        Ok(rows)
    }

    pub async fn for_date(db: &SqlitePool, date: &str) -> Result<Vec<LedgerEntry>, AppError> {
        let rows = sqlx::query_as::<_, LedgerEntry>(
            "SELECT id, date, description, amount FROM messages WHERE date = ? ORDER BY id",
        )
        .bind(date)
        .fetch_all(db)
        .await?;
        Ok(rows)
    }

    pub async fn all(db: &SqlitePool) -> Result<Vec<LedgerEntry>, AppError> {
        let rows = sqlx::query_as::<_, LedgerEntry>(
            "SELECT id, date, description, amount FROM messages ORDER BY date, id",
        )
        .fetch_all(db)
        .await?;
        Ok(rows)
    }
}

impl DailyTotal {
    /// Per-date sums over the half-open interval `[start, end)`, by date ascending.
    pub async fn between(db: &SqlitePool, start: &str, end: &str) -> Result<Vec<DailyTotal>, AppError> {
        let rows = sqlx::query_as::<_, DailyTotal>(
            r#"
            SELECT date, COALESCE(SUM(amount), 0.0) AS total
              FROM messages
             WHERE date >= ? AND date < ?
             GROUP BY date
             ORDER BY date
            "#,
        )
        .bind(start)
        .bind(end)
        .fetch_all(db)
        .await?;
        Ok(rows)
    }
}
