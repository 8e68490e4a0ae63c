use sqlx::SqlitePool;

use crate::auth::repo_types::{NewUser, User};
use crate::error::AppError;

const USER_COLUMNS: &str =
    "id, username, password_hash, email, role, reset_token, reset_expiry";

impl User {
    /// Find a user by username.
    pub async fn find_by_username(db: &SqlitePool, username: &str) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE username = ?"
        ))
        .bind(username)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    pub async fn find_by_reset_token(db: &SqlitePool, token: &str) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE reset_token = ?"
        ))
        .bind(token)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    pub async fn count(db: &SqlitePool) -> Result<i64, AppError> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users")
            .fetch_one(db)
            .await?;
        Ok(count)
    }

    /// Insert a new user. A taken username yields `Conflict`.
    pub async fn create(db: &SqlitePool, new: NewUser<'_>) -> Result<User, AppError> {
        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (username, password_hash, email, role)
            VALUES (?, ?, ?, ?)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(new.username)
        .bind(new.password_hash)
        .bind(new.email)
        .bind(new.role.as_str())
        .fetch_one(db)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
                AppError::Conflict("username exists".into())
            }
            other => AppError::Database(other),
        })?;
        Ok(user)
    }

    /// Store a reset token, replacing any pending one. Returns false for an unknown username.
    pub async fn set_reset_token(
        db: &SqlitePool,
        username: &str,
        token: &str,
        expires_at: i64,
    ) -> Result<bool, AppError> {
        let res = sqlx::query(
            "UPDATE users SET reset_token = ?, reset_expiry = ? WHERE username = ?",
        )
        .bind(token)
        .bind(expires_at)
        .bind(username)
        .execute(db)
        .await?;
        Ok(res.rows_affected() == 1)
    }

    /// Swap the password hash and clear the token in one statement, but only
    /// while the token is still live at `now`. Returns the updated user id.
    pub async fn redeem_reset_token(
        db: &SqlitePool,
        token: &str,
        password_hash: &str,
        now: i64,
    ) -> Result<Option<i64>, AppError> {
        let id = sqlx::query_scalar::<_, i64>(
            r#"
            UPDATE users
               SET password_hash = ?, reset_token = NULL, reset_expiry = NULL
             WHERE reset_token = ? AND reset_expiry > ?
            RETURNING id
            "#,
        )
        .bind(password_hash)
        .bind(token)
        .bind(now)
        .fetch_optional(db)
        .await?;
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::repo_types::Role;
    use crate::db;

    fn new_user<'a>(username: &'a str, hash: &'a str) -> NewUser<'a> {
        NewUser {
            username,
            password_hash: hash,
            email: Some("someone@example.com"),
            role: Role::User,
        }
    }

    #[tokio::test]
    async fn create_assigns_increasing_ids() {
        let db = db::memory().await;
        let a = User::create(&db, new_user("alice", "h1")).await.unwrap();
        let b = User::create(&db, new_user("bob", "h2")).await.unwrap();
        assert!(b.id > a.id);
        assert_eq!(a.role, Role::User);
        assert_eq!(a.email.as_deref(), Some("someone@example.com"));
        assert!(!a.has_pending_reset());
    }

    #[tokio::test]
    async fn duplicate_username_is_a_conflict_and_keeps_first() {
        let db = db::memory().await;
        User::create(&db, new_user("alice", "first-hash")).await.unwrap();
        let err = User::create(&db, new_user("alice", "replacement"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));

        let stored = User::find_by_username(&db, "alice").await.unwrap().unwrap();
        assert_eq!(stored.password_hash, "first-hash");
        assert_eq!(User::count(&db).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn redeem_only_matches_live_tokens() {
        let db = db::memory().await;
        User::create(&db, new_user("alice", "old")).await.unwrap();
        assert!(User::set_reset_token(&db, "alice", "tok", 1_000).await.unwrap());
        assert!(!User::set_reset_token(&db, "nobody", "tok2", 1_000).await.unwrap());

        // at or after the expiry nothing changes
        assert_eq!(User::redeem_reset_token(&db, "tok", "new", 1_000).await.unwrap(), None);
        let stored = User::find_by_reset_token(&db, "tok").await.unwrap().unwrap();
        assert_eq!(stored.password_hash, "old");

        let id = User::redeem_reset_token(&db, "tok", "new", 999).await.unwrap();
        assert_eq!(id, Some(stored.id));
        let stored = User::find_by_username(&db, "alice").await.unwrap().unwrap();
        assert_eq!(stored.password_hash, "new");
        assert!(stored.reset_token.is_none());
        assert!(stored.reset_expiry.is_none());
    }
}
