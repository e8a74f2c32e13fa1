//! User repository: minimal user rows for identity resolution.
//!
//! The chat path never reads this table; it exists so the demo-identity
//! fallback can guarantee its synthetic user row before writing sessions.

use chrono::Utc;
use tracing::info;

use crate::error::StorageError;
use crate::sqlite_pool::SqlitePoolManager;

#[derive(Clone)]
pub struct UserRepository {
    pool_manager: SqlitePoolManager,
}

impl UserRepository {
    pub fn new(pool_manager: SqlitePoolManager) -> Self {
        Self { pool_manager }
    }

    /// Creates the users table if it does not exist.
    pub async fn init(&self) -> Result<(), StorageError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS users (
                id TEXT PRIMARY KEY,
                email TEXT NOT NULL,
                created_at TEXT NOT NULL
            )
            "#,
        )
        .execute(self.pool_manager.pool())
        .await?;

        Ok(())
    }

    /// Upserts a user row by id. Existing rows are left untouched.
    pub async fn ensure(&self, user_id: &str, email: &str) -> Result<(), StorageError> {
        let result = sqlx::query(
            r#"
            INSERT INTO users (id, email, created_at)
            VALUES (?, ?, ?)
            ON CONFLICT(id) DO NOTHING
            "#,
        )
        .bind(user_id)
        .bind(email)
        .bind(Utc::now())
        .execute(self.pool_manager.pool())
        .await?;

        if result.rows_affected() > 0 {
            info!(user_id = %user_id, "Created user row");
        }
        Ok(())
    }
}
