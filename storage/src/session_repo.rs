//! Session repository: owner-scoped persistence and queries for sessions.
//!
//! Every read and delete is filtered by `user_id`; ownership is a predicate,
//! not a post-check, so foreign sessions are indistinguishable from absent
//! ones.

use chrono::Utc;
use tracing::info;

use crate::error::StorageError;
use crate::models::SessionRecord;
use crate::sqlite_pool::SqlitePoolManager;

#[derive(Clone)]
pub struct SessionRepository {
    pool_manager: SqlitePoolManager,
}

impl SessionRepository {
    pub fn new(pool_manager: SqlitePoolManager) -> Self {
        Self { pool_manager }
    }

    /// Creates the sessions table and indexes if they do not exist.
    pub async fn init(&self) -> Result<(), StorageError> {
        let pool = self.pool_manager.pool();

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS sessions (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL,
                category TEXT NOT NULL,
                title TEXT,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )
            "#,
        )
        .execute(pool)
        .await?;

        sqlx::query(
            r#"
            CREATE INDEX IF NOT EXISTS idx_sessions_user_id ON sessions(user_id);
            CREATE INDEX IF NOT EXISTS idx_sessions_updated_at ON sessions(updated_at);
            "#,
        )
        .execute(pool)
        .await?;

        Ok(())
    }

    /// Inserts a new session row.
    pub async fn create(&self, session: &SessionRecord) -> Result<(), StorageError> {
        sqlx::query(
            r#"
            INSERT INTO sessions (id, user_id, category, title, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&session.id)
        .bind(&session.user_id)
        .bind(&session.category)
        .bind(&session.title)
        .bind(session.created_at)
        .bind(session.updated_at)
        .execute(self.pool_manager.pool())
        .await?;

        info!(session_id = %session.id, user_id = %session.user_id, "Created session");
        Ok(())
    }

    /// Looks up one session owned by the given user. Returns `None` when the
    /// session does not exist or belongs to someone else.
    pub async fn find_for_user(
        &self,
        session_id: &str,
        user_id: &str,
    ) -> Result<Option<SessionRecord>, StorageError> {
        let session = sqlx::query_as::<_, SessionRecord>(
            "SELECT * FROM sessions WHERE id = ? AND user_id = ?",
        )
        .bind(session_id)
        .bind(user_id)
        .fetch_optional(self.pool_manager.pool())
        .await?;

        Ok(session)
    }

    /// Lists the user's sessions, most recently updated first.
    pub async fn list_for_user(
        &self,
        user_id: &str,
        limit: i64,
    ) -> Result<Vec<SessionRecord>, StorageError> {
        let sessions = sqlx::query_as::<_, SessionRecord>(
            "SELECT * FROM sessions WHERE user_id = ? ORDER BY updated_at DESC LIMIT ?",
        )
        .bind(user_id)
        .bind(limit)
        .fetch_all(self.pool_manager.pool())
        .await?;

        Ok(sessions)
    }

    /// Deletes a session the user owns, along with its messages. Returns the
    /// number of session rows removed; 0 means absent or foreign, and
    /// callers treat both as success.
    pub async fn delete_for_user(
        &self,
        session_id: &str,
        user_id: &str,
    ) -> Result<u64, StorageError> {
        let pool = self.pool_manager.pool();

        let result = sqlx::query("DELETE FROM sessions WHERE id = ? AND user_id = ?")
            .bind(session_id)
            .bind(user_id)
            .execute(pool)
            .await?;

        if result.rows_affected() > 0 {
            sqlx::query("DELETE FROM messages WHERE session_id = ?")
                .bind(session_id)
                .execute(pool)
                .await?;
            info!(session_id = %session_id, "Deleted session and its messages");
        }

        Ok(result.rows_affected())
    }

    /// Bumps `updated_at` to now. Message activity calls this so the session
    /// list sorts by recency.
    pub async fn touch(&self, session_id: &str) -> Result<(), StorageError> {
        sqlx::query("UPDATE sessions SET updated_at = ? WHERE id = ?")
            .bind(Utc::now())
            .bind(session_id)
            .execute(self.pool_manager.pool())
            .await?;

        Ok(())
    }
}
