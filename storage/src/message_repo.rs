//! Message repository: append-only persistence and bounded history reads.
//!
//! Messages are never updated or deleted individually; corrections are new
//! rows. History reads are bounded so the model context stays capped.

use tracing::info;

use crate::error::StorageError;
use crate::models::MessageRecord;
use crate::sqlite_pool::SqlitePoolManager;

#[derive(Clone)]
pub struct MessageRepository {
    pool_manager: SqlitePoolManager,
}

impl MessageRepository {
    pub fn new(pool_manager: SqlitePoolManager) -> Self {
        Self { pool_manager }
    }

    /// Creates the messages table and indexes if they do not exist.
    pub async fn init(&self) -> Result<(), StorageError> {
        let pool = self.pool_manager.pool();

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS messages (
                id TEXT PRIMARY KEY,
                session_id TEXT NOT NULL,
                role TEXT NOT NULL,
                content TEXT NOT NULL,
                created_at TEXT NOT NULL
            )
            "#,
        )
        .execute(pool)
        .await?;

        sqlx::query(
            r#"
            CREATE INDEX IF NOT EXISTS idx_messages_session_id ON messages(session_id);
            CREATE INDEX IF NOT EXISTS idx_messages_created_at ON messages(created_at);
            "#,
        )
        .execute(pool)
        .await?;

        Ok(())
    }

    /// Appends one message row.
    pub async fn save(&self, message: &MessageRecord) -> Result<(), StorageError> {
        sqlx::query(
            r#"
            INSERT INTO messages (id, session_id, role, content, created_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(&message.id)
        .bind(&message.session_id)
        .bind(&message.role)
        .bind(&message.content)
        .bind(message.created_at)
        .execute(self.pool_manager.pool())
        .await?;

        info!(
            message_id = %message.id,
            session_id = %message.session_id,
            role = %message.role,
            "Saved message"
        );
        Ok(())
    }

    /// Returns the `limit` most recent messages of a session in ascending
    /// creation order (fetches newest-first, then reverses).
    pub async fn recent_for_session(
        &self,
        session_id: &str,
        limit: i64,
    ) -> Result<Vec<MessageRecord>, StorageError> {
        let mut messages = sqlx::query_as::<_, MessageRecord>(
            "SELECT * FROM messages WHERE session_id = ? ORDER BY created_at DESC LIMIT ?",
        )
        .bind(session_id)
        .bind(limit)
        .fetch_all(self.pool_manager.pool())
        .await?;

        messages.reverse();
        Ok(messages)
    }

    /// Returns up to `limit` messages of a session from the beginning, in
    /// ascending creation order (history endpoint).
    pub async fn list_for_session(
        &self,
        session_id: &str,
        limit: i64,
    ) -> Result<Vec<MessageRecord>, StorageError> {
        let messages = sqlx::query_as::<_, MessageRecord>(
            "SELECT * FROM messages WHERE session_id = ? ORDER BY created_at ASC LIMIT ?",
        )
        .bind(session_id)
        .bind(limit)
        .fetch_all(self.pool_manager.pool())
        .await?;

        Ok(messages)
    }
}
