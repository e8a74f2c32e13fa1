use chrono::{DateTime, Utc};
use kokoro_core::MessageRole;
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

/// One message row. Immutable once created; ordered by `created_at` within a
/// session.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct MessageRecord {
    pub id: String,
    pub session_id: String,
    pub role: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl MessageRecord {
    /// Builds a new message with a generated UUID and current timestamp.
    pub fn new(session_id: &str, role: MessageRole, content: String) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            session_id: session_id.to_string(),
            role: role.as_str().to_string(),
            content,
            created_at: Utc::now(),
        }
    }

    /// Parses the stored role; unknown values are treated as user turns,
    /// matching the model-facing normalization.
    pub fn role(&self) -> MessageRole {
        MessageRole::parse(&self.role).unwrap_or(MessageRole::User)
    }
}
