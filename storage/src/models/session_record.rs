use chrono::{DateTime, Utc};
use kokoro_core::SessionCategory;
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

/// One counseling session row. Ownership (`user_id`) never changes after
/// creation; `updated_at` is touched on message activity.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct SessionRecord {
    pub id: String,
    pub user_id: String,
    pub category: String,
    pub title: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl SessionRecord {
    /// Builds a new session with a generated UUID and current timestamps.
    pub fn new(user_id: &str, category: SessionCategory, title: Option<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            category: category.as_str().to_string(),
            title,
            created_at: now,
            updated_at: now,
        }
    }

    /// Parses the stored category; unknown values fall back to the default.
    pub fn category(&self) -> SessionCategory {
        SessionCategory::parse(&self.category).unwrap_or_default()
    }
}
