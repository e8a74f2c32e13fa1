//! Session endpoints: listing, history, and deletion. All owner-scoped.

use axum::extract::{Path, State};
use axum::{Extension, Json};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use storage::{MessageRecord, SessionRecord};

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::state::AppState;

/// Maximum sessions returned by the listing endpoint.
const SESSION_LIST_LIMIT: i64 = 50;
/// Maximum messages returned by the history endpoint.
const MESSAGE_LIST_LIMIT: i64 = 200;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    pub id: String,
    pub title: Option<String>,
    pub category: String,
    pub updated_at: DateTime<Utc>,
}

impl From<SessionRecord> for SessionSummary {
    fn from(record: SessionRecord) -> Self {
        Self {
            id: record.id,
            title: record.title,
            category: record.category,
            updated_at: record.updated_at,
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageView {
    pub id: String,
    pub role: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl From<MessageRecord> for MessageView {
    fn from(record: MessageRecord) -> Self {
        Self {
            id: record.id,
            role: record.role,
            content: record.content,
            created_at: record.created_at,
        }
    }
}

#[derive(Serialize)]
pub struct SessionListResponse {
    pub sessions: Vec<SessionSummary>,
}

#[derive(Serialize)]
pub struct SessionDetailResponse {
    pub session: SessionSummary,
    pub messages: Vec<MessageView>,
}

#[derive(Serialize)]
pub struct DeleteResponse {
    pub success: bool,
}

fn parse_session_id(raw: &str) -> Result<String, ApiError> {
    Uuid::parse_str(raw.trim())
        .map(|id| id.to_string())
        .map_err(|_| ApiError::BadRequest("sessionId must be a UUID".to_string()))
}

/// GET /api/sessions - the caller's sessions, most recently updated first.
pub async fn list_sessions(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<SessionListResponse>, ApiError> {
    let sessions = state
        .sessions
        .list_for_user(&user.id, SESSION_LIST_LIMIT)
        .await?;

    Ok(Json(SessionListResponse {
        sessions: sessions.into_iter().map(SessionSummary::from).collect(),
    }))
}

/// GET /api/sessions/{session_id} - session summary plus bounded ascending
/// message history. 404 unless the caller owns the session.
pub async fn get_session(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(session_id): Path<String>,
) -> Result<Json<SessionDetailResponse>, ApiError> {
    let session_id = parse_session_id(&session_id)?;

    let session = state
        .sessions
        .find_for_user(&session_id, &user.id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Session not found".to_string()))?;

    let messages = state
        .messages
        .list_for_session(&session_id, MESSAGE_LIST_LIMIT)
        .await?;

    Ok(Json(SessionDetailResponse {
        session: SessionSummary::from(session),
        messages: messages.into_iter().map(MessageView::from).collect(),
    }))
}

/// DELETE /api/sessions/{session_id} - idempotent success; deleting an
/// absent or foreign session reports success without touching anything.
pub async fn delete_session(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(session_id): Path<String>,
) -> Result<Json<DeleteResponse>, ApiError> {
    let session_id = parse_session_id(&session_id)?;

    let removed = state
        .sessions
        .delete_for_user(&session_id, &user.id)
        .await?;

    info!(
        session_id = %session_id,
        user_id = %user.id,
        removed = removed,
        "session delete requested"
    );

    Ok(Json(DeleteResponse { success: true }))
}
