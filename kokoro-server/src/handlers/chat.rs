//! Chat endpoints: the streaming turn (SSE) and its JSON sibling.
//!
//! Validation, identity, session resolution, and the inbound message write
//! all happen synchronously; a request that fails any of them never reaches
//! the retrieval or model calls and gets a plain HTTP error. Once the stream
//! is open, failures surface as a terminal `error` event.

use std::convert::Infallible;
use std::time::Duration;

use axum::extract::State;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::{Extension, Json};
use kokoro_core::{MessageRole, SessionCategory};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tokio_stream::StreamExt;
use tracing::{error, info};
use uuid::Uuid;

use storage::{MessageRecord, SessionRecord};

use crate::auth::AuthUser;
use crate::chat::{generate_reply, TurnError};
use crate::error::ApiError;
use crate::events::{ChatEvent, KnowledgeSummary};
use crate::state::AppState;

/// Hard cap on inbound message length, in characters.
const MAX_MESSAGE_CHARS: usize = 2000;
/// Session titles are cut from the first message.
const TITLE_MAX_CHARS: usize = 60;
/// Fallback title when the first message is blank after trimming.
const DEFAULT_TITLE: &str = "新しい相談";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    pub session_id: Option<String>,
    pub message: Option<String>,
    pub category: Option<String>,
}

/// Validated form of [`ChatRequest`].
struct ValidChatRequest {
    session_id: Option<Uuid>,
    message: String,
    category: SessionCategory,
}

fn validate(payload: ChatRequest) -> Result<ValidChatRequest, ApiError> {
    let message = payload
        .message
        .ok_or_else(|| ApiError::BadRequest("message is required".to_string()))?;
    let char_count = message.chars().count();
    if message.trim().is_empty() {
        return Err(ApiError::BadRequest("message must not be empty".to_string()));
    }
    if char_count > MAX_MESSAGE_CHARS {
        return Err(ApiError::BadRequest(format!(
            "message must be at most {} characters",
            MAX_MESSAGE_CHARS
        )));
    }

    let session_id = payload
        .session_id
        .map(|raw| {
            Uuid::parse_str(raw.trim())
                .map_err(|_| ApiError::BadRequest("sessionId must be a UUID".to_string()))
        })
        .transpose()?;

    let category = match payload.category {
        Some(raw) => SessionCategory::parse(&raw).ok_or_else(|| {
            ApiError::BadRequest("category must be one of love, life, relationship".to_string())
        })?,
        None => SessionCategory::default(),
    };

    Ok(ValidChatRequest {
        session_id,
        message,
        category,
    })
}

/// Resolves the target session: looks up an existing one (owner-scoped) or
/// creates a new one titled from the first message.
async fn resolve_session(
    state: &AppState,
    user: &AuthUser,
    request: &ValidChatRequest,
) -> Result<String, ApiError> {
    if let Some(session_id) = request.session_id {
        let existing = state
            .sessions
            .find_for_user(&session_id.to_string(), &user.id)
            .await?;
        return match existing {
            Some(session) => Ok(session.id),
            None => Err(ApiError::NotFound("Session not found".to_string())),
        };
    }

    let trimmed = request.message.trim();
    let title: String = trimmed.chars().take(TITLE_MAX_CHARS).collect();
    let title = if title.is_empty() {
        DEFAULT_TITLE.to_string()
    } else {
        title
    };

    let session = SessionRecord::new(&user.id, request.category, Some(title));
    state
        .sessions
        .create(&session)
        .await
        .map_err(|e| ApiError::Internal(format!("Failed to create session: {}", e)))?;

    Ok(session.id)
}

/// Shared synchronous phase: validate, resolve the session, persist the
/// inbound user message.
async fn begin_turn(
    state: &AppState,
    user: &AuthUser,
    payload: ChatRequest,
) -> Result<(String, String), ApiError> {
    let request = validate(payload)?;
    let session_id = resolve_session(state, user, &request).await?;

    let user_message = MessageRecord::new(&session_id, MessageRole::User, request.message.clone());
    state
        .messages
        .save(&user_message)
        .await
        .map_err(|e| ApiError::Internal(format!("Failed to save message: {}", e)))?;

    info!(
        session_id = %session_id,
        user_id = %user.id,
        chars = request.message.chars().count(),
        "chat turn started"
    );

    Ok((session_id, request.message))
}

/// POST /api/chat - streaming chat turn over SSE.
pub async fn chat_stream(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(payload): Json<ChatRequest>,
) -> Result<Sse<impl tokio_stream::Stream<Item = Result<Event, Infallible>> + Send>, ApiError> {
    let (session_id, message) = begin_turn(&state, &user, payload).await?;

    let (tx, rx) = mpsc::channel::<ChatEvent>(32);
    tokio::spawn(run_stream(state, session_id, message, tx));

    let stream = ReceiverStream::new(rx).map(|event| {
        let data = serde_json::to_string(&event).unwrap_or_default();
        Ok(Event::default().data(data))
    });

    Ok(Sse::new(stream).keep_alive(KeepAlive::new().interval(Duration::from_secs(15))))
}

/// The streaming task: emits the leading meta event, runs the turn, and
/// guarantees exactly one terminal event (`done` or `error`) on every path.
/// Send failures mean the client is gone and are ignored.
async fn run_stream(
    state: AppState,
    session_id: String,
    message: String,
    tx: mpsc::Sender<ChatEvent>,
) {
    let _ = tx.send(ChatEvent::meta(&session_id)).await;

    match generate_reply(&state, &session_id, &message, Some(&tx)).await {
        Ok(outcome) => {
            if !outcome.knowledge.is_empty() {
                let _ = tx
                    .send(ChatEvent::meta_with_knowledge(
                        &session_id,
                        outcome.knowledge,
                    ))
                    .await;
            }
            let _ = tx.send(ChatEvent::Done).await;
        }
        Err(e) => {
            error!(session_id = %session_id, error = ?e, "chat turn failed");
            let _ = tx
                .send(ChatEvent::Error {
                    message: e.user_message().to_string(),
                })
                .await;
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatSyncResponse {
    pub session_id: String,
    pub reply: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub knowledge: Option<Vec<KnowledgeSummary>>,
}

/// POST /api/chat/sync - the same turn contract with a plain JSON response.
pub async fn chat_sync(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(payload): Json<ChatRequest>,
) -> Result<Json<ChatSyncResponse>, ApiError> {
    let (session_id, message) = begin_turn(&state, &user, payload).await?;

    let outcome = generate_reply(&state, &session_id, &message, None)
        .await
        .map_err(|e| match e {
            TurnError::EmptyReply => ApiError::BadGateway("No response generated".to_string()),
            TurnError::History(err) => {
                ApiError::Internal(format!("Failed to load conversation: {}", err))
            }
            TurnError::Persist(err) => {
                ApiError::Internal(format!("Failed to save assistant reply: {}", err))
            }
            TurnError::Retrieval(err) | TurnError::Completion(err) => {
                ApiError::Internal(format!("Chat turn failed: {}", err))
            }
        })?;

    Ok(Json(ChatSyncResponse {
        session_id,
        reply: outcome.reply,
        knowledge: if outcome.knowledge.is_empty() {
            None
        } else {
            Some(outcome.knowledge)
        },
    }))
}
