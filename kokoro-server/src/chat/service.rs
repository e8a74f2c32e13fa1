//! The chat turn core: retrieve knowledge, assemble the conversation, stream
//! the completion, and persist the assistant reply before success is
//! signaled.
//!
//! Both transports share this function; the SSE handler passes a channel so
//! deltas are forwarded as they arrive, the JSON handler passes `None`.

use std::future::Future;
use std::pin::Pin;

use kokoro_core::MessageRole;
use llm_client::StreamChunk;
use retrieval::{compose, inject, RetrieveOptions};
use storage::{MessageRecord, StorageError};
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::events::{ChatEvent, KnowledgeSummary};
use crate::state::AppState;

use super::assembler::assemble;

/// Result of one successful chat turn.
#[derive(Debug)]
pub struct TurnOutcome {
    /// The full assistant reply (trimmed, non-empty, persisted).
    pub reply: String,
    /// Summaries of the knowledge matches that informed the reply.
    pub knowledge: Vec<KnowledgeSummary>,
}

/// Failure modes of one chat turn.
#[derive(Debug)]
pub enum TurnError {
    /// Embedding call failed; the turn is aborted.
    Retrieval(anyhow::Error),
    /// Loading conversation history failed.
    History(StorageError),
    /// The completion stream failed (includes client disconnect while
    /// forwarding deltas).
    Completion(anyhow::Error),
    /// The model produced only whitespace; nothing was persisted.
    EmptyReply,
    /// Persisting the assistant reply failed after streaming completed.
    Persist(StorageError),
}

impl TurnError {
    /// Localized, user-safe message for the terminal error event.
    pub fn user_message(&self) -> &'static str {
        match self {
            TurnError::EmptyReply => "回答を生成できませんでした。もう一度お試しください。",
            _ => "エラーが発生しました。しばらくしてからお試しください。",
        }
    }
}

/// Runs one chat turn against an already-resolved session whose inbound user
/// message is already persisted.
///
/// When `delta_tx` is given, every completion delta is forwarded on it as a
/// [`ChatEvent::Delta`] while the full text accumulates; a closed channel
/// (client disconnect) aborts the completion stream and the turn, and the
/// partial reply is not persisted.
///
/// The assistant message is persisted, and the session touched, before this
/// function returns success, so a caller that then signals `done` can
/// promise durability.
pub async fn generate_reply(
    state: &AppState,
    session_id: &str,
    latest_user_text: &str,
    delta_tx: Option<&mpsc::Sender<ChatEvent>>,
) -> Result<TurnOutcome, TurnError> {
    let matches = state
        .retriever
        .retrieve(latest_user_text, &RetrieveOptions::default())
        .await
        .map_err(TurnError::Retrieval)?;

    let turns = assemble(&state.messages, session_id, latest_user_text)
        .await
        .map_err(TurnError::History)?;
    let turns = match compose(&matches) {
        Some(block) => inject(&turns, &block),
        None => turns,
    };

    info!(
        session_id = %session_id,
        turn_count = turns.len(),
        match_count = matches.len(),
        "step: chat completion"
    );

    let reply = match delta_tx {
        Some(tx) => {
            let tx = tx.clone();
            let mut on_chunk = move |chunk: StreamChunk| -> Pin<Box<dyn Future<Output = anyhow::Result<()>> + Send>> {
                let tx = tx.clone();
                Box::pin(async move {
                    tx.send(ChatEvent::Delta {
                        content: chunk.content,
                    })
                    .await
                    .map_err(|_| anyhow::anyhow!("client disconnected"))
                })
            };
            state
                .llm
                .complete_stream(turns, &mut on_chunk)
                .await
                .map_err(TurnError::Completion)?
        }
        None => state
            .llm
            .complete(turns)
            .await
            .map_err(TurnError::Completion)?,
    };

    let reply = reply.trim().to_string();
    if reply.is_empty() {
        warn!(session_id = %session_id, "completion produced no usable text");
        return Err(TurnError::EmptyReply);
    }

    let record = MessageRecord::new(session_id, MessageRole::Assistant, reply.clone());
    state
        .messages
        .save(&record)
        .await
        .map_err(TurnError::Persist)?;

    // Best-effort recency bump for the session list.
    if let Err(e) = state.sessions.touch(session_id).await {
        warn!(session_id = %session_id, error = %e, "failed to touch session");
    }

    Ok(TurnOutcome {
        reply,
        knowledge: matches.iter().map(KnowledgeSummary::from_match).collect(),
    })
}
