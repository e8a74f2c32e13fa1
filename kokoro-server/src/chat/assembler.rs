//! Conversation assembler: bounded history mapped to model-facing turns with
//! the persona and state-guide system instructions prepended.

use kokoro_core::MessageRole;
use prompt::{counselor_system_content, ChatMessage};
use retrieval::build_guide;
use storage::{MessageRepository, StorageError};

/// Fixed bound on the number of history messages sent to the model.
pub const MAX_CONTEXT_MESSAGES: i64 = 30;

/// Loads the session's recent history (ascending) and maps it to model
/// turns. Stored assistant messages stay assistant turns; every other stored
/// role is normalized to a user turn. The persona system instruction always
/// leads; a state guide derived from the latest user text follows when the
/// heuristic produces one.
///
/// The inbound user message is persisted before history is read, so the
/// latest user turn is already part of the loaded history.
pub async fn assemble(
    messages: &MessageRepository,
    session_id: &str,
    latest_user_text: &str,
) -> Result<Vec<ChatMessage>, StorageError> {
    let history = messages
        .recent_for_session(session_id, MAX_CONTEXT_MESSAGES)
        .await?;

    let mut turns = Vec::with_capacity(history.len() + 2);
    turns.push(ChatMessage::system(counselor_system_content()));
    if let Some(guide) = build_guide(latest_user_text) {
        turns.push(ChatMessage::system(guide));
    }

    for record in &history {
        let turn = match record.role() {
            MessageRole::Assistant => ChatMessage::assistant(record.content.clone()),
            _ => ChatMessage::user(record.content.clone()),
        };
        turns.push(turn);
    }

    Ok(turns)
}
