//! Chat stream event protocol: one JSON object per event.
//!
//! Emission order on success: `meta` (session id) → `delta`* → `meta`
//! (knowledge, only when matches were retrieved) → `done`. On failure the
//! stream ends with a single `error` event instead of `done`.

use knowledge::KnowledgeMatch;
use serde::Serialize;

/// Preview length (in characters) of knowledge content in the meta event.
const PREVIEW_CHARS: usize = 80;

/// One event on the chat stream.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ChatEvent {
    Meta {
        #[serde(rename = "sessionId")]
        session_id: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        knowledge: Option<Vec<KnowledgeSummary>>,
    },
    Delta {
        content: String,
    },
    Done,
    Error {
        message: String,
    },
}

impl ChatEvent {
    pub fn meta(session_id: &str) -> Self {
        ChatEvent::Meta {
            session_id: session_id.to_string(),
            knowledge: None,
        }
    }

    pub fn meta_with_knowledge(session_id: &str, knowledge: Vec<KnowledgeSummary>) -> Self {
        ChatEvent::Meta {
            session_id: session_id.to_string(),
            knowledge: Some(knowledge),
        }
    }
}

/// Client-facing summary of one retrieved knowledge match.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KnowledgeSummary {
    pub id: String,
    pub similarity: f32,
    pub preview: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

impl KnowledgeSummary {
    pub fn from_match(m: &KnowledgeMatch) -> Self {
        let trimmed = m.content.trim();
        let preview = if trimmed.chars().count() > PREVIEW_CHARS {
            let cut: String = trimmed.chars().take(PREVIEW_CHARS).collect();
            format!("{}…", cut)
        } else {
            trimmed.to_string()
        };

        Self {
            id: m.id.to_string(),
            similarity: m.similarity,
            preview,
            source: m.source().map(|s| s.to_string()),
        }
    }
}
