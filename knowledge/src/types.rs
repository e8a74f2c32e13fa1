//! Knowledge chunk types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One stored reference text chunk with its embedding vector.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnowledgeChunk {
    /// Unique identifier.
    pub id: Uuid,
    /// The reference text.
    pub content: String,
    /// Vector embedding for similarity search.
    pub embedding: Option<Vec<f32>>,
    /// Free-form metadata; an optional "source" string labels provenance.
    pub metadata: Option<serde_json::Value>,
    /// When the chunk was ingested.
    pub created_at: DateTime<Utc>,
}

impl KnowledgeChunk {
    /// Creates a new chunk with a generated UUID and no embedding.
    pub fn new(content: String, metadata: Option<serde_json::Value>) -> Self {
        Self {
            id: Uuid::new_v4(),
            content,
            embedding: None,
            metadata,
            created_at: Utc::now(),
        }
    }

    /// Attaches the embedding vector.
    pub fn with_embedding(mut self, embedding: Vec<f32>) -> Self {
        self.embedding = Some(embedding);
        self
    }
}

/// One similarity match, produced per request. Never persisted.
#[derive(Debug, Clone, Serialize)]
pub struct KnowledgeMatch {
    pub id: Uuid,
    pub content: String,
    pub metadata: Option<serde_json::Value>,
    /// Similarity score in [0, 1] for the exact embedding queried.
    pub similarity: f32,
}

impl KnowledgeMatch {
    /// Returns the metadata "source" label when one is present.
    pub fn source(&self) -> Option<&str> {
        self.metadata
            .as_ref()
            .and_then(|m| m.get("source"))
            .and_then(|s| s.as_str())
    }
}
