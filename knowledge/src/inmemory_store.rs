//! In-memory knowledge store for tests and development.
//!
//! Data is lost on restart. Same matching semantics as the SQLite store.

use std::collections::HashMap;
use std::sync::RwLock;

use uuid::Uuid;

use crate::store::{rank_matches, KnowledgeStore};
use crate::types::{KnowledgeChunk, KnowledgeMatch};

/// Simple in-memory store guarded by an RwLock.
#[derive(Default)]
pub struct InMemoryKnowledgeStore {
    chunks: RwLock<HashMap<Uuid, KnowledgeChunk>>,
}

impl InMemoryKnowledgeStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl KnowledgeStore for InMemoryKnowledgeStore {
    async fn add(&self, chunk: KnowledgeChunk) -> Result<(), anyhow::Error> {
        let mut chunks = self
            .chunks
            .write()
            .map_err(|e| anyhow::anyhow!("lock poisoned: {}", e))?;
        chunks.insert(chunk.id, chunk);
        Ok(())
    }

    async fn get(&self, id: Uuid) -> Result<Option<KnowledgeChunk>, anyhow::Error> {
        let chunks = self
            .chunks
            .read()
            .map_err(|e| anyhow::anyhow!("lock poisoned: {}", e))?;
        Ok(chunks.get(&id).cloned())
    }

    async fn count(&self) -> Result<usize, anyhow::Error> {
        let chunks = self
            .chunks
            .read()
            .map_err(|e| anyhow::anyhow!("lock poisoned: {}", e))?;
        Ok(chunks.len())
    }

    async fn match_chunks(
        &self,
        query_embedding: &[f32],
        match_count: usize,
        similarity_threshold: f32,
    ) -> Result<Vec<KnowledgeMatch>, anyhow::Error> {
        let chunks = self
            .chunks
            .read()
            .map_err(|e| anyhow::anyhow!("lock poisoned: {}", e))?;
        Ok(rank_matches(
            chunks.values().cloned(),
            query_embedding,
            match_count,
            similarity_threshold,
        ))
    }
}
