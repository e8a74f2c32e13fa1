//! Knowledge store interface.

use async_trait::async_trait;
use uuid::Uuid;

use crate::types::{KnowledgeChunk, KnowledgeMatch};

/// Trait for storing knowledge chunks and matching them by embedding
/// similarity.
#[async_trait]
pub trait KnowledgeStore: Send + Sync {
    /// Adds a new chunk to the store.
    async fn add(&self, chunk: KnowledgeChunk) -> Result<(), anyhow::Error>;

    /// Retrieves a chunk by id. Returns `None` if not found.
    async fn get(&self, id: Uuid) -> Result<Option<KnowledgeChunk>, anyhow::Error>;

    /// Returns the number of stored chunks.
    async fn count(&self) -> Result<usize, anyhow::Error>;

    /// Returns up to `match_count` chunks whose cosine similarity to
    /// `query_embedding` is at least `similarity_threshold`, best first.
    async fn match_chunks(
        &self,
        query_embedding: &[f32],
        match_count: usize,
        similarity_threshold: f32,
    ) -> Result<Vec<KnowledgeMatch>, anyhow::Error>;
}

/// Calculates cosine similarity between two vectors.
pub(crate) fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot_product / (norm_a * norm_b)
}

/// Scores, filters by threshold, sorts best-first, and truncates to
/// `match_count`. Shared by the store implementations.
pub(crate) fn rank_matches(
    chunks: impl IntoIterator<Item = KnowledgeChunk>,
    query_embedding: &[f32],
    match_count: usize,
    similarity_threshold: f32,
) -> Vec<KnowledgeMatch> {
    let mut scored: Vec<KnowledgeMatch> = chunks
        .into_iter()
        .filter_map(|chunk| {
            let embedding = chunk.embedding.as_ref()?;
            let similarity = cosine_similarity(query_embedding, embedding);
            if similarity >= similarity_threshold {
                Some(KnowledgeMatch {
                    id: chunk.id,
                    content: chunk.content,
                    metadata: chunk.metadata,
                    similarity,
                })
            } else {
                None
            }
        })
        .collect();

    scored.sort_by(|a, b| {
        b.similarity
            .partial_cmp(&a.similarity)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    scored.truncate(match_count);
    scored
}
