//! Knowledge retriever: query embedding plus similarity matching with a
//! descending ladder of thresholds.
//!
//! External interactions: EmbeddingService (query vector) and KnowledgeStore
//! (similarity matching).

use std::sync::Arc;

use embedding::EmbeddingService;
use knowledge::{KnowledgeMatch, KnowledgeStore};
use tracing::{debug, info, warn};

/// Default maximum number of matches per query.
pub const DEFAULT_MATCH_COUNT: usize = 6;

/// Default primary similarity threshold.
pub const DEFAULT_SIMILARITY_THRESHOLD: f32 = 0.65;

/// Default fallback thresholds tried when the primary yields nothing.
pub const DEFAULT_FALLBACK_THRESHOLDS: &[f32] = &[0.45];

/// Per-request retrieval options.
#[derive(Debug, Clone, Copy)]
pub struct RetrieveOptions {
    /// Maximum number of matches returned.
    pub match_count: usize,
    /// Primary (strictest) similarity threshold.
    pub similarity_threshold: f32,
}

impl Default for RetrieveOptions {
    fn default() -> Self {
        Self {
            match_count: DEFAULT_MATCH_COUNT,
            similarity_threshold: DEFAULT_SIMILARITY_THRESHOLD,
        }
    }
}

/// Embeds a query and matches knowledge chunks, degrading through fallback
/// thresholds instead of returning nothing at the first miss.
pub struct KnowledgeRetriever {
    embedding_service: Arc<dyn EmbeddingService>,
    store: Arc<dyn KnowledgeStore>,
    /// Fallback thresholds; only those strictly below the primary threshold
    /// are tried, in descending order.
    fallback_thresholds: Vec<f32>,
}

impl KnowledgeRetriever {
    pub fn new(embedding_service: Arc<dyn EmbeddingService>, store: Arc<dyn KnowledgeStore>) -> Self {
        Self {
            embedding_service,
            store,
            fallback_thresholds: DEFAULT_FALLBACK_THRESHOLDS.to_vec(),
        }
    }

    /// Replaces the fallback threshold ladder.
    pub fn with_fallback_thresholds(mut self, thresholds: Vec<f32>) -> Self {
        self.fallback_thresholds = thresholds;
        self
    }

    /// Retrieves up to `options.match_count` matches for `text`.
    ///
    /// Blank text returns an empty result without calling the embedding
    /// service. An embedding failure propagates to the caller; a store
    /// failure at one threshold is logged and treated as zero matches at
    /// that threshold so the remaining ladder is still tried.
    pub async fn retrieve(
        &self,
        text: &str,
        options: &RetrieveOptions,
    ) -> Result<Vec<KnowledgeMatch>, anyhow::Error> {
        let query_text = text.trim();
        if query_text.is_empty() {
            debug!("retrieve: blank query, skipping embedding call");
            return Ok(Vec::new());
        }

        info!(query_len = query_text.len(), "step: retrieval embed query");
        let query_embedding = self.embedding_service.embed(query_text).await?;

        for threshold in self.candidate_thresholds(options.similarity_threshold) {
            match self
                .store
                .match_chunks(&query_embedding, options.match_count, threshold)
                .await
            {
                Ok(matches) if !matches.is_empty() => {
                    info!(
                        threshold = threshold,
                        count = matches.len(),
                        "step: retrieval matched"
                    );
                    return Ok(matches);
                }
                Ok(_) => {
                    debug!(threshold = threshold, "retrieve: no matches at threshold");
                }
                Err(e) => {
                    warn!(
                        threshold = threshold,
                        error = %e,
                        "retrieve: match_chunks failed, treating as empty at this threshold"
                    );
                }
            }
        }

        info!("step: retrieval exhausted thresholds with no matches");
        Ok(Vec::new())
    }

    /// Primary threshold followed by the configured fallbacks that are
    /// strictly looser, in descending order.
    fn candidate_thresholds(&self, primary: f32) -> Vec<f32> {
        let mut thresholds = vec![primary];
        let mut fallbacks: Vec<f32> = self
            .fallback_thresholds
            .iter()
            .copied()
            .filter(|t| *t < primary)
            .collect();
        fallbacks.sort_by(|a, b| b.partial_cmp(a).unwrap_or(std::cmp::Ordering::Equal));
        thresholds.extend(fallbacks);
        thresholds
    }
}
