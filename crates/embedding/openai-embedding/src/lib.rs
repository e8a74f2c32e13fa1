//! # OpenAI Embedding Service
//!
//! Implementation of the `EmbeddingService` trait using OpenAI's embedding API.
//!
//! Uses OpenAI's embedding models (e.g., `text-embedding-3-small`,
//! `text-embedding-3-large`). Requests can be pointed at any
//! OpenAI-compatible endpoint via a base URL override.
//!
//! ## Example
//!
//! ```rust,no_run
//! use openai_embedding::OpenAIEmbedding;
//! use embedding::EmbeddingService;
//!
//! fn create_service() -> OpenAIEmbedding {
//!     OpenAIEmbedding::new("sk-...".to_string(), "text-embedding-3-small".to_string())
//! }
//!
//! async fn example(service: &OpenAIEmbedding) -> Result<(), anyhow::Error> {
//!     let embedding = service.embed("こんにちは").await?;
//!     println!("Embedding dimension: {}", embedding.len());
//!     Ok(())
//! }
//! ```

use async_openai::{types::CreateEmbeddingRequestArgs, Client};
use async_trait::async_trait;
use embedding::EmbeddingService;
use tracing::{debug, info, instrument, warn};

/// Per-request timeout (connect + request + response).
const EMBED_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(30);

/// OpenAI embedding service implementation. Holds the async-openai client and model name.
#[derive(Debug, Clone)]
pub struct OpenAIEmbedding {
    /// OpenAI client used for embeddings API calls.
    client: Client<async_openai::config::OpenAIConfig>,
    /// Embedding model name (e.g. "text-embedding-3-small").
    model: String,
}

impl OpenAIEmbedding {
    /// Creates a new OpenAI embedding service with the default API base URL.
    pub fn new(api_key: String, model: String) -> Self {
        Self::new_with_base_url(api_key, model, None)
    }

    /// Creates a new OpenAI embedding service with an optional base URL
    /// (e.g. for OpenAI-compatible endpoints).
    pub fn new_with_base_url(api_key: String, model: String, base_url: Option<&str>) -> Self {
        let mut openai_config = async_openai::config::OpenAIConfig::new().with_api_key(api_key);
        if let Some(url) = base_url.filter(|s| !s.is_empty()) {
            openai_config = openai_config.with_api_base(url);
        }
        let client = Client::with_config(openai_config);

        Self { client, model }
    }

    /// Sets a different embedding model.
    pub fn with_model(mut self, model: String) -> Self {
        self.model = model;
        self
    }

    /// Returns the embedding model name (for tests and diagnostics).
    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl EmbeddingService for OpenAIEmbedding {
    /// Generates an embedding vector for a single text string.
    ///
    /// # Errors
    ///
    /// Returns an error if the API key is invalid, the request fails or times
    /// out, or the response carries no embedding data.
    #[instrument(skip(self, text), fields(model = %self.model, text_len = text.len()))]
    async fn embed(&self, text: &str) -> Result<Vec<f32>, anyhow::Error> {
        info!(
            model = %self.model,
            text_len = text.len(),
            "step: embedding OpenAI embed request"
        );

        let request = CreateEmbeddingRequestArgs::default()
            .model(self.model.clone())
            .input(vec![text])
            .build()?;

        let embeddings = self.client.embeddings();
        let create_future = embeddings.create(request);
        let response = match tokio::time::timeout(EMBED_TIMEOUT, create_future).await {
            Ok(Ok(r)) => {
                debug!("OpenAI embed response received");
                r
            }
            Ok(Err(e)) => {
                warn!(error = %e, "OpenAI embed request failed");
                return Err(e.into());
            }
            Err(_) => {
                warn!(
                    timeout_secs = EMBED_TIMEOUT.as_secs(),
                    "OpenAI embed request timed out"
                );
                return Err(anyhow::anyhow!(
                    "OpenAI embed request timed out after {} seconds",
                    EMBED_TIMEOUT.as_secs()
                ));
            }
        };

        let embedding = match response.data.first() {
            Some(item) => item.embedding.clone(),
            None => {
                warn!("OpenAI embed response has no embedding data");
                return Err(anyhow::anyhow!("No embedding in response"));
            }
        };

        info!(
            dimension = embedding.len(),
            "step: embedding OpenAI embed done"
        );
        Ok(embedding)
    }

    /// Generates embedding vectors for multiple texts in one API call.
    ///
    /// One batch request consumes a single rate-limit token and is cheaper
    /// than per-text requests; the OpenAI API accepts up to 2048 inputs.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the response does not carry
    /// one embedding per input text.
    #[instrument(skip(self, texts), fields(model = %self.model, batch = texts.len()))]
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, anyhow::Error> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let request = CreateEmbeddingRequestArgs::default()
            .model(self.model.clone())
            .input(texts.to_vec())
            .build()?;

        let embeddings = self.client.embeddings();
        let create_future = embeddings.create(request);
        let response = match tokio::time::timeout(EMBED_TIMEOUT, create_future).await {
            Ok(Ok(r)) => r,
            Ok(Err(e)) => {
                warn!(error = %e, batch = texts.len(), "OpenAI embed_batch request failed");
                return Err(e.into());
            }
            Err(_) => {
                return Err(anyhow::anyhow!(
                    "OpenAI embed_batch request timed out after {} seconds",
                    EMBED_TIMEOUT.as_secs()
                ));
            }
        };

        if response.data.len() != texts.len() {
            return Err(anyhow::anyhow!(
                "Expected {} embeddings, got {}",
                texts.len(),
                response.data.len()
            ));
        }

        let mut vectors: Vec<(u32, Vec<f32>)> = response
            .data
            .into_iter()
            .map(|item| (item.index, item.embedding))
            .collect();
        // The API documents response order as input order, but sort by index
        // to be safe.
        vectors.sort_by_key(|(index, _)| *index);

        Ok(vectors.into_iter().map(|(_, v)| v).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_model_overrides_model() {
        let service = OpenAIEmbedding::new("sk-test".to_string(), "text-embedding-3-small".into())
            .with_model("text-embedding-3-large".to_string());
        assert_eq!(service.model(), "text-embedding-3-large");
    }

    #[tokio::test]
    async fn test_embed_batch_empty_is_noop() {
        let service =
            OpenAIEmbedding::new("sk-test".to_string(), "text-embedding-3-small".to_string());
        let result = service.embed_batch(&[]).await.unwrap();
        assert!(result.is_empty());
    }
}
