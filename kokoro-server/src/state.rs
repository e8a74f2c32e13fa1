//! Application state shared across all route handlers.
//!
//! Everything a request needs (repositories, the knowledge retriever, the
//! LLM client) is constructed once at startup and passed here explicitly.
//! There are no lazily initialized module globals.

use std::sync::Arc;

use knowledge::SqliteKnowledgeStore;
use llm_client::{LlmClient, OpenAILlmClient};
use openai_client::ChatOptions;
use openai_embedding::OpenAIEmbedding;
use retrieval::KnowledgeRetriever;
use storage::{MessageRepository, SessionRepository, SqlitePoolManager, UserRepository};

use crate::config::ServerConfig;

/// Sampling temperature for counseling replies.
const CHAT_TEMPERATURE: f32 = 0.4;
/// Completion token cap per reply.
const CHAT_MAX_TOKENS: u32 = 600;

/// Shared application state. All fields are cheap to clone across handler
/// tasks; the clients hold only static credentials, no per-request state.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ServerConfig>,
    pub users: UserRepository,
    pub sessions: SessionRepository,
    pub messages: MessageRepository,
    pub retriever: Arc<KnowledgeRetriever>,
    pub llm: Arc<dyn LlmClient>,
}

impl AppState {
    /// Direct dependency injection, used by tests to substitute mocks.
    pub fn new(
        config: ServerConfig,
        users: UserRepository,
        sessions: SessionRepository,
        messages: MessageRepository,
        retriever: Arc<KnowledgeRetriever>,
        llm: Arc<dyn LlmClient>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            users,
            sessions,
            messages,
            retriever,
            llm,
        }
    }

    /// Builds the production wiring: one SQLite pool shared by the
    /// repositories and the knowledge store, OpenAI embedding and chat
    /// clients from the config.
    pub async fn from_config(config: ServerConfig) -> anyhow::Result<Self> {
        let pool_manager = SqlitePoolManager::new(&config.database_url).await?;

        let users = UserRepository::new(pool_manager.clone());
        let sessions = SessionRepository::new(pool_manager.clone());
        let messages = MessageRepository::new(pool_manager.clone());
        users.init().await?;
        sessions.init().await?;
        messages.init().await?;

        let knowledge_store =
            SqliteKnowledgeStore::with_pool(pool_manager.pool().clone()).await?;

        let embedding_service = OpenAIEmbedding::new_with_base_url(
            config.openai_api_key.clone(),
            config.embedding_model.clone(),
            config.openai_base_url.as_deref(),
        );

        let retriever = KnowledgeRetriever::new(
            Arc::new(embedding_service),
            Arc::new(knowledge_store),
        );

        let llm = match &config.openai_base_url {
            Some(url) => OpenAILlmClient::with_base_url(config.openai_api_key.clone(), url.clone()),
            None => OpenAILlmClient::new(config.openai_api_key.clone()),
        }
        .with_model(config.chat_model.clone())
        .with_options(ChatOptions {
            temperature: Some(CHAT_TEMPERATURE),
            max_tokens: Some(CHAT_MAX_TOKENS),
        });

        Ok(Self {
            config: Arc::new(config),
            users,
            sessions,
            messages,
            retriever: Arc::new(retriever),
            llm: Arc::new(llm),
        })
    }
}
