//! Server configuration loaded once from environment variables.

use kokoro_core::{KokoroError, Result};
use std::env;

/// Default identity used when demo mode substitutes for a missing login.
pub const DEFAULT_DEMO_USER_ID: &str = "00000000-0000-0000-0000-000000000000";
pub const DEFAULT_DEMO_USER_EMAIL: &str = "demo@kokoro.app";

/// Process-wide configuration. Built once in `main` and shared through
/// [`crate::state::AppState`].
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Listen port (KOKORO_PORT).
    pub port: u16,
    /// SQLite database path (DATABASE_URL).
    pub database_url: String,
    /// OpenAI API key (OPENAI_API_KEY), required.
    pub openai_api_key: String,
    /// Optional OpenAI-compatible base URL (OPENAI_BASE_URL).
    pub openai_base_url: Option<String>,
    /// Chat completion model (CHAT_MODEL).
    pub chat_model: String,
    /// Embedding model (EMBEDDING_MODEL).
    pub embedding_model: String,
    /// Demo identity fallback (ENABLE_DEMO_MODE, on unless set to "false").
    pub demo_mode: bool,
    /// Synthetic demo user (DEMO_USER_ID / DEMO_USER_EMAIL).
    pub demo_user_id: String,
    pub demo_user_email: String,
    /// Optional log file tee (LOG_FILE).
    pub log_file: Option<String>,
}

impl ServerConfig {
    /// Loads configuration from environment variables. OPENAI_API_KEY is
    /// required; everything else has a default.
    pub fn from_env() -> Result<Self> {
        let port = env::var("KOKORO_PORT")
            .ok()
            .map(|p| p.parse::<u16>())
            .transpose()
            .map_err(|e| KokoroError::Config(format!("Invalid KOKORO_PORT: {}", e)))?
            .unwrap_or(8787);

        let database_url = env::var("DATABASE_URL").unwrap_or_else(|_| "kokoro.db".to_string());

        let openai_api_key = env::var("OPENAI_API_KEY")
            .map_err(|_| KokoroError::Config("OPENAI_API_KEY is not set".to_string()))?;
        let openai_base_url = env::var("OPENAI_BASE_URL")
            .ok()
            .filter(|s| !s.trim().is_empty());

        let chat_model = env::var("CHAT_MODEL").unwrap_or_else(|_| "gpt-4o".to_string());
        let embedding_model = env::var("EMBEDDING_MODEL")
            .unwrap_or_else(|_| "text-embedding-3-small".to_string());

        let demo_mode = env::var("ENABLE_DEMO_MODE")
            .map(|v| !v.trim().eq_ignore_ascii_case("false"))
            .unwrap_or(true);
        let demo_user_id =
            env::var("DEMO_USER_ID").unwrap_or_else(|_| DEFAULT_DEMO_USER_ID.to_string());
        let demo_user_email =
            env::var("DEMO_USER_EMAIL").unwrap_or_else(|_| DEFAULT_DEMO_USER_EMAIL.to_string());

        let log_file = env::var("LOG_FILE").ok();

        Ok(Self {
            port,
            database_url,
            openai_api_key,
            openai_base_url,
            chat_model,
            embedding_model,
            demo_mode,
            demo_user_id,
            demo_user_email,
            log_file,
        })
    }

    /// A config for tests and embedded use: no API key, demo mode on.
    pub fn for_database(database_url: impl Into<String>) -> Self {
        Self {
            port: 0,
            database_url: database_url.into(),
            openai_api_key: String::new(),
            openai_base_url: None,
            chat_model: "gpt-4o".to_string(),
            embedding_model: "text-embedding-3-small".to_string(),
            demo_mode: true,
            demo_user_id: DEFAULT_DEMO_USER_ID.to_string(),
            demo_user_email: DEFAULT_DEMO_USER_EMAIL.to_string(),
            log_file: None,
        }
    }
}
