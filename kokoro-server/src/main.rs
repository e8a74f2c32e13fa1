//! Server entry point: load .env, build the process-wide state once, serve.

use kokoro_server::routes::start_server;
use kokoro_server::{AppState, ServerConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = ServerConfig::from_env()?;
    kokoro_core::init_tracing(config.log_file.as_deref())?;

    tracing::info!(
        port = config.port,
        database_url = %config.database_url,
        chat_model = %config.chat_model,
        embedding_model = %config.embedding_model,
        demo_mode = config.demo_mode,
        "kokoro-server starting"
    );

    let state = AppState::from_config(config).await?;
    start_server(state).await
}
