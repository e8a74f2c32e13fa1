//! Shared test harness: mock LLM and embedding services, app state wiring,
//! request helpers, and SSE body parsing.
#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, Response, StatusCode};
use axum::Router;
use serde_json::Value;
use tempfile::TempDir;
use tower::util::ServiceExt;

use knowledge::{InMemoryKnowledgeStore, KnowledgeChunk, KnowledgeStore};
use kokoro_server::routes::create_router;
use kokoro_server::{AppState, ServerConfig};
use llm_client::{LlmClient, StreamChunk, StreamChunkCallback};
use prompt::ChatMessage;
use retrieval::KnowledgeRetriever;
use storage::{MessageRepository, SessionRepository, SqlitePoolManager, UserRepository};

pub const USER_A: &str = "11111111-1111-1111-1111-111111111111";
pub const USER_B: &str = "22222222-2222-2222-2222-222222222222";

/// Embedding that always returns the unit vector [1, 0].
pub struct FixedEmbedding;

#[async_trait]
impl embedding::EmbeddingService for FixedEmbedding {
    async fn embed(&self, _text: &str) -> Result<Vec<f32>, anyhow::Error> {
        Ok(vec![1.0, 0.0])
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, anyhow::Error> {
        Ok(texts.iter().map(|_| vec![1.0, 0.0]).collect())
    }
}

/// Scripted LLM: plays back fixed chunks (or fails), capturing the messages
/// it was called with.
pub struct MockLlm {
    chunks: Vec<String>,
    fail: bool,
    pub captured: Mutex<Vec<ChatMessage>>,
}

impl MockLlm {
    pub fn with_chunks(chunks: &[&str]) -> Self {
        Self {
            chunks: chunks.iter().map(|c| c.to_string()).collect(),
            fail: false,
            captured: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            chunks: Vec::new(),
            fail: true,
            captured: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl LlmClient for MockLlm {
    async fn complete(&self, messages: Vec<ChatMessage>) -> anyhow::Result<String> {
        *self.captured.lock().unwrap() = messages;
        if self.fail {
            anyhow::bail!("model unavailable");
        }
        Ok(self.chunks.concat())
    }

    async fn complete_stream(
        &self,
        messages: Vec<ChatMessage>,
        callback: &mut StreamChunkCallback,
    ) -> anyhow::Result<String> {
        *self.captured.lock().unwrap() = messages;
        if self.fail {
            anyhow::bail!("model unavailable");
        }
        let mut full = String::new();
        let count = self.chunks.len();
        for (i, chunk) in self.chunks.iter().enumerate() {
            full.push_str(chunk);
            callback(StreamChunk {
                content: chunk.clone(),
                done: i + 1 == count,
            })
            .await?;
        }
        Ok(full)
    }
}

/// Builds an app around the given LLM and knowledge chunks. The returned
/// TempDir owns the database file and must stay alive for the test.
pub async fn test_app(
    llm: Arc<dyn LlmClient>,
    chunks: Vec<KnowledgeChunk>,
    demo_mode: bool,
) -> (Router, AppState, TempDir) {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let db_path = dir.path().join("kokoro-test.db");
    let pool = SqlitePoolManager::new(db_path.to_str().unwrap())
        .await
        .expect("Failed to create pool");

    let users = UserRepository::new(pool.clone());
    let sessions = SessionRepository::new(pool.clone());
    let messages = MessageRepository::new(pool);
    users.init().await.unwrap();
    sessions.init().await.unwrap();
    messages.init().await.unwrap();

    let store = InMemoryKnowledgeStore::new();
    for chunk in chunks {
        store.add(chunk).await.unwrap();
    }

    let retriever = KnowledgeRetriever::new(Arc::new(FixedEmbedding), Arc::new(store));

    let mut config = ServerConfig::for_database(db_path.to_str().unwrap());
    config.demo_mode = demo_mode;

    let state = AppState::new(
        config,
        users,
        sessions,
        messages,
        Arc::new(retriever),
        llm,
    );

    (create_router(state.clone()), state, dir)
}

/// A knowledge chunk whose embedding matches [`FixedEmbedding`] exactly.
pub fn matching_chunk(content: &str, source: Option<&str>) -> KnowledgeChunk {
    let metadata = source.map(|s| serde_json::json!({ "source": s }));
    KnowledgeChunk::new(content.to_string(), metadata).with_embedding(vec![1.0, 0.0])
}

/// Sends a request with an optional identity header and JSON body.
pub async fn send(
    router: &Router,
    method: &str,
    uri: &str,
    user: Option<&str>,
    body: Option<Value>,
) -> Response<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(user_id) = user {
        builder = builder.header("x-user-id", user_id);
    }
    let request = match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    router.clone().oneshot(request).await.unwrap()
}

/// Reads the full response body as a string (the SSE stream has ended by the
/// time this returns).
pub async fn body_text(response: Response<Body>) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

/// Reads the body as JSON.
pub async fn body_json(response: Response<Body>) -> Value {
    let text = body_text(response).await;
    serde_json::from_str(&text).unwrap_or(Value::Null)
}

/// Parses the `data:` payloads out of an SSE body, in emission order.
pub fn sse_events(body: &str) -> Vec<Value> {
    body.lines()
        .filter_map(|line| line.strip_prefix("data: "))
        .filter(|payload| !payload.trim().is_empty())
        .map(|payload| serde_json::from_str(payload).expect("SSE payload should be JSON"))
        .collect()
}

/// Concatenates the contents of all delta events.
pub fn delta_text(events: &[Value]) -> String {
    events
        .iter()
        .filter(|e| e["type"] == "delta")
        .map(|e| e["content"].as_str().unwrap_or_default())
        .collect()
}

/// Convenience assertion helpers.
pub fn assert_status(response: &Response<Body>, expected: StatusCode) {
    assert_eq!(response.status(), expected);
}
