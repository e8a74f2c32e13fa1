//! OpenAI implementation of [`LlmClient`]: wraps openai-client and converts
//! prompt messages to API messages as given.

use anyhow::Result;
use async_trait::async_trait;
use openai_client::{ChatOptions, StreamChunk as OpenAIStreamChunk};
use prompt::ChatMessage;
use tracing::instrument;

use super::{chat_message_to_openai, LlmClient, StreamChunk, StreamChunkCallback};

/// LlmClient backed by openai-client.
#[derive(Clone)]
pub struct OpenAILlmClient {
    client: openai_client::OpenAIClient,
    model: String,
}

impl OpenAILlmClient {
    pub fn new(api_key: String) -> Self {
        Self {
            client: openai_client::OpenAIClient::new(api_key),
            model: "gpt-4o".to_string(),
        }
    }

    pub fn with_base_url(api_key: String, base_url: String) -> Self {
        Self {
            client: openai_client::OpenAIClient::with_base_url(api_key, base_url),
            model: "gpt-4o".to_string(),
        }
    }

    pub fn with_model(mut self, model: String) -> Self {
        self.model = model;
        self
    }

    /// Sets sampling/length options on the underlying client.
    pub fn with_options(mut self, options: ChatOptions) -> Self {
        self.client = self.client.with_options(options);
        self
    }

    fn to_openai_messages(
        messages: &[ChatMessage],
    ) -> Result<Vec<openai_client::ChatCompletionRequestMessage>> {
        messages.iter().map(chat_message_to_openai).collect()
    }
}

#[async_trait]
impl LlmClient for OpenAILlmClient {
    #[instrument(skip(self, messages))]
    async fn complete(&self, messages: Vec<ChatMessage>) -> Result<String> {
        let openai_messages = Self::to_openai_messages(&messages)?;
        self.client
            .chat_completion(&self.model, openai_messages)
            .await
    }

    #[instrument(skip(self, messages, callback))]
    async fn complete_stream(
        &self,
        messages: Vec<ChatMessage>,
        callback: &mut StreamChunkCallback,
    ) -> Result<String> {
        let openai_messages = Self::to_openai_messages(&messages)?;
        self.client
            .chat_completion_stream(&self.model, openai_messages, |chunk: OpenAIStreamChunk| {
                callback(StreamChunk {
                    content: chunk.content,
                    done: chunk.done,
                })
            })
            .await
    }
}
