//! # Prompt
//!
//! Model-facing chat message types and the fixed system instructions used by
//! the counseling service.
//!
//! ## Contents
//!
//! - [`ChatMessage`] / [`MessageRole`] – one-to-one with one element of the
//!   Chat Completions `messages` array.
//! - [`COUNSELOR_SYSTEM_PROMPT`] – persona and style instruction prepended to
//!   every conversation.
//! - [`RESPONSE_FORMAT_INSTRUCTION`] – output formatting constraints.
//!
//! ## External interactions
//!
//! - **AI models**: these types are converted into LLM API messages by the
//!   llm-client crate.

/// Role of a message, one-to-one with OpenAI Chat Completions API `role` values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageRole {
    /// System instruction (API `role: "system"`).
    System,
    /// User message (API `role: "user"`).
    User,
    /// Assistant message (API `role: "assistant"`).
    Assistant,
}

/// A single chat message, one-to-one with one element of the `messages` array.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatMessage {
    pub role: MessageRole,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: content.into(),
        }
    }
}

/// Persona instruction for the counselor: tone, stance, and boundaries.
/// Prepended as the first system turn of every conversation.
pub const COUNSELOR_SYSTEM_PROMPT: &str = "\
あなたは恋愛・人生・人間関係の相談に寄り添うカウンセラーです。\
相談者の気持ちを受け止め、評価や説教をせず、安心して話せる雰囲気を保ってください。\
まず共感を示し、必要に応じて一つだけ質問を返し、助言は相談者の言葉を踏まえて控えめに提案します。\
医療・法律など専門的な判断が必要な内容には、専門家への相談を勧めてください。\
回答は日本語で、3〜6文程度にまとめます。";

/// Output formatting constraints appended to the persona when the transport
/// renders plain text.
pub const RESPONSE_FORMAT_INSTRUCTION: &str = "\
MarkdownやHTMLなどの装飾記号は使わず、プレーンテキストのみで回答してください。\
箇条書きが必要なときは「・」を使います。";

/// Builds the combined persona system content (persona + format instruction).
pub fn counselor_system_content() -> String {
    format!(
        "{}\n\n{}",
        COUNSELOR_SYSTEM_PROMPT, RESPONSE_FORMAT_INSTRUCTION
    )
}
