//! Language-model capability boundary.
//!
//! Tasks depend on [`ChatModel`] only; the concrete client ([`OpenAiChat`])
//! and the deterministic mock ([`ScriptedChat`]) are interchangeable behind
//! it. Retries, rate limiting and authentication are the implementation's
//! business, never the pipeline's.

mod mock;
mod openai;

pub use mock::ScriptedChat;
pub use openai::OpenAiChat;

use async_trait::async_trait;
use serde_json::Value;

use crate::state::{Message, ToolCall};

/// Declaration of a tool the model may request during a completion.
#[derive(Debug, Clone)]
pub struct ToolSpec {
    pub name: String,
    pub description: String,
    /// JSON Schema for the arguments object.
    pub parameters: Value,
}

/// One model completion: assistant text plus any requested tool calls.
#[derive(Debug, Clone, Default)]
pub struct ChatResponse {
    pub content: String,
    pub tool_calls: Vec<ToolCall>,
}

/// Chat-completion capability: ordered messages in, one assistant reply out.
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Completes the conversation. `tools` may be empty; when it is not, the
    /// model may answer with tool calls instead of (or alongside) text.
    async fn complete(
        &self,
        messages: &[Message],
        tools: &[ToolSpec],
    ) -> anyhow::Result<ChatResponse>;
}
