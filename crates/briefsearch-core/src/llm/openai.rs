//! OpenAI-compatible Chat Completions client (Groq by default).
//!
//! Maps [`Message`] values to request messages and [`ToolSpec`] declarations
//! to function tools; tool calls in the response come back as [`ToolCall`]
//! values with JSON-object arguments. Any endpoint speaking the Chat
//! Completions dialect works via the configured API base.

use anyhow::{Context as _, anyhow};
use async_openai::{
    Client,
    config::OpenAIConfig,
    types::chat::{
        ChatCompletionMessageToolCalls, ChatCompletionRequestMessage,
        ChatCompletionRequestSystemMessage, ChatCompletionRequestUserMessage, ChatCompletionTool,
        ChatCompletionTools, CreateChatCompletionRequestArgs, FunctionObject,
    },
};
use async_trait::async_trait;
use tracing::debug;

use crate::config::{LlmConfig, require_env};
use crate::error::BriefSearchError;
use crate::state::{Message, ToolCall};

use super::{ChatModel, ChatResponse, ToolSpec};

pub struct OpenAiChat {
    client: Client<OpenAIConfig>,
    model: String,
}

impl OpenAiChat {
    pub fn new(config: OpenAIConfig, model: impl Into<String>) -> Self {
        Self {
            client: Client::with_config(config),
            model: model.into(),
        }
    }

    /// Build the client from `[llm]` configuration; the API key is resolved
    /// from the configured environment variable.
    pub fn from_config(cfg: &LlmConfig) -> Result<Self, BriefSearchError> {
        let api_key = require_env(&cfg.api_key_env)?;
        let mut openai_config = OpenAIConfig::new().with_api_key(api_key.expose());
        if let Some(base) = cfg.resolved_api_base() {
            openai_config = openai_config.with_api_base(base);
        }
        Ok(Self::new(openai_config, cfg.model.clone()))
    }

    fn request_messages(messages: &[Message]) -> Vec<ChatCompletionRequestMessage> {
        messages
            .iter()
            .map(|message| match message {
                Message::System { content } => ChatCompletionRequestMessage::System(
                    ChatCompletionRequestSystemMessage::from(content.as_str()),
                ),
                Message::Human { content } => ChatCompletionRequestMessage::User(
                    ChatCompletionRequestUserMessage::from(content.as_str()),
                ),
                Message::Assistant { content, .. } => {
                    ChatCompletionRequestMessage::Assistant(content.as_str().into())
                }
            })
            .collect()
    }
}

#[async_trait]
impl ChatModel for OpenAiChat {
    async fn complete(
        &self,
        messages: &[Message],
        tools: &[ToolSpec],
    ) -> anyhow::Result<ChatResponse> {
        let mut args = CreateChatCompletionRequestArgs::default();
        args.model(self.model.clone());
        args.messages(Self::request_messages(messages));

        if !tools.is_empty() {
            let chat_tools: Vec<ChatCompletionTools> = tools
                .iter()
                .map(|tool| {
                    ChatCompletionTools::Function(ChatCompletionTool {
                        function: FunctionObject {
                            name: tool.name.clone(),
                            description: Some(tool.description.clone()),
                            parameters: Some(tool.parameters.clone()),
                            ..Default::default()
                        },
                    })
                })
                .collect();
            args.tools(chat_tools);
        }

        let request = args
            .build()
            .map_err(|err| anyhow!("chat request build failed: {err}"))?;

        debug!(
            model = %self.model,
            message_count = messages.len(),
            tools_count = tools.len(),
            "chat completion request"
        );

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|err| anyhow!("chat completion failed: {err}"))?;

        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| anyhow!("chat completion returned no choices"))?;

        let message = choice.message;
        let content = message.content.unwrap_or_default();

        let mut tool_calls = Vec::new();
        for call in message.tool_calls.unwrap_or_default() {
            if let ChatCompletionMessageToolCalls::Function(call) = call {
                let arguments: serde_json::Value = serde_json::from_str(&call.function.arguments)
                    .with_context(|| {
                    format!(
                        "tool call `{}` carried malformed arguments",
                        call.function.name
                    )
                })?;
                tool_calls.push(ToolCall {
                    name: call.function.name,
                    arguments,
                    id: Some(call.id),
                });
            }
        }

        Ok(ChatResponse {
            content,
            tool_calls,
        })
    }
}
