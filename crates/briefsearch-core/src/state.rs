//! Conversation state threaded through the research pipeline.
//!
//! Tasks receive the accumulated [`ConversationState`] and return a
//! [`StateUpdate`]; the pipeline merges each update via
//! [`ConversationState::apply`] before the next task runs. The merge policy
//! is fixed: `messages` are appended, scalar fields are overwritten when the
//! update carries a value for them.

use serde::{Deserialize, Serialize};

/// A single tool invocation requested by the model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCall {
    /// Tool name as declared to the model (e.g. `search_web`).
    pub name: String,
    /// Arguments as a JSON object.
    pub arguments: serde_json::Value,
    /// Provider-assigned call id, when available.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

/// One message in the conversation.
///
/// Tool output is not a separate role: the researcher appends search results
/// as a synthetic `Human` message carrying the concatenated tool text.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Message {
    System {
        content: String,
    },
    Human {
        content: String,
    },
    Assistant {
        content: String,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        tool_calls: Vec<ToolCall>,
    },
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self::System {
            content: content.into(),
        }
    }

    pub fn human(content: impl Into<String>) -> Self {
        Self::Human {
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::Assistant {
            content: content.into(),
            tool_calls: Vec::new(),
        }
    }

    pub fn assistant_with_calls(content: impl Into<String>, tool_calls: Vec<ToolCall>) -> Self {
        Self::Assistant {
            content: content.into(),
            tool_calls,
        }
    }

    /// Textual content of the message, regardless of role.
    pub fn content(&self) -> &str {
        match self {
            Self::System { content } | Self::Human { content } => content,
            Self::Assistant { content, .. } => content,
        }
    }

    /// Tool calls carried by an assistant message; empty for other roles.
    pub fn tool_calls(&self) -> &[ToolCall] {
        match self {
            Self::Assistant { tool_calls, .. } => tool_calls,
            _ => &[],
        }
    }
}

/// The single mutable value threaded through the pipeline.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConversationState {
    /// Chronological record of the conversation; only ever appended to.
    #[serde(default)]
    pub messages: Vec<Message>,
    /// Advisory label for the task that should conceptually run next. The
    /// pipeline's routing is static and does not read this field.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_agent: Option<String>,
    /// Final answer, present once the collector has run.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub final_answer: Option<String>,
}

impl ConversationState {
    /// State for a fresh session: one human message carrying the query.
    pub fn from_query(query: impl Into<String>) -> Self {
        Self {
            messages: vec![Message::human(query)],
            ..Self::default()
        }
    }

    /// Merges a partial update: `messages` append, scalars overwrite when the
    /// update carries them.
    pub fn apply(mut self, update: StateUpdate) -> Self {
        self.messages.extend(update.messages);
        if let Some(next_agent) = update.next_agent {
            self.next_agent = Some(next_agent);
        }
        if let Some(final_answer) = update.final_answer {
            self.final_answer = Some(final_answer);
        }
        self
    }
}

/// Partial update returned by one pipeline task; only the fields a task
/// changed are populated.
#[derive(Debug, Clone, Default)]
pub struct StateUpdate {
    pub messages: Vec<Message>,
    pub next_agent: Option<String>,
    pub final_answer: Option<String>,
}
