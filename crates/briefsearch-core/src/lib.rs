//! BriefSearch core: a two-agent web research pipeline.
//!
//! A researcher task asks the chat model to answer with a declared
//! `search_web` tool and executes the searches it requests; a writer task
//! condenses the conversation into a summary; a collector lifts the final
//! text out of the last message. A linear pipeline threads one
//! [`ConversationState`] through the three tasks, merging each task's
//! partial update with an explicit reducer.

mod config;
mod error;
mod llm;
mod logging;
mod pipeline;
mod search;
mod state;
mod tasks;
mod workflow;

pub use config::{
    Config, ConfigLoader, LlmConfig, LoggingConfig, SearchConfig, SecretValue, require_env,
};
pub use error::BriefSearchError;
pub use llm::{ChatModel, ChatResponse, OpenAiChat, ScriptedChat, ToolSpec};
pub use logging::{SessionLogInput, log_session_completion};
pub use pipeline::{Pipeline, PipelineBuilder, Task};
pub use search::{CannedSearch, ExaSearch, SearchProvider, SearchResult, render_results};
pub use state::{ConversationState, Message, StateUpdate, ToolCall};
pub use tasks::{CollectTask, NO_ANSWER, ResearcherTask, SEARCH_TOOL_NAME, WriterTask};
pub use workflow::{
    BasePipelineTasks, PipelineCustomizer, SessionOptions, SessionOutcome, run_research_session,
    run_research_session_with_options,
};
