//! The three pipeline tasks: researcher, writer, collector.

use std::sync::Arc;

use anyhow::{Context as _, anyhow};
use async_trait::async_trait;
use tracing::{debug, info, instrument};

use crate::llm::{ChatModel, ToolSpec};
use crate::pipeline::Task;
use crate::search::{SearchProvider, render_results};
use crate::state::{ConversationState, Message, StateUpdate};

/// Tool name the researcher declares to the model.
pub const SEARCH_TOOL_NAME: &str = "search_web";

/// Answer recorded when the conversation holds no messages at collection time.
pub const NO_ANSWER: &str = "No answer produced.";

const RESEARCHER_INSTRUCTION: &str = "You are a research assistant. \
    You must use the search_web tool to find fresh and relevant information before answering. \
    Do not answer based on your internal knowledge alone.";

const WRITER_INSTRUCTION: &str =
    "You are a technical writer. Create a concise summary of the findings.";

fn search_tool_spec() -> ToolSpec {
    ToolSpec {
        name: SEARCH_TOOL_NAME.to_string(),
        description: "Search the web for information. Returns relevant results with titles, \
                      URLs, and snippets."
            .to_string(),
        parameters: serde_json::json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "The search query"
                }
            },
            "required": ["query"]
        }),
    }
}

fn with_instruction(instruction: &str, messages: &[Message]) -> Vec<Message> {
    let mut request = Vec::with_capacity(messages.len() + 1);
    request.push(Message::system(instruction));
    request.extend_from_slice(messages);
    request
}

/// Asks the model to answer with the `search_web` tool declared, executes
/// each requested search exactly once in call order, and appends the rendered
/// output as one synthetic human message.
pub struct ResearcherTask {
    model: Arc<dyn ChatModel>,
    search: Arc<dyn SearchProvider>,
}

impl ResearcherTask {
    pub fn new(model: Arc<dyn ChatModel>, search: Arc<dyn SearchProvider>) -> Self {
        Self { model, search }
    }
}

#[async_trait]
impl Task for ResearcherTask {
    fn id(&self) -> &str {
        "researcher"
    }

    #[instrument(name = "task.researcher", skip(self, state))]
    async fn run(&self, state: &ConversationState) -> anyhow::Result<StateUpdate> {
        let request = with_instruction(RESEARCHER_INSTRUCTION, &state.messages);
        let response = self.model.complete(&request, &[search_tool_spec()]).await?;

        let mut outputs = Vec::new();
        for call in &response.tool_calls {
            if call.name != SEARCH_TOOL_NAME {
                debug!(tool = %call.name, "ignoring unknown tool call");
                continue;
            }
            let query = call
                .arguments
                .get("query")
                .and_then(|value| value.as_str())
                .ok_or_else(|| anyhow!("search_web call missing string `query` argument"))?;

            info!(%query, "executing web search");
            let results = self
                .search
                .search(query)
                .await
                .with_context(|| format!("web search for \"{query}\" failed"))?;
            outputs.push(render_results(&results));
        }

        let searches = outputs.len();
        let mut messages = vec![Message::assistant_with_calls(
            response.content,
            response.tool_calls,
        )];
        if !outputs.is_empty() {
            messages.push(Message::human(outputs.join("\n\n")));
        }

        info!(searches, appended = messages.len(), "researcher completed");

        Ok(StateUpdate {
            messages,
            next_agent: Some("writer".to_string()),
            final_answer: None,
        })
    }
}

/// Condenses the whole conversation into one summary message.
pub struct WriterTask {
    model: Arc<dyn ChatModel>,
}

impl WriterTask {
    pub fn new(model: Arc<dyn ChatModel>) -> Self {
        Self { model }
    }
}

#[async_trait]
impl Task for WriterTask {
    fn id(&self) -> &str {
        "writer"
    }

    #[instrument(name = "task.writer", skip(self, state))]
    async fn run(&self, state: &ConversationState) -> anyhow::Result<StateUpdate> {
        let request = with_instruction(WRITER_INSTRUCTION, &state.messages);
        let response = self.model.complete(&request, &[]).await?;

        info!(chars = response.content.len(), "writer produced summary");

        Ok(StateUpdate {
            messages: vec![Message::assistant(response.content)],
            ..StateUpdate::default()
        })
    }
}

/// Lifts the last message's text into `final_answer`.
///
/// The collector is the sole writer of `final_answer`; it always runs last,
/// so a task inserted after the writer cannot leave a stale answer behind.
#[derive(Default)]
pub struct CollectTask;

#[async_trait]
impl Task for CollectTask {
    fn id(&self) -> &str {
        "collect"
    }

    #[instrument(name = "task.collect", skip(self, state))]
    async fn run(&self, state: &ConversationState) -> anyhow::Result<StateUpdate> {
        let answer = match state.messages.last() {
            Some(message) => message.content().to_string(),
            None => NO_ANSWER.to_string(),
        };

        debug!(chars = answer.len(), "collected final answer");

        Ok(StateUpdate {
            final_answer: Some(answer),
            ..StateUpdate::default()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::{ChatResponse, ScriptedChat};
    use crate::search::{CannedSearch, SearchResult};
    use crate::state::ToolCall;
    use std::sync::Mutex;

    fn search_call(query: &str) -> ToolCall {
        ToolCall {
            name: SEARCH_TOOL_NAME.to_string(),
            arguments: serde_json::json!({ "query": query }),
            id: None,
        }
    }

    /// Echoes the query back as a single result, recording call order.
    struct EchoSearch {
        queries: Mutex<Vec<String>>,
    }

    impl EchoSearch {
        fn new() -> Self {
            Self {
                queries: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl SearchProvider for EchoSearch {
        async fn search(&self, query: &str) -> anyhow::Result<Vec<SearchResult>> {
            self.queries.lock().expect("queries mutex").push(query.to_string());
            Ok(vec![SearchResult {
                title: query.to_string(),
                url: format!("https://example.com/{query}"),
                snippet: format!("About {query}"),
            }])
        }
    }

    #[tokio::test]
    async fn researcher_without_tool_calls_appends_one_message() {
        let chat = Arc::new(ScriptedChat::new([ChatResponse {
            content: "answer from memory".to_string(),
            tool_calls: Vec::new(),
        }]));
        let search = Arc::new(CannedSearch::new(Vec::new()));
        let task = ResearcherTask::new(chat, search.clone());

        let update = task
            .run(&ConversationState::from_query("q"))
            .await
            .expect("researcher should succeed");

        assert_eq!(update.messages.len(), 1);
        assert_eq!(update.messages[0].content(), "answer from memory");
        assert_eq!(update.next_agent.as_deref(), Some("writer"));
        assert!(update.final_answer.is_none());
        assert_eq!(search.calls(), 0);
    }

    #[tokio::test]
    async fn researcher_executes_each_search_call_in_order() {
        let chat = Arc::new(ScriptedChat::new([ChatResponse {
            content: String::new(),
            tool_calls: vec![search_call("alpha"), search_call("beta")],
        }]));
        let search = Arc::new(EchoSearch::new());
        let task = ResearcherTask::new(chat, search.clone());

        let update = task
            .run(&ConversationState::from_query("q"))
            .await
            .expect("researcher should succeed");

        assert_eq!(
            *search.queries.lock().expect("queries mutex"),
            vec!["alpha".to_string(), "beta".to_string()]
        );
        assert_eq!(update.messages.len(), 2);
        assert_eq!(update.messages[0].tool_calls().len(), 2);
        assert_eq!(
            update.messages[1].content(),
            "Title: alpha\nURL: https://example.com/alpha\nSummary: About alpha\n\
             \n\n\
             Title: beta\nURL: https://example.com/beta\nSummary: About beta\n"
        );
    }

    #[tokio::test]
    async fn researcher_renders_single_result_exactly() {
        let chat = Arc::new(ScriptedChat::new([ChatResponse {
            content: String::new(),
            tool_calls: vec![search_call("X")],
        }]));
        let search = Arc::new(CannedSearch::new(vec![SearchResult {
            title: "T".to_string(),
            url: "U".to_string(),
            snippet: "S".to_string(),
        }]));
        let task = ResearcherTask::new(chat, search.clone());

        let update = task
            .run(&ConversationState::from_query("q"))
            .await
            .expect("researcher should succeed");

        assert_eq!(search.calls(), 1);
        assert_eq!(update.messages.len(), 2);
        assert_eq!(update.messages[1].content(), "Title: T\nURL: U\nSummary: S\n");
    }

    #[tokio::test]
    async fn researcher_ignores_foreign_tool_calls() {
        let chat = Arc::new(ScriptedChat::new([ChatResponse {
            content: "no search needed".to_string(),
            tool_calls: vec![ToolCall {
                name: "get_time".to_string(),
                arguments: serde_json::json!({}),
                id: None,
            }],
        }]));
        let search = Arc::new(CannedSearch::new(Vec::new()));
        let task = ResearcherTask::new(chat, search.clone());

        let update = task
            .run(&ConversationState::from_query("q"))
            .await
            .expect("researcher should succeed");

        assert_eq!(update.messages.len(), 1);
        assert_eq!(search.calls(), 0);
    }

    #[tokio::test]
    async fn researcher_rejects_tool_call_without_query() {
        let chat = Arc::new(ScriptedChat::new([ChatResponse {
            content: String::new(),
            tool_calls: vec![ToolCall {
                name: SEARCH_TOOL_NAME.to_string(),
                arguments: serde_json::json!({ "q": "wrong key" }),
                id: None,
            }],
        }]));
        let search = Arc::new(CannedSearch::new(Vec::new()));
        let task = ResearcherTask::new(chat, search);

        let err = task
            .run(&ConversationState::from_query("q"))
            .await
            .expect_err("missing query must fail");

        assert!(err.to_string().contains("query"), "{err}");
    }

    #[tokio::test]
    async fn writer_appends_summary_without_touching_final_answer() {
        let chat = Arc::new(ScriptedChat::new([ChatResponse {
            content: "the summary".to_string(),
            tool_calls: Vec::new(),
        }]));
        let task = WriterTask::new(chat);

        let update = task
            .run(&ConversationState::from_query("q"))
            .await
            .expect("writer should succeed");

        assert_eq!(update.messages.len(), 1);
        assert_eq!(update.messages[0].content(), "the summary");
        assert!(update.final_answer.is_none());
        assert!(update.next_agent.is_none());
    }

    #[tokio::test]
    async fn collector_takes_last_message_text() {
        let state = ConversationState {
            messages: vec![
                Message::human("q"),
                Message::assistant("draft"),
                Message::assistant("final text"),
            ],
            ..ConversationState::default()
        };

        let update = CollectTask
            .run(&state)
            .await
            .expect("collector should succeed");

        assert_eq!(update.final_answer.as_deref(), Some("final text"));
        assert!(update.messages.is_empty());
    }

    #[tokio::test]
    async fn collector_uses_sentinel_for_empty_conversation() {
        let update = CollectTask
            .run(&ConversationState::default())
            .await
            .expect("collector should succeed");

        assert_eq!(update.final_answer.as_deref(), Some(NO_ANSWER));
    }
}
