use std::sync::{Arc, Once};

use async_trait::async_trait;
use briefsearch_core::{
    CannedSearch, ChatModel, ChatResponse, CollectTask, ConversationState, Message, NO_ANSWER,
    Pipeline, PipelineBuilder, ScriptedChat, SearchProvider, SearchResult, SessionOptions,
    StateUpdate, Task, ToolCall, run_research_session_with_options,
};

static LOG_DIR: Once = Once::new();

/// Session logs belong under a scratch directory while tests run.
fn isolate_session_logs() {
    LOG_DIR.call_once(|| {
        let dir = std::env::temp_dir().join("briefsearch-test-logs");
        unsafe { std::env::set_var("BRIEFSEARCH_LOG_DIR", &dir) };
    });
}

fn reply(content: &str) -> ChatResponse {
    ChatResponse {
        content: content.to_string(),
        tool_calls: Vec::new(),
    }
}

fn search_reply(query: &str) -> ChatResponse {
    ChatResponse {
        content: String::new(),
        tool_calls: vec![ToolCall {
            name: "search_web".to_string(),
            arguments: serde_json::json!({ "query": query }),
            id: None,
        }],
    }
}

#[tokio::test]
async fn answer_comes_from_the_writer() {
    isolate_session_logs();

    let chat = Arc::new(ScriptedChat::new([
        reply("4."),
        reply("The answer is 4."),
    ]));
    let search = Arc::new(CannedSearch::new(Vec::new()));

    let outcome = run_research_session_with_options(
        SessionOptions::new("What is 2+2?")
            .with_model(chat.clone())
            .with_search(search.clone()),
    )
    .await
    .expect("session should succeed");

    assert_eq!(outcome.final_answer, "The answer is 4.");
    assert_eq!(outcome.messages.len(), 3);
    assert_eq!(outcome.messages[0].content(), "What is 2+2?");
    assert_eq!(outcome.messages[1].content(), "4.");
    assert_eq!(outcome.messages[2].content(), "The answer is 4.");
    assert_eq!(chat.calls(), 2);
    assert_eq!(search.calls(), 0);
}

#[tokio::test]
async fn tool_use_feeds_search_output_back_into_the_conversation() {
    isolate_session_logs();

    let chat = Arc::new(ScriptedChat::new([
        search_reply("X"),
        reply("Summary of X."),
    ]));
    let search = Arc::new(CannedSearch::new(vec![SearchResult {
        title: "T".to_string(),
        url: "U".to_string(),
        snippet: "S".to_string(),
    }]));

    let outcome = run_research_session_with_options(
        SessionOptions::new("Tell me about X")
            .with_model(chat)
            .with_search(search.clone()),
    )
    .await
    .expect("session should succeed");

    assert_eq!(search.calls(), 1);
    // human query, assistant tool request, synthetic human tool output, summary
    assert_eq!(outcome.messages.len(), 4);
    assert_eq!(
        outcome.messages[2].content(),
        "Title: T\nURL: U\nSummary: S\n"
    );
    assert!(matches!(outcome.messages[2], Message::Human { .. }));
    assert_eq!(outcome.final_answer, "Summary of X.");
}

#[tokio::test]
async fn identical_scripts_yield_identical_answers() {
    isolate_session_logs();

    let mut answers = Vec::new();
    for _ in 0..2 {
        let chat = Arc::new(ScriptedChat::new([
            search_reply("rust agents"),
            reply("Deterministic summary."),
        ]));
        let search = Arc::new(CannedSearch::new(vec![SearchResult {
            title: "Doc".to_string(),
            url: "https://example.com/doc".to_string(),
            snippet: "snippet".to_string(),
        }]));

        let outcome = run_research_session_with_options(
            SessionOptions::new("What changed in agent frameworks?")
                .with_model(chat)
                .with_search(search),
        )
        .await
        .expect("session should succeed");

        answers.push((outcome.final_answer, outcome.messages.len()));
    }

    assert_eq!(answers[0], answers[1]);
}

#[tokio::test]
async fn collector_sentinel_when_nothing_was_said() {
    let pipeline: Pipeline = PipelineBuilder::new("collect_only")
        .add_task(Arc::new(CollectTask))
        .build();

    let state = pipeline
        .invoke(ConversationState::default())
        .await
        .expect("pipeline should succeed");

    assert_eq!(state.final_answer.as_deref(), Some(NO_ANSWER));
}

struct OfflineModel;

#[async_trait]
impl ChatModel for OfflineModel {
    async fn complete(
        &self,
        _messages: &[Message],
        _tools: &[briefsearch_core::ToolSpec],
    ) -> anyhow::Result<ChatResponse> {
        Err(anyhow::anyhow!("model endpoint unreachable"))
    }
}

#[tokio::test]
async fn model_failure_propagates_to_the_caller() {
    isolate_session_logs();

    let err = run_research_session_with_options(
        SessionOptions::new("anything")
            .with_model(Arc::new(OfflineModel))
            .with_search(Arc::new(CannedSearch::new(Vec::new()))),
    )
    .await
    .expect_err("session must fail");

    let rendered = format!("{err:#}");
    assert!(rendered.contains("task `researcher` failed"), "{rendered}");
    assert!(rendered.contains("model endpoint unreachable"), "{rendered}");
}

struct FailingSearch;

#[async_trait]
impl SearchProvider for FailingSearch {
    async fn search(&self, _query: &str) -> anyhow::Result<Vec<SearchResult>> {
        Err(anyhow::anyhow!("search endpoint unreachable"))
    }
}

#[tokio::test]
async fn search_failure_propagates_to_the_caller() {
    isolate_session_logs();

    let chat = Arc::new(ScriptedChat::new([search_reply("X")]));

    let err = run_research_session_with_options(
        SessionOptions::new("anything")
            .with_model(chat)
            .with_search(Arc::new(FailingSearch)),
    )
    .await
    .expect_err("session must fail");

    assert!(
        format!("{err:#}").contains("search endpoint unreachable"),
        "{err:#}"
    );
}

struct AddendumTask;

#[async_trait]
impl Task for AddendumTask {
    fn id(&self) -> &str {
        "addendum"
    }

    async fn run(&self, _state: &ConversationState) -> anyhow::Result<StateUpdate> {
        Ok(StateUpdate {
            messages: vec![Message::assistant("addendum text")],
            ..StateUpdate::default()
        })
    }
}

#[tokio::test]
async fn collector_stays_authoritative_after_inserted_tasks() {
    isolate_session_logs();

    let chat = Arc::new(ScriptedChat::new([
        reply("findings"),
        reply("writer summary"),
    ]));
    let search = Arc::new(CannedSearch::new(Vec::new()));

    let outcome = run_research_session_with_options(
        SessionOptions::new("query")
            .with_model(chat)
            .with_search(search)
            .with_customizer(Box::new(|builder, _tasks| {
                builder.add_task(Arc::new(AddendumTask))
            })),
    )
    .await
    .expect("session should succeed");

    // the task appended after the writer owns the last message, and the
    // collector derives the final answer from it
    assert_eq!(outcome.final_answer, "addendum text");
    assert_eq!(outcome.messages.len(), 4);
}
