//! Session-level entry points wiring the default research pipeline.
//!
//! The default wiring is researcher → writer → collector. Callers can inject
//! capabilities (tests, offline runs) and append extra tasks through
//! [`PipelineCustomizer`]; the collector is always added last.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::Result;
use tracing::{info, warn};

use crate::config::ConfigLoader;
use crate::llm::{ChatModel, OpenAiChat};
use crate::logging::{SessionLogInput, log_session_completion};
use crate::pipeline::{Pipeline, PipelineBuilder};
use crate::search::{ExaSearch, SearchProvider};
use crate::state::{ConversationState, Message};
use crate::tasks::{CollectTask, NO_ANSWER, ResearcherTask, WriterTask};

/// The tasks of the default pipeline, exposed so callers can extend the
/// wiring.
#[derive(Clone)]
pub struct BasePipelineTasks {
    pub researcher: Arc<ResearcherTask>,
    pub writer: Arc<WriterTask>,
    pub collect: Arc<CollectTask>,
}

impl BasePipelineTasks {
    fn new(model: Arc<dyn ChatModel>, search: Arc<dyn SearchProvider>) -> Self {
        Self {
            researcher: Arc::new(ResearcherTask::new(model.clone(), search)),
            writer: Arc::new(WriterTask::new(model)),
            collect: Arc::new(CollectTask),
        }
    }
}

/// Customisation hook: receives the builder holding researcher and writer and
/// may append further tasks. The collector is added after the hook returns.
pub type PipelineCustomizer =
    dyn Fn(PipelineBuilder, &BasePipelineTasks) -> PipelineBuilder + Send + Sync;

fn build_pipeline(
    model: Arc<dyn ChatModel>,
    search: Arc<dyn SearchProvider>,
    customizer: Option<&PipelineCustomizer>,
) -> Pipeline {
    let tasks = BasePipelineTasks::new(model, search);

    let builder = PipelineBuilder::new("research_pipeline")
        .add_task(tasks.researcher.clone())
        .add_task(tasks.writer.clone());

    let builder = if let Some(customize) = customizer {
        customize(builder, &tasks)
    } else {
        builder
    };

    builder.add_task(tasks.collect.clone()).build()
}

fn new_session_id() -> String {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or(0);
    format!("session-{}", nanos)
}

/// Options for running a research session.
pub struct SessionOptions<'a> {
    pub query: &'a str,
    pub session_id: Option<String>,
    /// Injected chat capability; defaults to [`OpenAiChat`] from config.
    pub model: Option<Arc<dyn ChatModel>>,
    /// Injected search capability; defaults to [`ExaSearch`] from config.
    pub search: Option<Arc<dyn SearchProvider>>,
    pub customize_pipeline: Option<Box<PipelineCustomizer>>,
    pub config_path: Option<PathBuf>,
}

impl<'a> SessionOptions<'a> {
    pub fn new(query: &'a str) -> Self {
        Self {
            query,
            session_id: None,
            model: None,
            search: None,
            customize_pipeline: None,
            config_path: None,
        }
    }

    pub fn with_session_id(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }

    pub fn with_model(mut self, model: Arc<dyn ChatModel>) -> Self {
        self.model = Some(model);
        self
    }

    pub fn with_search(mut self, search: Arc<dyn SearchProvider>) -> Self {
        self.search = Some(search);
        self
    }

    pub fn with_customizer(mut self, customizer: Box<PipelineCustomizer>) -> Self {
        self.customize_pipeline = Some(customizer);
        self
    }

    pub fn with_config_path(mut self, path: PathBuf) -> Self {
        self.config_path = Some(path);
        self
    }
}

/// Outcome of one pipeline invocation.
#[derive(Debug, Clone)]
pub struct SessionOutcome {
    pub session_id: String,
    pub final_answer: String,
    pub messages: Vec<Message>,
}

/// Run the research pipeline end-to-end for the provided query using default
/// settings.
pub async fn run_research_session(query: &str) -> Result<String> {
    run_research_session_with_options(SessionOptions::new(query))
        .await
        .map(|outcome| outcome.final_answer)
}

/// Run the pipeline with custom options (session id, injected capabilities,
/// extra tasks).
pub async fn run_research_session_with_options(
    options: SessionOptions<'_>,
) -> Result<SessionOutcome> {
    let session_id = options
        .session_id
        .clone()
        .unwrap_or_else(new_session_id);

    let (model, search) = resolve_capabilities(&options)?;
    let pipeline = build_pipeline(model, search, options.customize_pipeline.as_deref());

    info!(%session_id, query = %options.query, "starting research session");

    let state = pipeline
        .invoke(ConversationState::from_query(options.query))
        .await?;

    let final_answer = state
        .final_answer
        .clone()
        .unwrap_or_else(|| NO_ANSWER.to_string());

    if let Err(err) = log_session_completion(SessionLogInput {
        session_id: session_id.clone(),
        query: Some(options.query.to_string()),
        answer: final_answer.clone(),
        message_count: state.messages.len(),
    }) {
        warn!(error = %err, "failed to record session log");
    }

    Ok(SessionOutcome {
        session_id,
        final_answer,
        messages: state.messages,
    })
}

fn resolve_capabilities(
    options: &SessionOptions<'_>,
) -> Result<(Arc<dyn ChatModel>, Arc<dyn SearchProvider>)> {
    if let (Some(model), Some(search)) = (&options.model, &options.search) {
        return Ok((model.clone(), search.clone()));
    }

    let config = ConfigLoader::load(options.config_path.clone())?;

    let model: Arc<dyn ChatModel> = match &options.model {
        Some(model) => model.clone(),
        None => Arc::new(OpenAiChat::from_config(&config.llm)?),
    };
    let search: Arc<dyn SearchProvider> = match &options.search {
        Some(search) => search.clone(),
        None => Arc::new(ExaSearch::from_config(&config.search)?),
    };

    Ok((model, search))
}
