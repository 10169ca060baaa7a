use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use briefsearch_core::{
    CannedSearch, ChatResponse, ConfigLoader, SEARCH_TOOL_NAME, ScriptedChat, SessionOptions,
    ToolCall, run_research_session_with_options,
};
use clap::{Args, Parser, Subcommand};
use tokio::runtime::Runtime;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "briefsearch-cli", version, about = "Two-agent web research pipeline")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run one research query through the pipeline and print the answer.
    Run(RunArgs),
}

#[derive(Args, Debug)]
struct RunArgs {
    /// Query to research.
    #[arg(
        long,
        default_value = "Find the latest research on multi-agent orchestration frameworks."
    )]
    query: String,

    /// Optional session ID recorded in the session log.
    #[arg(long)]
    session: Option<String>,

    /// Path to a config file (defaults to ./config.toml when present).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Run with built-in stub capabilities instead of live endpoints.
    #[arg(long)]
    offline: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let Command::Run(ref args) = cli.command;
    let config = ConfigLoader::load(args.config.clone())?;

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "{level},briefsearch_core={level}",
            level = config.logging.level
        ))
    });

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .init();

    let rt = Runtime::new()?;
    rt.block_on(async move {
        match cli.command {
            Command::Run(args) => run_command(args).await?,
        }
        Ok::<(), anyhow::Error>(())
    })?;

    Ok(())
}

async fn run_command(args: RunArgs) -> Result<()> {
    let mut options = SessionOptions::new(&args.query);

    if let Some(session) = args.session.clone() {
        options = options.with_session_id(session);
    }
    if let Some(config) = args.config.clone() {
        options = options.with_config_path(config);
    }

    if args.offline {
        options = options
            .with_model(Arc::new(offline_chat_script(&args.query)))
            .with_search(Arc::new(CannedSearch::placeholder()));
    }

    let outcome = run_research_session_with_options(options).await?;

    info!(session_id = %outcome.session_id, messages = outcome.messages.len(), "session complete");

    println!("{}", outcome.final_answer);

    Ok(())
}

/// Canned two-turn script: one search request, then a fixed summary. Lets the
/// whole pipeline run end-to-end without any live endpoint.
fn offline_chat_script(query: &str) -> ScriptedChat {
    ScriptedChat::new([
        ChatResponse {
            content: String::new(),
            tool_calls: vec![ToolCall {
                name: SEARCH_TOOL_NAME.to_string(),
                arguments: serde_json::json!({ "query": query }),
                id: None,
            }],
        },
        ChatResponse {
            content: format!(
                "Offline stub summary for \"{query}\". Point the CLI at live endpoints for real research."
            ),
            tool_calls: Vec::new(),
        },
    ])
}
