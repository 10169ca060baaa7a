//! Linear task pipeline over a shared conversation state.
//!
//! Control flow is static: every task runs exactly once, in insertion order.
//! A task never mutates the state directly; it returns a [`StateUpdate`] that
//! the pipeline merges via [`ConversationState::apply`] before the next task
//! starts. The first failing task aborts the invocation.

use std::sync::Arc;

use anyhow::Context as _;
use async_trait::async_trait;
use tracing::debug;

use crate::state::{ConversationState, StateUpdate};

/// One stage of the pipeline: reads the accumulated state, returns a partial
/// update.
#[async_trait]
pub trait Task: Send + Sync {
    /// Stable identifier used in logs and error context.
    fn id(&self) -> &str;

    async fn run(&self, state: &ConversationState) -> anyhow::Result<StateUpdate>;
}

/// Builder for a [`Pipeline`]; tasks execute in insertion order.
pub struct PipelineBuilder {
    name: String,
    tasks: Vec<Arc<dyn Task>>,
}

impl PipelineBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            tasks: Vec::new(),
        }
    }

    pub fn add_task(mut self, task: Arc<dyn Task>) -> Self {
        self.tasks.push(task);
        self
    }

    pub fn build(self) -> Pipeline {
        Pipeline {
            name: self.name,
            tasks: self.tasks,
        }
    }
}

/// A fixed sequence of tasks threading one [`ConversationState`].
pub struct Pipeline {
    name: String,
    tasks: Vec<Arc<dyn Task>>,
}

impl Pipeline {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Runs every task once, in order, merging each update before the next
    /// task sees the state. There is no retry, skip or re-entry; a task
    /// failure propagates to the caller with the task id attached.
    pub async fn invoke(
        &self,
        initial: ConversationState,
    ) -> anyhow::Result<ConversationState> {
        let mut state = initial;
        for task in &self.tasks {
            debug!(
                pipeline = %self.name,
                task = task.id(),
                messages = state.messages.len(),
                "running task"
            );
            let update = task
                .run(&state)
                .await
                .with_context(|| format!("task `{}` failed", task.id()))?;
            state = state.apply(update);
        }
        Ok(state)
    }
}
