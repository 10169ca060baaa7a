//! Scripted chat model for tests and offline runs.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use anyhow::anyhow;
use async_trait::async_trait;

use crate::state::Message;

use super::{ChatModel, ChatResponse, ToolSpec};

/// Deterministic [`ChatModel`]: returns queued responses in order, one per
/// `complete` call, and counts how often it was invoked. Running past the end
/// of the script is an error, so tests notice unexpected extra calls.
pub struct ScriptedChat {
    script: Mutex<VecDeque<ChatResponse>>,
    calls: AtomicUsize,
}

impl ScriptedChat {
    pub fn new(responses: impl IntoIterator<Item = ChatResponse>) -> Self {
        Self {
            script: Mutex::new(responses.into_iter().collect()),
            calls: AtomicUsize::new(0),
        }
    }

    /// Number of `complete` calls made so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ChatModel for ScriptedChat {
    async fn complete(
        &self,
        _messages: &[Message],
        _tools: &[ToolSpec],
    ) -> anyhow::Result<ChatResponse> {
        let served = self.calls.fetch_add(1, Ordering::SeqCst);
        let next = self
            .script
            .lock()
            .expect("script mutex poisoned")
            .pop_front();
        next.ok_or_else(|| anyhow!("scripted chat exhausted after {served} responses"))
    }
}
