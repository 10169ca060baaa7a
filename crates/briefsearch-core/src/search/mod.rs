//! Web search capability boundary.

mod exa;

pub use exa::ExaSearch;

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// One ranked search hit. None of the fields are guaranteed non-empty.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchResult {
    pub title: String,
    pub url: String,
    pub snippet: String,
}

/// Free-text web search: query in, ranked results out. Stateless; calls are
/// live network actions and are never deduplicated or cached here.
#[async_trait]
pub trait SearchProvider: Send + Sync {
    async fn search(&self, query: &str) -> anyhow::Result<Vec<SearchResult>>;
}

/// Renders results as one text block per hit, blocks separated by a blank
/// line. This is the exact text the researcher feeds back to the model.
pub fn render_results(results: &[SearchResult]) -> String {
    results
        .iter()
        .map(|result| {
            format!(
                "Title: {}\nURL: {}\nSummary: {}\n",
                result.title, result.url, result.snippet
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Fixed-result [`SearchProvider`] for tests and offline runs; counts
/// invocations so callers can assert how often the pipeline searched.
pub struct CannedSearch {
    results: Vec<SearchResult>,
    calls: AtomicUsize,
}

impl CannedSearch {
    pub fn new(results: Vec<SearchResult>) -> Self {
        Self {
            results,
            calls: AtomicUsize::new(0),
        }
    }

    /// Plausible generic results so the pipeline can run without network.
    pub fn placeholder() -> Self {
        Self::new(vec![
            SearchResult {
                title: "Example result".to_string(),
                url: "https://example.com/".to_string(),
                snippet: "Stub search hit returned by the offline capability.".to_string(),
            },
            SearchResult {
                title: "Second example result".to_string(),
                url: "https://example.org/".to_string(),
                snippet: "Another stub hit; live runs replace these with real results.".to_string(),
            },
        ])
    }

    /// Number of `search` calls made so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SearchProvider for CannedSearch {
    async fn search(&self, _query: &str) -> anyhow::Result<Vec<SearchResult>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.results.clone())
    }
}
