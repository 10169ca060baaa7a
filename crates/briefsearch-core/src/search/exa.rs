//! Exa search client.
//!
//! POSTs to the Exa `/search` endpoint with text contents requested, and maps
//! each hit to a [`SearchResult`]. The endpoint is configurable so tests or
//! alternative gateways can substitute.

use anyhow::anyhow;
use async_trait::async_trait;
use serde_json::json;
use tracing::debug;

use crate::config::{SearchConfig, SecretValue, require_env};
use crate::error::BriefSearchError;

use super::{SearchProvider, SearchResult};

const DEFAULT_ENDPOINT: &str = "https://api.exa.ai/search";
const SNIPPET_MAX_CHARS: u64 = 400;

pub struct ExaSearch {
    client: reqwest::Client,
    endpoint: String,
    api_key: SecretValue,
    num_results: usize,
}

impl ExaSearch {
    pub fn new(api_key: SecretValue, endpoint: impl Into<String>, num_results: usize) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.into(),
            api_key,
            num_results,
        }
    }

    /// Build the client from `[search]` configuration; the API key is
    /// resolved from the configured environment variable.
    pub fn from_config(cfg: &SearchConfig) -> Result<Self, BriefSearchError> {
        let api_key = require_env(&cfg.api_key_env)?;
        let endpoint = cfg
            .endpoint
            .clone()
            .unwrap_or_else(|| DEFAULT_ENDPOINT.to_string());
        Ok(Self::new(api_key, endpoint, cfg.num_results))
    }
}

#[async_trait]
impl SearchProvider for ExaSearch {
    async fn search(&self, query: &str) -> anyhow::Result<Vec<SearchResult>> {
        let body = json!({
            "query": query,
            "numResults": self.num_results,
            "contents": { "text": { "maxCharacters": SNIPPET_MAX_CHARS } },
        });

        let response = self
            .client
            .post(&self.endpoint)
            .header("x-api-key", self.api_key.expose())
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|err| anyhow!("search request failed: {err}"))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow!("search API error {status}: {body}"));
        }

        let payload: serde_json::Value = response
            .json()
            .await
            .map_err(|err| anyhow!("search response decode failed: {err}"))?;

        let hits = payload
            .get("results")
            .and_then(|results| results.as_array())
            .map(|results| results.as_slice())
            .unwrap_or(&[]);

        let results: Vec<SearchResult> = hits
            .iter()
            .map(|hit| {
                let snippet = hit
                    .get("text")
                    .and_then(|value| value.as_str())
                    .or_else(|| hit.get("summary").and_then(|value| value.as_str()))
                    .unwrap_or_default();
                SearchResult {
                    title: hit
                        .get("title")
                        .and_then(|value| value.as_str())
                        .unwrap_or_default()
                        .to_string(),
                    url: hit
                        .get("url")
                        .and_then(|value| value.as_str())
                        .unwrap_or_default()
                        .to_string(),
                    snippet: snippet.trim().replace('\n', " "),
                }
            })
            .collect();

        debug!(query, hits = results.len(), "search completed");

        Ok(results)
    }
}
