//! Configuration loading and secret handling.
//!
//! Secrets never live in the config file: `[llm]` and `[search]` name the
//! environment variable holding the key, and [`require_env`] resolves it when
//! the concrete capability is constructed. Stub capabilities therefore run
//! without any secrets present.

use std::{
    env, fmt, fs,
    path::{Path, PathBuf},
};

use serde::Deserialize;

use crate::error::BriefSearchError;

const DEFAULT_CONFIG_PATH: &str = "config.toml";
const CONFIG_PATH_ENV: &str = "BRIEFSEARCH_CONFIG";

/// Wrapper around sensitive values to reduce accidental logging.
#[derive(Clone)]
pub struct SecretValue(String);

impl SecretValue {
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for SecretValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "***redacted***")
    }
}

/// Require that a given environment variable is set and non-empty.
pub fn require_env(var: &str) -> Result<SecretValue, BriefSearchError> {
    match env::var(var) {
        Ok(value) if !value.trim().is_empty() => Ok(SecretValue(value)),
        _ => Err(BriefSearchError::MissingSecret(var.to_string())),
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub llm: LlmConfig,
    pub search: SearchConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Provider label; selects the default API base when `api_base` is unset.
    pub provider: String,
    pub model: String,
    /// Environment variable holding the API key.
    pub api_key_env: String,
    /// Explicit chat-completions base URL override.
    pub api_base: Option<String>,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: "groq".to_string(),
            model: "llama-3.1-8b-instant".to_string(),
            api_key_env: "GROQ_API_KEY".to_string(),
            api_base: None,
        }
    }
}

impl LlmConfig {
    /// Base URL for the chat endpoint: explicit override first, then the
    /// provider default. `None` leaves the client's built-in default.
    pub fn resolved_api_base(&self) -> Option<String> {
        if let Some(base) = &self.api_base {
            return Some(base.clone());
        }
        match self.provider.as_str() {
            "groq" => Some("https://api.groq.com/openai/v1".to_string()),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Environment variable holding the search API key.
    pub api_key_env: String,
    /// Search endpoint override, e.g. for a local test server.
    pub endpoint: Option<String>,
    /// Number of results requested per query.
    pub num_results: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            api_key_env: "EXA_API_KEY".to_string(),
            endpoint: None,
            num_results: 5,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default tracing filter when `RUST_LOG` is unset.
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// Helper to load configuration with best-practice guard rails.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from a provided path or discoverable defaults.
    ///
    /// Resolution order:
    /// 1. Explicit `path` argument.
    /// 2. `BRIEFSEARCH_CONFIG` environment variable.
    /// 3. `config.toml` in the current working directory; when that file does
    ///    not exist, built-in defaults apply.
    ///
    /// A path named explicitly (argument or environment) must exist.
    pub fn load(path: Option<PathBuf>) -> Result<Config, BriefSearchError> {
        let (candidate, explicit) = resolve_path(path);
        if !explicit && !candidate.exists() {
            return Ok(Config::default());
        }

        let raw = fs::read_to_string(&candidate)
            .map_err(|err| BriefSearchError::config_io(candidate.clone(), err))?;
        let config: Config = toml::from_str(&raw)
            .map_err(|err| BriefSearchError::InvalidConfiguration(err.to_string()))?;

        Self::validate(&config)?;
        Ok(config)
    }

    fn validate(config: &Config) -> Result<(), BriefSearchError> {
        if config.llm.api_key_env.trim().is_empty() {
            return Err(BriefSearchError::InvalidConfiguration(
                "llm.api_key_env must reference an environment variable".into(),
            ));
        }
        if config.llm.model.trim().is_empty() {
            return Err(BriefSearchError::InvalidConfiguration(
                "llm.model must not be empty".into(),
            ));
        }
        if config.search.api_key_env.trim().is_empty() {
            return Err(BriefSearchError::InvalidConfiguration(
                "search.api_key_env must reference an environment variable".into(),
            ));
        }
        Ok(())
    }
}

fn resolve_path(path: Option<PathBuf>) -> (PathBuf, bool) {
    if let Some(path) = path {
        return (path, true);
    }

    if let Ok(from_env) = env::var(CONFIG_PATH_ENV) {
        if !from_env.trim().is_empty() {
            return (PathBuf::from(from_env), true);
        }
    }

    (Path::new(DEFAULT_CONFIG_PATH).to_path_buf(), false)
}
