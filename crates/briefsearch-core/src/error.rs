use std::path::PathBuf;

use thiserror::Error;

/// Core error type for BriefSearch.
///
/// Capability and task failures travel as `anyhow::Error` with context
/// attached; this enum covers configuration and secret loading, where the
/// caller can act on the distinction.
#[derive(Debug, Error)]
pub enum BriefSearchError {
    #[error("configuration error: {0}")]
    InvalidConfiguration(String),
    #[error("missing environment variable: {0}")]
    MissingSecret(String),
    #[error("I/O error while reading {path}: {source}")]
    ConfigIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl BriefSearchError {
    pub fn config_io(path: PathBuf, source: std::io::Error) -> Self {
        Self::ConfigIo { path, source }
    }
}
