use std::path::PathBuf;

use thiserror::Error;

/// The question file could not be turned into a playable quiz.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read questions from {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse questions from {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("no questions in {0:?}")]
    Empty(PathBuf),
}

/// A call to the Bot API failed. Logged and dropped by callers.
#[derive(Debug, Error)]
#[error("telegram request failed: {0}")]
pub struct TransportError(#[from] pub teloxide::RequestError);

/// Startup configuration is unusable. Fatal.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("TELOXIDE_TOKEN (or TOKEN) should be set")]
    MissingToken,
    #[error("invalid value '{value}' for {var}")]
    Invalid { var: &'static str, value: String },
    #[error("failed to build http client: {0}")]
    HttpClient(String),
}
