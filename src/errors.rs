use std::path::{Path, PathBuf};
use std::time::Duration;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("IO failure at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("`{program}` is not installed")]
    CommandMissing { program: String },

    #[error("`{program}` exited with {status}: {stderr}")]
    CommandFailed {
        program: String,
        status: String,
        stderr: String,
    },

    #[error("`{program}` timed out after {}s", timeout.as_secs())]
    CommandTimeout { program: String, timeout: Duration },

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("remote index rejected the request: {0}")]
    RemoteIndex(String),

    #[error("malformed JSON in {context}: {source}")]
    Json {
        context: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("config parse failure in {path}: {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("missing configuration file: {path}")]
    MissingConfig { path: PathBuf },

    #[error("could not determine home directory")]
    NoHomeDir,

    #[error("unknown category `{0}` (expected one of: {1})")]
    UnknownCategory(String, String),

    #[error("interrupted")]
    Interrupted,

    #[error("cancelled by user")]
    Cancelled,
}

impl Error {
    pub fn io(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    pub fn json(context: &'static str, source: serde_json::Error) -> Self {
        Self::Json { context, source }
    }

    /// Interrupts and cancellations end the session quietly.
    pub fn is_user_abort(&self) -> bool {
        matches!(self, Self::Interrupted | Self::Cancelled)
    }
}
