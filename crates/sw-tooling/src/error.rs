//! Error types for external tooling

use std::path::PathBuf;
use std::time::Duration;

/// Result type alias using [`ToolingError`]
pub type ToolingResult<T> = Result<T, ToolingError>;

#[derive(Debug, thiserror::Error)]
pub enum ToolingError {
    /// The program could not be started
    #[error("failed to spawn {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// The program exited unsuccessfully
    #[error("{program} failed (exit code {status}): {stderr}")]
    CommandFailed {
        program: String,
        status: i32,
        stderr: String,
    },

    #[error("{program} did not finish within {limit:?}")]
    Timeout { program: String, limit: Duration },

    /// IO error
    #[error("io error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Blocking task panicked or was cancelled
    #[error("background task failed: {0}")]
    Task(String),
}

impl ToolingError {
    pub fn io_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
