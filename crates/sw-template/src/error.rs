//! Error types for the template layer
//!
//! Every variant names the document it concerns so a failed run points at
//! the file to fix.

use std::path::PathBuf;

/// Result alias for template operations
pub type TemplateResult<T> = Result<T, TemplateError>;

/// Errors while discovering, rendering or parsing template documents
#[derive(Debug, thiserror::Error)]
pub enum TemplateError {
    /// IO error reading the source tree
    #[error("io error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Expression evaluation failed, or the output is not valid JSON
    #[error("failed to render {path}: {message}")]
    Render { path: String, message: String },

    /// The main document is not a JSON object or its Parameters are malformed
    #[error("invalid main document {path}: {message}")]
    InvalidMainDocument { path: String, message: String },

    /// No document in the tree is the main document
    #[error("main document '{0}' not found")]
    MainDocumentMissing(String),

    /// Two source files map to the same relative path
    #[error("more than one source file renders to '{0}'")]
    DuplicateDocument(String),
}

impl TemplateError {
    /// Create IO error for path
    pub fn io_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Create render error for a relative document path
    pub fn render(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Render {
            path: path.into(),
            message: message.into(),
        }
    }
}
