//! Error types for a deployment run
//!
//! The first unrecovered error aborts the run. Artifacts published before it
//! stay where they are.

use std::path::PathBuf;

use sw_model::{ModelError, StackName, StackStatus};
use sw_template::TemplateError;

use crate::collaborators::BoxError;
use crate::provisioning::ProvisioningError;
use crate::storage::StorageError;

/// Result type alias using [`DeployError`]
pub type DeployResult<T> = Result<T, DeployError>;

/// Main deployment error type
#[derive(Debug, thiserror::Error)]
pub enum DeployError {
    /// An expression template failed, or a document is not valid JSON
    #[error("template render failed for {path}: {message}")]
    TemplateRender { path: String, message: String },

    /// The provisioning service rejected a document
    #[error("template validation failed for {path}: {message}")]
    TemplateValidation { path: String, message: String },

    /// No rendered document is the main document
    #[error("main document '{0}' not found")]
    MainDocumentMissing(String),

    /// A user-declared parameter has no value in the stack configuration
    #[error("No value specified for parameter: {0}")]
    MissingParameter(String),

    /// The main document declares the same parameter twice
    #[error("parameter declared more than once: {0}")]
    DuplicateParameter(String),

    /// A stack exists in a status nothing can be deployed onto
    #[error("stack {stack} is in status {status}")]
    StackStatus { stack: StackName, status: StackStatus },

    /// `opscode/` exists but the definition has no `[opscode]` section
    #[error("opscode directory present but no [opscode] settings in the deployment definition")]
    MissingOpscodeSettings,

    /// Deployment definition or namespace error
    #[error(transparent)]
    Model(#[from] ModelError),

    /// Unrecovered provisioning-service error
    #[error("provisioning failed: {0}")]
    Provisioning(#[from] ProvisioningError),

    /// Blob-store error
    #[error("storage failed: {0}")]
    Storage(#[from] StorageError),

    /// Configuration-management server error
    #[error("configuration management {operation} failed: {source}")]
    ConfigManagement {
        operation: &'static str,
        #[source]
        source: BoxError,
    },

    /// Vendoring or archiving error
    #[error("packaging {path} failed: {source}")]
    Packaging {
        path: PathBuf,
        #[source]
        source: BoxError,
    },

    /// IO error
    #[error("io error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Serialization error
    #[error("serialization failed: {0}")]
    Serialization(String),
}

impl DeployError {
    /// Create IO error for path
    pub fn io_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Create configuration-management error for an operation
    pub fn config_management(operation: &'static str, source: BoxError) -> Self {
        Self::ConfigManagement { operation, source }
    }

    /// Create packaging error for a source path
    pub fn packaging(path: impl Into<PathBuf>, source: BoxError) -> Self {
        Self::Packaging {
            path: path.into(),
            source,
        }
    }

    /// Check if the error points at the user's deployment directory
    #[inline]
    #[must_use]
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            Self::TemplateRender { .. }
                | Self::TemplateValidation { .. }
                | Self::MainDocumentMissing(_)
                | Self::MissingParameter(_)
                | Self::DuplicateParameter(_)
                | Self::MissingOpscodeSettings
                | Self::Model(_)
        )
    }
}

impl From<TemplateError> for DeployError {
    fn from(err: TemplateError) -> Self {
        match err {
            TemplateError::Io { path, source } => Self::Io { path, source },
            TemplateError::Render { path, message } => Self::TemplateRender { path, message },
            TemplateError::InvalidMainDocument { path, message } => Self::TemplateRender { path, message },
            TemplateError::MainDocumentMissing(name) => Self::MainDocumentMissing(name),
            TemplateError::DuplicateDocument(path) => Self::TemplateRender {
                path,
                message: "more than one source file renders to this path".to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_parameter_message() {
        let err = DeployError::MissingParameter("InstanceType".to_string());
        assert_eq!(err.to_string(), "No value specified for parameter: InstanceType");
        assert!(err.is_input_error());
    }

    #[test]
    fn main_document_not_object_is_render_error() {
        let err: DeployError = TemplateError::InvalidMainDocument {
            path: "main.json".to_string(),
            message: "expected struct".to_string(),
        }
        .into();
        assert!(matches!(err, DeployError::TemplateRender { ref path, .. } if path == "main.json"));
    }

    #[test]
    fn stack_status_names_stack_and_status() {
        let err = DeployError::StackStatus {
            stack: StackName::compose("acme", "chef", "test"),
            status: StackStatus::new("DELETE_FAILED"),
        };
        assert_eq!(err.to_string(), "stack acme-chef-test is in status DELETE_FAILED");
        assert!(!err.is_input_error());
    }
}
