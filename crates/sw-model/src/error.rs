//! Error types for the deployment model

use std::path::PathBuf;

/// Result type alias using [`ModelError`]
pub type ModelResult<T> = Result<T, ModelError>;

/// Errors raised while loading or constructing model values
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    /// IO error reading a deployment file
    #[error("io error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Deployment definition could not be parsed
    #[error("invalid deployment definition: {0}")]
    DefinitionParse(String),

    /// Deployment definition parsed but is unusable
    #[error("invalid deployment definition: {0}")]
    InvalidDefinition(String),

    /// Target is not declared in the deployment definition
    #[error("unknown target: '{0}'")]
    UnknownTarget(String),

    /// Target parameter file is malformed
    #[error("invalid target configuration in {path}: {message}")]
    InvalidTargetConfig { path: PathBuf, message: String },

    /// User key collides with the reserved namespace prefix
    #[error("key '{0}' uses the reserved prefix and cannot be supplied by target configuration")]
    ReservedKey(String),

    /// Namespace serialization failed
    #[error("serialization failed: {0}")]
    Serialization(String),
}

impl ModelError {
    /// Create IO error for path
    pub fn io_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Create target configuration error for path
    pub fn invalid_target_config(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::InvalidTargetConfig {
            path: path.into(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_target_display() {
        let err = ModelError::UnknownTarget("staging".to_string());
        assert_eq!(err.to_string(), "unknown target: 'staging'");
    }

    #[test]
    fn reserved_key_display() {
        let err = ModelError::ReservedKey("stackwrightName".to_string());
        assert!(err.to_string().contains("reserved prefix"));
    }
}
