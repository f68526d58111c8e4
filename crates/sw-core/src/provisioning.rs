//! Provisioning-service vocabulary
//!
//! Requests sent to the provisioning service and the classification of its
//! failures. Two expected conditions are only recognizable by matching the
//! service's error code and message text; every such string lives here and
//! nowhere else. A change in the service's wording breaks the match, so
//! `NO_UPDATES_MESSAGE` and `is_missing_stack_message` are the places to
//! look when a previously recovered error starts surfacing.

use std::fmt;

use serde::{Deserialize, Serialize};
use sw_model::{ParameterDeclaration, StackName};

/// Error code returned when creating a stack whose name is taken
pub const ALREADY_EXISTS_CODE: &str = "AlreadyExistsException";

/// Error code shared by template rejections, "no updates" and "does not exist"
pub const VALIDATION_ERROR_CODE: &str = "ValidationError";

/// Message of the validation error returned by an update that changes nothing
pub const NO_UPDATES_MESSAGE: &str = "No updates are to be performed.";

/// Result alias for provisioning calls
pub type ProvisioningResult<T> = Result<T, ProvisioningError>;

/// Classified provisioning-service failure
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProvisioningError {
    /// Create refused because the stack exists
    #[error("stack already exists: {0}")]
    AlreadyExists(String),

    /// Update refused because the stack already matches
    #[error("no updates are to be performed")]
    NoChanges,

    /// Describe found no stack with that name
    #[error("stack not found: {0}")]
    StackNotFound(String),

    /// Request rejected, e.g. a template failed validation
    #[error("validation error: {0}")]
    Validation(String),

    /// Any other service-side error
    #[error("{code}: {message}")]
    Service { code: String, message: String },

    /// Request never produced a service response
    #[error("transport error: {0}")]
    Transport(String),
}

/// Whether a describe error message says the stack does not exist
#[must_use]
pub fn is_missing_stack_message(message: &str) -> bool {
    message.starts_with("Stack with id ") && message.ends_with(" does not exist")
}

/// Map a service error's code and message onto [`ProvisioningError`]
#[must_use]
pub fn classify_service_error(code: Option<&str>, message: Option<&str>) -> ProvisioningError {
    let message = message.unwrap_or_default().to_string();
    match code {
        Some(ALREADY_EXISTS_CODE) => ProvisioningError::AlreadyExists(message),
        Some(VALIDATION_ERROR_CODE) if message == NO_UPDATES_MESSAGE => ProvisioningError::NoChanges,
        Some(VALIDATION_ERROR_CODE) if is_missing_stack_message(&message) => {
            ProvisioningError::StackNotFound(message)
        }
        Some(VALIDATION_ERROR_CODE) => ProvisioningError::Validation(message),
        Some(code) => ProvisioningError::Service {
            code: code.to_string(),
            message,
        },
        None => ProvisioningError::Service {
            code: "Unknown".to_string(),
            message,
        },
    }
}

/// Capability acknowledged on create and update
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Capability {
    /// Template may create IAM resources
    Iam,
}

impl Capability {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Iam => "CAPABILITY_IAM",
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What the service does with a stack whose creation fails
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OnFailure {
    /// Leave the failed resources in place for inspection
    DoNothing,
}

impl OnFailure {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::DoNothing => "DO_NOTHING",
        }
    }
}

/// Create or update request for one stack
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StackRequest {
    pub name: StackName,
    /// Location of the published main document
    pub template_url: String,
    pub parameters: Vec<ParameterDeclaration>,
    pub capabilities: Vec<Capability>,
}

impl StackRequest {
    /// Request acknowledging IAM capability
    #[must_use]
    pub fn new(
        name: StackName,
        template_url: impl Into<String>,
        parameters: Vec<ParameterDeclaration>,
    ) -> Self {
        Self {
            name,
            template_url: template_url.into(),
            parameters,
            capabilities: vec![Capability::Iam],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn already_exists_classified() {
        assert_eq!(
            classify_service_error(Some(ALREADY_EXISTS_CODE), Some("Stack [acme-web-test] already exists")),
            ProvisioningError::AlreadyExists("Stack [acme-web-test] already exists".to_string())
        );
    }

    #[test]
    fn no_updates_requires_exact_message() {
        assert_eq!(
            classify_service_error(Some(VALIDATION_ERROR_CODE), Some(NO_UPDATES_MESSAGE)),
            ProvisioningError::NoChanges
        );
        assert!(matches!(
            classify_service_error(Some(VALIDATION_ERROR_CODE), Some("No updates are to be performed")),
            ProvisioningError::Validation(_)
        ));
        assert!(matches!(
            classify_service_error(Some("Throttling"), Some(NO_UPDATES_MESSAGE)),
            ProvisioningError::Service { .. }
        ));
    }

    #[test]
    fn missing_stack_classified() {
        let message = "Stack with id acme-chef-test does not exist";
        assert!(is_missing_stack_message(message));
        assert_eq!(
            classify_service_error(Some(VALIDATION_ERROR_CODE), Some(message)),
            ProvisioningError::StackNotFound(message.to_string())
        );
    }

    #[test]
    fn template_rejection_is_validation() {
        let err = classify_service_error(
            Some(VALIDATION_ERROR_CODE),
            Some("Template format error: JSON not well-formed."),
        );
        assert_eq!(
            err,
            ProvisioningError::Validation("Template format error: JSON not well-formed.".to_string())
        );
    }

    #[test]
    fn missing_code_is_service_error() {
        assert!(matches!(
            classify_service_error(None, None),
            ProvisioningError::Service { ref code, .. } if code == "Unknown"
        ));
    }

    #[test]
    fn request_always_acknowledges_iam() {
        let request = StackRequest::new(StackName::compose("a", "b", "c"), "https://x", Vec::new());
        assert_eq!(request.capabilities, vec![Capability::Iam]);
        assert_eq!(Capability::Iam.as_str(), "CAPABILITY_IAM");
        assert_eq!(OnFailure::DoNothing.as_str(), "DO_NOTHING");
    }
}
