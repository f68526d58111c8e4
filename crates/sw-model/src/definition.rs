//! Deployment definition (`stackwright.toml`)
//!
//! Declares the deployment's identity, its targets with their encryption keys
//! and stack configuration, and the optional configuration-management server
//! settings.

use indexmap::IndexMap;
use serde::Deserialize;
use serde_json::Value;
use std::path::Path;

use crate::error::{ModelError, ModelResult};
use crate::identity::{EncryptionKeyId, EncryptionKeys, StackIdentity};

/// File name of the definition inside a deployment directory
pub const DEFINITION_FILE: &str = "stackwright.toml";

/// Parsed `stackwright.toml`
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DeploymentDefinition {
    /// Shared prefix of every stack name
    pub prefix: String,
    /// Deployment name
    pub name: String,
    /// Bucket every artifact is published to
    pub bucket: String,
    /// Targets in declaration order
    #[serde(default)]
    pub targets: IndexMap<String, TargetSettings>,
    /// Configuration-management server settings
    #[serde(default)]
    pub opscode: Option<OpscodeSettings>,
}

/// Settings of one target
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TargetSettings {
    /// Key encrypting the published namespace
    pub kms_key: EncryptionKeyId,
    /// User-declared parameter values for the main document
    #[serde(default)]
    pub cloudformation: Option<StackConfig>,
}

/// Stack configuration consulted for user-declared parameters
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StackConfig {
    #[serde(default)]
    pub parameters: IndexMap<String, Value>,
}

impl StackConfig {
    /// Parameter value rendered as the provisioning service expects it
    ///
    /// Strings are taken as-is, other scalars via their display form, and
    /// arrays/objects as compact JSON.
    #[must_use]
    pub fn parameter(&self, name: &str) -> Option<String> {
        self.parameters.get(name).map(|value| match value {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        })
    }
}

/// Configuration-management server settings
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OpscodeSettings {
    /// Name of the deployment whose stack runs the server; defaults to this one
    #[serde(default)]
    pub server_stack: Option<String>,
    pub user: String,
    pub server_url: String,
    pub organization: String,
    #[serde(default = "default_ssl_verify")]
    pub ssl_verify: bool,
}

const fn default_ssl_verify() -> bool {
    true
}

impl OpscodeSettings {
    /// Deployment name that owns the server stack
    #[inline]
    #[must_use]
    pub fn server_stack<'a>(&'a self, deployment_name: &'a str) -> &'a str {
        self.server_stack.as_deref().unwrap_or(deployment_name)
    }
}

impl DeploymentDefinition {
    /// Load `stackwright.toml` from a deployment directory
    ///
    /// # Errors
    /// - `ModelError::Io` if the file cannot be read
    /// - `ModelError::DefinitionParse` / `ModelError::InvalidDefinition`
    pub fn load(dir: &Path) -> ModelResult<Self> {
        let path = dir.join(DEFINITION_FILE);
        let text = std::fs::read_to_string(&path).map_err(|e| ModelError::io_error(&path, e))?;
        Self::from_toml(&text)
    }

    /// Parse and validate a definition
    ///
    /// # Errors
    /// - `ModelError::DefinitionParse` on malformed TOML or unknown fields
    /// - `ModelError::InvalidDefinition` on empty identity fields
    pub fn from_toml(text: &str) -> ModelResult<Self> {
        let definition: Self =
            toml::from_str(text).map_err(|e| ModelError::DefinitionParse(e.to_string()))?;
        definition.validate()?;
        Ok(definition)
    }

    fn validate(&self) -> ModelResult<()> {
        for (field, value) in [
            ("prefix", &self.prefix),
            ("name", &self.name),
            ("bucket", &self.bucket),
        ] {
            if value.trim().is_empty() {
                return Err(ModelError::InvalidDefinition(format!("{field} must not be empty")));
            }
        }
        if let Some(target) = self.targets.keys().find(|t| t.trim().is_empty()) {
            return Err(ModelError::InvalidDefinition(format!(
                "target name '{target}' must not be empty"
            )));
        }
        Ok(())
    }

    /// Settings of a declared target
    ///
    /// # Errors
    /// - `ModelError::UnknownTarget` if the target is not declared
    pub fn target(&self, target: &str) -> ModelResult<&TargetSettings> {
        self.targets
            .get(target)
            .ok_or_else(|| ModelError::UnknownTarget(target.to_string()))
    }

    /// Identity of this deployment for a declared target
    ///
    /// # Errors
    /// - `ModelError::UnknownTarget` if the target is not declared
    pub fn identity(&self, target: &str) -> ModelResult<StackIdentity> {
        self.target(target)?;
        Ok(StackIdentity::new(&self.prefix, &self.name, target))
    }

    /// Per-target encryption keys with `target` active
    ///
    /// # Errors
    /// - `ModelError::UnknownTarget` if the target is not declared
    pub fn encryption_keys(&self, target: &str) -> ModelResult<EncryptionKeys> {
        let keys = self
            .targets
            .iter()
            .map(|(name, settings)| (name.clone(), settings.kms_key.clone()))
            .collect();
        EncryptionKeys::select(keys, target)
    }

    /// Stack configuration of a target, if it declares one
    #[must_use]
    pub fn stack_config(&self, target: &str) -> Option<&StackConfig> {
        self.targets
            .get(target)
            .and_then(|settings| settings.cloudformation.as_ref())
    }
}
