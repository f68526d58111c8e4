//! Deployment identity
//!
//! Who is being deployed (prefix, name, target), where its artifacts live,
//! and which encryption key protects them.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{ModelError, ModelResult};

/// Prefix, name and target of one deployment
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StackIdentity {
    pub prefix: String,
    pub name: String,
    pub target: String,
}

impl StackIdentity {
    #[inline]
    #[must_use]
    pub fn new(
        prefix: impl Into<String>,
        name: impl Into<String>,
        target: impl Into<String>,
    ) -> Self {
        Self {
            prefix: prefix.into(),
            name: name.into(),
            target: target.into(),
        }
    }

    /// Provisioning-service stack name for this deployment
    #[inline]
    #[must_use]
    pub fn stack_name(&self) -> StackName {
        StackName::compose(&self.prefix, &self.name, &self.target)
    }

    /// Stack name of another deployment sharing this prefix and target
    #[inline]
    #[must_use]
    pub fn sibling_stack_name(&self, name: &str) -> StackName {
        StackName::compose(&self.prefix, name, &self.target)
    }
}

/// Provisioning-service stack name, always `{prefix}-{name}-{target}`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StackName(String);

impl StackName {
    #[inline]
    #[must_use]
    pub fn compose(prefix: &str, name: &str, target: &str) -> Self {
        Self(format!("{prefix}-{name}-{target}"))
    }

    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StackName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Blob-storage bucket and the region every client talks to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageLocation {
    pub bucket: String,
    pub region: String,
}

impl StorageLocation {
    #[inline]
    #[must_use]
    pub fn new(bucket: impl Into<String>, region: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            region: region.into(),
        }
    }
}

/// Identifier of a server-side encryption key
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EncryptionKeyId(String);

impl EncryptionKeyId {
    #[inline]
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EncryptionKeyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Per-target encryption keys with the key of the deployed target selected
///
/// Construction fails if the deployed target has no key, so [`Self::active`]
/// never does.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncryptionKeys {
    keys: IndexMap<String, EncryptionKeyId>,
    active: String,
}

impl EncryptionKeys {
    /// Select the key of `target` from the per-target keys
    ///
    /// # Errors
    /// - `ModelError::UnknownTarget` if `target` has no key
    pub fn select(keys: IndexMap<String, EncryptionKeyId>, target: &str) -> ModelResult<Self> {
        if !keys.contains_key(target) {
            return Err(ModelError::UnknownTarget(target.to_string()));
        }
        Ok(Self {
            keys,
            active: target.to_string(),
        })
    }

    /// Key of the deployed target
    #[must_use]
    pub fn active(&self) -> &EncryptionKeyId {
        // presence checked in `select`
        &self.keys[self.active.as_str()]
    }

    /// Key of any declared target
    #[inline]
    #[must_use]
    pub fn for_target(&self, target: &str) -> Option<&EncryptionKeyId> {
        self.keys.get(target)
    }
}
