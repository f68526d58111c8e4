//! Resolved provisioning parameters

use serde::{Deserialize, Serialize};

/// Where a parameter value came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParameterSource {
    /// Filled from the configuration namespace
    Reserved,
    /// Supplied by the target's stack configuration
    UserDeclared,
}

/// One parameter of the main document with its resolved value
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ParameterDeclaration {
    pub name: String,
    pub value: String,
    pub source: ParameterSource,
}

impl ParameterDeclaration {
    #[inline]
    #[must_use]
    pub fn reserved(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            source: ParameterSource::Reserved,
        }
    }

    #[inline]
    #[must_use]
    pub fn user_declared(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            source: ParameterSource::UserDeclared,
        }
    }
}
