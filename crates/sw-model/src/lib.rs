//! Stackwright Deployment Model
//!
//! Strongly-typed data shared by every stage of a deployment run.
//!
//! # Core Concepts
//!
//! - [`ConfigurationNamespace`]: the flat key/value namespace templates are
//!   rendered against, with a fixed set of [`ReservedKey`]s plus user keys
//! - [`StackIdentity`] / [`StackName`]: who is being deployed and under which
//!   provisioning-service name
//! - [`StackState`]: observed remote state, classified into [`StackHealth`]
//! - [`ParameterDeclaration`]: one resolved provisioning parameter
//! - [`DeploymentDefinition`]: the `stackwright.toml` file of a deployment
//!
//! # Example
//!
//! ```rust,ignore
//! use sw_model::{DeploymentDefinition, TargetParameters};
//!
//! let definition = DeploymentDefinition::load(dir)?;
//! let identity = definition.identity("production")?;
//! let params = TargetParameters::load(&dir.join("config"), "production")?;
//!
//! println!("deploying {}", identity.stack_name());
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

// Core modules
mod artifact;
mod definition;
mod error;
mod identity;
mod namespace;
mod parameter;
mod stack;
mod target_params;

// Re-exports
pub use artifact::DeploymentArtifact;
pub use definition::{
    DeploymentDefinition, OpscodeSettings, StackConfig, TargetSettings, DEFINITION_FILE,
};
pub use error::{ModelError, ModelResult};
pub use identity::{EncryptionKeyId, EncryptionKeys, StackIdentity, StackName, StorageLocation};
pub use namespace::{ConfigurationNamespace, KeyLayout, ReservedKey, RESERVED_PREFIX};
pub use parameter::{ParameterDeclaration, ParameterSource};
pub use stack::{StackHealth, StackState, StackStatus, HEALTHY_STATUSES};
pub use target_params::{TargetParameters, DEFAULT_TARGET_DIR};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
