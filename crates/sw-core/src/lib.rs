//! Stackwright Core Orchestrator
//!
//! Sequences a deployment run against a set of injected collaborators:
//!
//! - **Configuration Assembler**: builds the namespace from identity, storage
//!   location, encryption keys and target parameters
//! - **Template Rendering Pipeline**: renders, validates and publishes every
//!   template document
//! - **Parameter Resolver**: fills the main document's declared parameters
//! - **Stack Reconciler**: create, update or no-op
//! - **Bootstrap Decider**: first-run packaging or steady-state registration
//!   of configuration-management servers
//! - **Node-Fleet Publisher**: republishes fleet archives every run
//!
//! # Architecture
//!
//! ```text
//! Deployer
//!   ├── assembler ──→ ConfigurationNamespace ──→ BlobStore (config.json, encrypted)
//!   ├── bootstrap ──→ ProvisioningService / Packager / ConfigManagement
//!   ├── fleet     ──→ Packager / BlobStore
//!   └── pipeline  ──→ resolver ──→ reconciler ──→ ProvisioningService
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use sw_core::{Collaborators, Deployer};
//!
//! let deployer = Deployer::new(Collaborators::new(blob_store, provisioning, config_management, packager));
//! let report = deployer.deploy(&dir, "production", "us-east-1", scratch.path()).await?;
//! println!("{}: {}", report.stack, report.outcome);
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

// Core modules
pub mod artifacts;
pub mod assembler;
pub mod bootstrap;
pub mod collaborators;
pub mod deployer;
pub mod error;
pub mod fleet;
pub mod pipeline;
pub mod provisioning;
pub mod reconciler;
pub mod resolver;
pub mod storage;

#[cfg(test)]
mod mocks;

// Re-exports for convenience
pub use assembler::assemble;
pub use bootstrap::BootstrapDecision;
pub use collaborators::{
    BlobStore, BoxError, Collaborators, ConfigManagement, ConfigManagementSession, Packager, ProvisioningService,
    ServerCredentials, ToolResult,
};
pub use deployer::{DeployOutcome, DeployReport, Deployer, DeployerConfig, DeploymentContext, RunId};
pub use error::{DeployError, DeployResult};
pub use provisioning::{
    classify_service_error, is_missing_stack_message, Capability, OnFailure, ProvisioningError, ProvisioningResult,
    StackRequest, ALREADY_EXISTS_CODE, NO_UPDATES_MESSAGE, VALIDATION_ERROR_CODE,
};
pub use reconciler::{ReconcileOutcome, ReconcileState, StackReconciler};
pub use resolver::resolve;
pub use storage::{StorageError, StorageResult};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
