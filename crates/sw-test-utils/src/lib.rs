//! Testing utilities for the Stackwright workspace
//!
//! In-memory collaborators and deployment-directory fixtures.

#![allow(missing_docs)]

pub mod blob_store;
pub mod config_management;
pub mod fixture;
pub mod packager;
pub mod provisioner;

use std::sync::Arc;

use sw_core::{Collaborators, Deployer};

pub use blob_store::{MemoryBlobStore, StoredObject};
pub use config_management::{ConfigEvent, RecordingConfigManagement};
pub use fixture::{DeploymentFixture, OWN_SERVER_SETTINGS, STANDARD_DEFINITION, STANDARD_MAIN};
pub use packager::{FakePackager, VendorCall};
pub use provisioner::{ProvisioningCall, ScriptedProvisioner};

/// Region passed to every test deployment
pub const TEST_REGION: &str = "us-east-1";

/// One of each fake, shared with the deployer under test
#[derive(Debug, Clone, Default)]
pub struct TestCollaborators {
    pub blob_store: Arc<MemoryBlobStore>,
    pub provisioning: Arc<ScriptedProvisioner>,
    pub config_management: RecordingConfigManagement,
    pub packager: Arc<FakePackager>,
}

impl TestCollaborators {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_provisioning(provisioning: ScriptedProvisioner) -> Self {
        Self {
            provisioning: Arc::new(provisioning),
            ..Self::default()
        }
    }

    pub fn collaborators(&self) -> Collaborators {
        Collaborators::new(
            self.blob_store.clone(),
            self.provisioning.clone(),
            Arc::new(self.config_management.clone()),
            self.packager.clone(),
        )
    }

    pub fn deployer(&self) -> Deployer {
        Deployer::new(self.collaborators())
    }
}

pub fn init_test_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("sw_core=debug")
        .with_test_writer()
        .try_init();
}
