//! External collaborators
//!
//! Everything that touches the network, the filesystem outside the scratch
//! directory, or an external tool goes through one of these traits. A run
//! receives one [`Collaborators`] bundle and passes it down explicitly.

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use sw_model::{EncryptionKeyId, StackName, StackState};

use crate::provisioning::{OnFailure, ProvisioningResult, StackRequest};
use crate::storage::StorageResult;

/// Error raised by tooling collaborators
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Result alias for tooling collaborators
pub type ToolResult<T> = Result<T, BoxError>;

/// Object storage
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Write an object, encrypted server-side under `encryption` when given
    async fn put(
        &self,
        bucket: &str,
        key: &str,
        body: Bytes,
        encryption: Option<&EncryptionKeyId>,
    ) -> StorageResult<()>;

    async fn get(&self, bucket: &str, key: &str) -> StorageResult<Bytes>;

    /// Public URL the provisioning service fetches the object from
    fn object_url(&self, bucket: &str, key: &str) -> String;
}

/// Infrastructure provisioning service
#[async_trait]
pub trait ProvisioningService: Send + Sync {
    /// Check a template body without creating anything
    async fn validate_template(&self, body: &str) -> ProvisioningResult<()>;

    /// Fresh snapshot of a stack's existence and status
    async fn describe_stack(&self, name: &StackName) -> ProvisioningResult<StackState>;

    async fn create_stack(&self, request: &StackRequest, on_failure: OnFailure) -> ProvisioningResult<()>;

    async fn update_stack(&self, request: &StackRequest) -> ProvisioningResult<()>;
}

/// Credentials for a configuration-management server
#[derive(Clone, PartialEq, Eq)]
pub struct ServerCredentials {
    pub server_url: String,
    pub organization: String,
    pub user: String,
    /// PEM-encoded private key of `user`
    pub user_key: String,
    pub ssl_verify: bool,
}

impl fmt::Debug for ServerCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServerCredentials")
            .field("server_url", &self.server_url)
            .field("organization", &self.organization)
            .field("user", &self.user)
            .field("user_key", &"<redacted>")
            .field("ssl_verify", &self.ssl_verify)
            .finish()
    }
}

/// Configuration-management server client
#[async_trait]
pub trait ConfigManagement: Send + Sync {
    /// Open a session authenticated with `credentials`
    async fn connect(&self, credentials: ServerCredentials) -> ToolResult<Box<dyn ConfigManagementSession>>;
}

/// An open configuration-management session
///
/// Holds local resources until [`release`](Self::release) is called.
#[async_trait]
pub trait ConfigManagementSession: Send {
    /// Create the environment unless it already exists
    async fn create_environment(&mut self, name: &str) -> ToolResult<()>;

    /// Upload the definitions in `dir` scoped to `environment`
    async fn upload_definitions(&mut self, dir: &Path, environment: &str) -> ToolResult<()>;

    async fn release(self: Box<Self>) -> ToolResult<()>;
}

/// Dependency vendoring and archive building
#[async_trait]
pub trait Packager: Send + Sync {
    /// Vendor the dependencies of `source` into `dest`
    ///
    /// With `root_level` the definitions land directly in `dest`, otherwise
    /// in `dest/cookbooks`.
    async fn vendor(&self, source: &Path, dest: &Path, root_level: bool) -> ToolResult<()>;

    /// Gzip-compressed tar of the contents of `dir`
    async fn archive(&self, dir: &Path) -> ToolResult<Bytes>;
}

/// The collaborators of one run
#[derive(Clone)]
pub struct Collaborators {
    pub blob_store: Arc<dyn BlobStore>,
    pub provisioning: Arc<dyn ProvisioningService>,
    pub config_management: Arc<dyn ConfigManagement>,
    pub packager: Arc<dyn Packager>,
}

impl Collaborators {
    #[must_use]
    pub fn new(
        blob_store: Arc<dyn BlobStore>,
        provisioning: Arc<dyn ProvisioningService>,
        config_management: Arc<dyn ConfigManagement>,
        packager: Arc<dyn Packager>,
    ) -> Self {
        Self {
            blob_store,
            provisioning,
            config_management,
            packager,
        }
    }
}

impl fmt::Debug for Collaborators {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Collaborators").finish_non_exhaustive()
    }
}
