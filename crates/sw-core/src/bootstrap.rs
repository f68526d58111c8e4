//! Configuration-Management Bootstrap Decider
//!
//! A deployment that runs its own configuration-management server has to
//! stand the server up before anything can register with it. The first run
//! only publishes the server's cookbook archives; once the server stack
//! exists, later runs create environments and upload definitions.
//!
//! A deployment pointing at another deployment's server assumes that server
//! is running and goes straight to the steady-state path.

use std::path::Path;

use sw_model::{ConfigurationNamespace, KeyLayout, OpscodeSettings, StackState};
use tracing::{debug, info, warn};

use crate::artifacts::{publish_vendored, subdirectories, VendorJob};
use crate::collaborators::{
    BlobStore, ConfigManagement, ConfigManagementSession, Packager, ProvisioningService, ServerCredentials,
};
use crate::error::{DeployError, DeployResult};
use crate::provisioning::ProvisioningError;

/// Scratch subdirectory receiving vendored server definitions
pub const SERVER_VENDOR_DIR: &str = "vendor/opscode";

/// Which path the configuration-management step takes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BootstrapDecision {
    /// Server stack absent: publish cookbook archives only
    Bootstrap,
    /// Server running: create environments and upload definitions
    SteadyState,
}

/// Decide between the bootstrap and steady-state paths
///
/// # Errors
/// - `DeployError::StackStatus` if this deployment's own server stack is in
///   a status outside the healthy allow-list
/// - `DeployError::Provisioning` if the describe call fails otherwise
pub async fn decide(
    namespace: &ConfigurationNamespace,
    settings: &OpscodeSettings,
    provisioning: &dyn ProvisioningService,
) -> DeployResult<BootstrapDecision> {
    let identity = namespace.identity();
    let server_stack = settings.server_stack(&identity.name);
    if server_stack != identity.name {
        debug!(server_stack, "shared server, skipping existence check");
        return Ok(BootstrapDecision::SteadyState);
    }

    let stack = identity.stack_name();
    let state = match provisioning.describe_stack(&stack).await {
        Ok(state) => state,
        Err(ProvisioningError::StackNotFound(_)) => StackState::Absent,
        Err(e) => return Err(e.into()),
    };

    debug!(stack = %stack, health = ?state.health(), "server stack state");
    match state {
        StackState::Absent => Ok(BootstrapDecision::Bootstrap),
        StackState::Present(status) if status.is_healthy() => Ok(BootstrapDecision::SteadyState),
        StackState::Present(status) => Err(DeployError::StackStatus { stack, status }),
    }
}

/// Bootstrap path: publish one cookbook archive per server directory
///
/// # Errors
/// The first packaging, IO or storage failure.
pub async fn publish_server_cookbooks(
    server_dir: &Path,
    scratch: &Path,
    namespace: &ConfigurationNamespace,
    packager: &dyn Packager,
    blob_store: &dyn BlobStore,
) -> DeployResult<Vec<String>> {
    let mut keys = Vec::new();
    for (server, source) in subdirectories(server_dir)? {
        let key = namespace.keys().cookbook_archive(&server);
        let job = VendorJob {
            vendor_dir: scratch.join(SERVER_VENDOR_DIR).join(&server),
            name: server,
            source,
            root_level: true,
            key: key.clone(),
        };
        publish_vendored(packager, blob_store, namespace.bucket(), job).await?;
        keys.push(key);
    }
    Ok(keys)
}

/// Environment name of a server definition directory
#[must_use]
pub fn environment_name(deployment: &str, server: &str) -> String {
    format!("{deployment}__{server}")
}

/// Steady-state path: register every server directory with the server
///
/// The session is released whatever happens in the loop. A loop error wins
/// over a release error.
///
/// # Errors
/// - `DeployError::Storage` if the user key cannot be read
/// - `DeployError::ConfigManagement` if connecting, creating an environment,
///   uploading or releasing fails
pub async fn register_servers(
    server_dir: &Path,
    namespace: &ConfigurationNamespace,
    settings: &OpscodeSettings,
    config_management: &dyn ConfigManagement,
    blob_store: &dyn BlobStore,
) -> DeployResult<Vec<String>> {
    let identity = namespace.identity();
    let server_stack = settings.server_stack(&identity.name);
    let key = KeyLayout::for_deployment(&identity.target, server_stack).user_key(&settings.user);

    let user_key = blob_store.get(namespace.bucket(), &key).await?;
    let user_key = String::from_utf8(user_key.to_vec())
        .map_err(|e| DeployError::Serialization(format!("user key {key} is not UTF-8: {e}")))?;

    let credentials = ServerCredentials {
        server_url: settings.server_url.clone(),
        organization: settings.organization.clone(),
        user: settings.user.clone(),
        user_key,
        ssl_verify: settings.ssl_verify,
    };
    let mut session = config_management
        .connect(credentials)
        .await
        .map_err(|e| DeployError::config_management("connect", e))?;

    let result = register_each(session.as_mut(), server_dir, &identity.name).await;
    let released = session.release().await;

    let environments = result?;
    released.map_err(|e| DeployError::config_management("release", e))?;
    Ok(environments)
}

async fn register_each(
    session: &mut dyn ConfigManagementSession,
    server_dir: &Path,
    deployment: &str,
) -> DeployResult<Vec<String>> {
    let mut environments = Vec::new();
    for (server, source) in subdirectories(server_dir)? {
        let environment = environment_name(deployment, &server);
        session
            .create_environment(&environment)
            .await
            .map_err(|e| DeployError::config_management("create_environment", e))?;
        session
            .upload_definitions(&source, &environment)
            .await
            .map_err(|e| DeployError::config_management("upload_definitions", e))?;
        info!(environment = %environment, "uploaded definitions");
        environments.push(environment);
    }
    if environments.is_empty() {
        warn!(dir = %server_dir.display(), "no server definition directories");
    }
    Ok(environments)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collaborators::{BoxError, ToolResult};
    use crate::mocks::MockProvisioner;
    use crate::provisioning::ProvisioningResult;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use std::sync::Arc;
    use sw_model::{EncryptionKeyId, StackIdentity, StorageLocation, TargetParameters};
    use tempfile::TempDir;

    fn namespace(name: &str) -> ConfigurationNamespace {
        ConfigurationNamespace::new(
            StackIdentity::new("acme", name, "test"),
            StorageLocation::new("bucket", "us-east-1"),
            EncryptionKeyId::new("key"),
            TargetParameters::default(),
        )
    }

    fn settings(server_stack: Option<&str>) -> OpscodeSettings {
        OpscodeSettings {
            server_stack: server_stack.map(str::to_string),
            user: "deployer".to_string(),
            server_url: "https://chef.example.com".to_string(),
            organization: "acme".to_string(),
            ssl_verify: true,
        }
    }

    fn describing(state: ProvisioningResult<StackState>) -> MockProvisioner {
        let mut provisioner = MockProvisioner::new();
        provisioner
            .expect_describe_stack()
            .withf(|name| name.as_str() == "acme-chef-test")
            .times(1)
            .return_once(move |_| state);
        provisioner
    }

    #[tokio::test]
    async fn absent_own_server_bootstraps() {
        let provisioner = describing(Ok(StackState::Absent));
        let decision = decide(&namespace("chef"), &settings(None), &provisioner).await.unwrap();
        assert_eq!(decision, BootstrapDecision::Bootstrap);
    }

    #[tokio::test]
    async fn not_found_error_bootstraps() {
        let provisioner = describing(Err(ProvisioningError::StackNotFound(
            "Stack with id acme-chef-test does not exist".to_string(),
        )));
        let decision = decide(&namespace("chef"), &settings(Some("chef")), &provisioner)
            .await
            .unwrap();
        assert_eq!(decision, BootstrapDecision::Bootstrap);
    }

    #[tokio::test]
    async fn healthy_own_server_is_steady_state() {
        let provisioner = describing(Ok(StackState::present("UPDATE_ROLLBACK_COMPLETE")));
        let decision = decide(&namespace("chef"), &settings(None), &provisioner).await.unwrap();
        assert_eq!(decision, BootstrapDecision::SteadyState);
    }

    #[tokio::test]
    async fn unhealthy_own_server_fails() {
        let provisioner = describing(Ok(StackState::present("DELETE_FAILED")));
        let err = decide(&namespace("chef"), &settings(None), &provisioner).await.unwrap_err();
        assert!(matches!(
            err,
            DeployError::StackStatus { ref stack, ref status }
                if stack.as_str() == "acme-chef-test" && status.as_str() == "DELETE_FAILED"
        ));
    }

    #[tokio::test]
    async fn shared_server_skips_describe() {
        let mut provisioner = MockProvisioner::new();
        provisioner.expect_describe_stack().never();
        let decision = decide(&namespace("web"), &settings(Some("chef")), &provisioner)
            .await
            .unwrap();
        assert_eq!(decision, BootstrapDecision::SteadyState);
    }

    #[test]
    fn environment_names_are_namespaced() {
        assert_eq!(environment_name("web", "chef"), "web__chef");
    }

    #[derive(Default)]
    struct Journal {
        entries: Mutex<Vec<String>>,
        fail_upload: bool,
        fail_release: bool,
    }

    struct JournalSession(Arc<Journal>);

    #[async_trait]
    impl ConfigManagementSession for JournalSession {
        async fn create_environment(&mut self, name: &str) -> ToolResult<()> {
            self.0.entries.lock().push(format!("env {name}"));
            Ok(())
        }

        async fn upload_definitions(&mut self, _dir: &Path, environment: &str) -> ToolResult<()> {
            self.0.entries.lock().push(format!("upload {environment}"));
            if self.0.fail_upload {
                return Err(BoxError::from("berks upload failed"));
            }
            Ok(())
        }

        async fn release(self: Box<Self>) -> ToolResult<()> {
            self.0.entries.lock().push("release".to_string());
            if self.0.fail_release {
                return Err(BoxError::from("cleanup failed"));
            }
            Ok(())
        }
    }

    struct JournalClient(Arc<Journal>);

    #[async_trait]
    impl ConfigManagement for JournalClient {
        async fn connect(&self, credentials: ServerCredentials) -> ToolResult<Box<dyn ConfigManagementSession>> {
            self.0
                .entries
                .lock()
                .push(format!("connect {} {}", credentials.user, credentials.user_key));
            Ok(Box::new(JournalSession(Arc::clone(&self.0))))
        }
    }

    struct KeyStore;

    #[async_trait]
    impl BlobStore for KeyStore {
        async fn put(
            &self,
            _bucket: &str,
            _key: &str,
            _body: bytes::Bytes,
            _encryption: Option<&EncryptionKeyId>,
        ) -> crate::storage::StorageResult<()> {
            Ok(())
        }

        async fn get(&self, bucket: &str, key: &str) -> crate::storage::StorageResult<bytes::Bytes> {
            if key == "test/chef/opscode/keys/deployer.pem" {
                Ok(bytes::Bytes::from_static(b"PEM"))
            } else {
                Err(crate::storage::StorageError::not_found(bucket, key))
            }
        }

        fn object_url(&self, bucket: &str, key: &str) -> String {
            format!("https://s3.amazonaws.com/{bucket}/{key}")
        }
    }

    fn server_tree() -> TempDir {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir(dir.path().join("primary")).unwrap();
        std::fs::create_dir(dir.path().join("analytics")).unwrap();
        dir
    }

    #[tokio::test]
    async fn steady_state_registers_each_server_then_releases() {
        let dir = server_tree();
        let journal = Arc::new(Journal::default());

        let environments = register_servers(
            dir.path(),
            &namespace("web"),
            &settings(Some("chef")),
            &JournalClient(Arc::clone(&journal)),
            &KeyStore,
        )
        .await
        .unwrap();

        assert_eq!(environments, vec!["web__analytics".to_string(), "web__primary".to_string()]);
        assert_eq!(
            *journal.entries.lock(),
            vec![
                "connect deployer PEM",
                "env web__analytics",
                "upload web__analytics",
                "env web__primary",
                "upload web__primary",
                "release",
            ]
        );
    }

    #[tokio::test]
    async fn session_released_after_failure_and_loop_error_wins() {
        let dir = server_tree();
        let journal = Arc::new(Journal {
            fail_upload: true,
            fail_release: true,
            ..Journal::default()
        });

        let err = register_servers(
            dir.path(),
            &namespace("web"),
            &settings(Some("chef")),
            &JournalClient(Arc::clone(&journal)),
            &KeyStore,
        )
        .await
        .unwrap_err();

        assert!(matches!(err, DeployError::ConfigManagement { operation: "upload_definitions", .. }));
        assert_eq!(journal.entries.lock().last().map(String::as_str), Some("release"));
    }

    #[tokio::test]
    async fn missing_user_key_is_storage_error() {
        let dir = server_tree();
        let journal = Arc::new(Journal::default());

        let err = register_servers(
            dir.path(),
            &namespace("web"),
            &settings(Some("other")),
            &JournalClient(Arc::clone(&journal)),
            &KeyStore,
        )
        .await
        .unwrap_err();

        assert!(matches!(err, DeployError::Storage(_)));
        assert!(journal.entries.lock().is_empty());
    }
}
