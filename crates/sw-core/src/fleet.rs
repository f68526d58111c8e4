//! Node-Fleet Artifact Publisher
//!
//! Every immediate subdirectory of `opsworks/` is vendored, archived and
//! republished on every run, with no state check.

use std::path::Path;

use sw_model::ConfigurationNamespace;
use tracing::info;

use crate::artifacts::{publish_vendored, subdirectories, VendorJob};
use crate::collaborators::{BlobStore, Packager};
use crate::error::DeployResult;

/// Scratch subdirectory receiving vendored fleet definitions
pub const FLEET_VENDOR_DIR: &str = "vendor/opsworks";

/// Publish one archive per fleet stack directory
///
/// Returns the published keys in processing order.
///
/// # Errors
/// The first packaging, IO or storage failure.
pub async fn publish_fleet(
    fleet_dir: &Path,
    scratch: &Path,
    namespace: &ConfigurationNamespace,
    packager: &dyn Packager,
    blob_store: &dyn BlobStore,
) -> DeployResult<Vec<String>> {
    let mut keys = Vec::new();
    for (stack, source) in subdirectories(fleet_dir)? {
        let key = namespace.keys().fleet_archive(&stack);
        let job = VendorJob {
            vendor_dir: scratch.join(FLEET_VENDOR_DIR).join(&stack),
            name: stack,
            source,
            root_level: false,
            key: key.clone(),
        };
        publish_vendored(packager, blob_store, namespace.bucket(), job).await?;
        keys.push(key);
    }
    info!(count = keys.len(), "published fleet archives");
    Ok(keys)
}
