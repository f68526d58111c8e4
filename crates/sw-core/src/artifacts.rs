//! Shared vendoring and archive publishing
//!
//! Used by the bootstrap path and the node-fleet publisher: vendor a source
//! directory into the scratch area, pack it, and put the archive.

use std::path::{Path, PathBuf};

use sw_model::DeploymentArtifact;
use tracing::info;

use crate::collaborators::{BlobStore, Packager};
use crate::error::{DeployError, DeployResult};

/// Immediate subdirectories of `dir` as (name, path), sorted by name
///
/// Plain files are skipped.
///
/// # Errors
/// - `DeployError::Io` if `dir` cannot be listed
pub fn subdirectories(dir: &Path) -> DeployResult<Vec<(String, PathBuf)>> {
    let entries = std::fs::read_dir(dir).map_err(|e| DeployError::io_error(dir, e))?;
    let mut found = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| DeployError::io_error(dir, e))?;
        let path = entry.path();
        if !path.is_dir() {
            continue;
        }
        if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
            found.push((name.to_string(), path.clone()));
        }
    }
    found.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(found)
}

/// One directory to vendor, pack and publish
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VendorJob {
    /// Artifact name, the source directory's name
    pub name: String,
    pub source: PathBuf,
    /// Scratch directory receiving the vendored definitions
    pub vendor_dir: PathBuf,
    /// Vendor into `vendor_dir` itself rather than `vendor_dir/cookbooks`
    pub root_level: bool,
    /// Blob key of the archive
    pub key: String,
}

/// Vendor, archive and publish one directory
///
/// Any previous vendor directory is removed first; the packager creates it.
///
/// # Errors
/// - `DeployError::Io` if the vendor directory cannot be prepared
/// - `DeployError::Packaging` if vendoring or archiving fails
/// - `DeployError::Storage` if the put fails
pub async fn publish_vendored(
    packager: &dyn Packager,
    blob_store: &dyn BlobStore,
    bucket: &str,
    job: VendorJob,
) -> DeployResult<()> {
    let vendor_dir = job.vendor_dir.as_path();
    if vendor_dir.exists() {
        tokio::fs::remove_dir_all(vendor_dir)
            .await
            .map_err(|e| DeployError::io_error(vendor_dir, e))?;
    }
    if let Some(parent) = vendor_dir.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| DeployError::io_error(parent, e))?;
    }

    packager
        .vendor(&job.source, vendor_dir, job.root_level)
        .await
        .map_err(|e| DeployError::packaging(&job.source, e))?;
    let archive = packager
        .archive(vendor_dir)
        .await
        .map_err(|e| DeployError::packaging(vendor_dir, e))?;

    let artifact = DeploymentArtifact::new(job.name, archive);
    let size = artifact.size();
    blob_store.put(bucket, &job.key, artifact.archive, None).await?;
    info!(artifact = %artifact.name, key = %job.key, bytes = size, "published archive");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn subdirectories_sorted_and_files_skipped() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir(dir.path().join("zeta")).unwrap();
        std::fs::create_dir(dir.path().join("alpha")).unwrap();
        std::fs::write(dir.path().join("README"), "x").unwrap();

        let names: Vec<String> = subdirectories(dir.path())
            .unwrap()
            .into_iter()
            .map(|(name, _)| name)
            .collect();
        assert_eq!(names, vec!["alpha".to_string(), "zeta".to_string()]);
    }

    #[test]
    fn missing_directory_is_io_error() {
        let dir = TempDir::new().unwrap();
        assert!(matches!(
            subdirectories(&dir.path().join("absent")),
            Err(DeployError::Io { .. })
        ));
    }
}
