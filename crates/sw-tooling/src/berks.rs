//! Berkshelf packaging
//!
//! `berks vendor` resolves a definition directory's dependencies into a
//! vendor directory, which is then archived for publication.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;
use sw_core::{Packager, ToolResult};
use tracing::{debug, instrument};

use crate::archive::gzip_directory;
use crate::command::{run, ToolPaths};
use crate::error::ToolingResult;

/// Subdirectory receiving cookbooks when not vendoring at root level
pub const COOKBOOKS_DIR: &str = "cookbooks";

/// Berksfile inside a definition directory
pub const BERKSFILE: &str = "Berksfile";

/// [`Packager`] backed by the `berks` executable
#[derive(Debug, Clone, Default)]
pub struct BerksPackager {
    paths: ToolPaths,
}

impl BerksPackager {
    #[must_use]
    pub fn new(paths: ToolPaths) -> Self {
        Self { paths }
    }

    /// Where `berks vendor` writes for a given destination
    #[must_use]
    pub fn vendor_target(dest: &Path, root_level: bool) -> PathBuf {
        if root_level {
            dest.to_path_buf()
        } else {
            dest.join(COOKBOOKS_DIR)
        }
    }

    /// Vendor `source` into `dest`
    ///
    /// # Errors
    /// - `ToolingError::CommandFailed` if `berks vendor` fails
    #[instrument(skip_all, fields(source = %source.display(), root_level = root_level))]
    pub async fn vendor_into(&self, source: &Path, dest: &Path, root_level: bool) -> ToolingResult<()> {
        let target = Self::vendor_target(dest, root_level);
        let berksfile = source.join(BERKSFILE);
        let output = run(
            &self.paths.berks,
            [
                OsStr::new("vendor"),
                target.as_os_str(),
                OsStr::new("--berksfile"),
                berksfile.as_os_str(),
            ],
            Some(source),
            self.paths.timeout,
        )
        .await?;
        debug!(dest = %target.display(), duration_secs = output.duration.as_secs_f32(), "vendored");
        Ok(())
    }
}

#[async_trait]
impl Packager for BerksPackager {
    async fn vendor(&self, source: &Path, dest: &Path, root_level: bool) -> ToolResult<()> {
        Ok(self.vendor_into(source, dest, root_level).await?)
    }

    async fn archive(&self, dir: &Path) -> ToolResult<Bytes> {
        Ok(gzip_directory(dir).await?)
    }
}
