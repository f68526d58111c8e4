//! Packaged directory ready for upload

use bytes::Bytes;

/// A named directory packaged as one gzip-compressed tar stream
///
/// Produced and consumed inside a single publish call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeploymentArtifact {
    pub name: String,
    pub archive: Bytes,
}

impl DeploymentArtifact {
    #[inline]
    #[must_use]
    pub fn new(name: impl Into<String>, archive: Bytes) -> Self {
        Self {
            name: name.into(),
            archive,
        }
    }

    /// `{name}.tar.gz`
    #[inline]
    #[must_use]
    pub fn file_name(&self) -> String {
        format!("{}.tar.gz", self.name)
    }

    #[inline]
    #[must_use]
    pub fn size(&self) -> usize {
        self.archive.len()
    }
}
