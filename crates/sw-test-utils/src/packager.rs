use std::path::{Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::Mutex;
use sw_core::{Packager, ToolResult};

/// A vendor call received by [`FakePackager`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VendorCall {
    pub source: PathBuf,
    pub dest: PathBuf,
    pub root_level: bool,
}

/// Packager that copies instead of resolving dependencies
///
/// `vendor` copies the source tree into `dest` (or `dest/cookbooks`);
/// `archive` returns a listing of the files under the directory, so
/// published archives can be asserted on as text.
#[derive(Debug, Default)]
pub struct FakePackager {
    vendored: Mutex<Vec<VendorCall>>,
    archived: Mutex<Vec<PathBuf>>,
}

impl FakePackager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn vendor_calls(&self) -> Vec<VendorCall> {
        self.vendored.lock().clone()
    }

    pub fn archived(&self) -> Vec<PathBuf> {
        self.archived.lock().clone()
    }
}

fn copy_tree(source: &Path, dest: &Path) -> std::io::Result<()> {
    std::fs::create_dir_all(dest)?;
    for entry in std::fs::read_dir(source)? {
        let entry = entry?;
        let target = dest.join(entry.file_name());
        if entry.file_type()?.is_dir() {
            copy_tree(&entry.path(), &target)?;
        } else {
            std::fs::copy(entry.path(), target)?;
        }
    }
    Ok(())
}

fn list_files(root: &Path, dir: &Path, out: &mut Vec<String>) -> std::io::Result<()> {
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() {
            list_files(root, &path, out)?;
        } else if let Ok(relative) = path.strip_prefix(root) {
            out.push(relative.to_string_lossy().replace('\\', "/"));
        }
    }
    Ok(())
}

#[async_trait]
impl Packager for FakePackager {
    async fn vendor(&self, source: &Path, dest: &Path, root_level: bool) -> ToolResult<()> {
        self.vendored.lock().push(VendorCall {
            source: source.to_path_buf(),
            dest: dest.to_path_buf(),
            root_level,
        });
        let target = if root_level { dest.to_path_buf() } else { dest.join("cookbooks") };
        copy_tree(source, &target)?;
        Ok(())
    }

    async fn archive(&self, dir: &Path) -> ToolResult<Bytes> {
        self.archived.lock().push(dir.to_path_buf());
        let mut files = Vec::new();
        list_files(dir, dir, &mut files)?;
        files.sort();
        Ok(Bytes::from(files.join("\n")))
    }
}
