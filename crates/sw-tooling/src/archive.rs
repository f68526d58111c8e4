//! Tar and gzip archives of vendored directories

use std::io::Write;
use std::path::{Path, PathBuf};

use bytes::Bytes;
use flate2::write::GzEncoder;
use flate2::Compression;
use tokio::task::spawn_blocking;
use tracing::debug;

use crate::error::{ToolingError, ToolingResult};

/// Archive the contents of `src` as a `.tar.gz`
///
/// Entries are stored relative to `src`, in sorted order. Symbolic links
/// are stored as links and never descended into.
///
/// # Errors
/// - `ToolingError::Io` if the directory cannot be read
pub async fn gzip_directory(src: &Path) -> ToolingResult<Bytes> {
    let src = src.to_owned();
    spawn_blocking(move || gzip_directory_sync(&src))
        .await
        .map_err(|e| ToolingError::Task(e.to_string()))?
}

fn gzip_directory_sync(src: &Path) -> ToolingResult<Bytes> {
    let io = |e| ToolingError::io_error(src, e);

    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    {
        let mut builder = tar::Builder::new(&mut encoder);
        builder.follow_symlinks(false);

        for (path, is_dir) in walk(src).map_err(io)? {
            let relative = path
                .strip_prefix(src)
                .map_err(|e| io(std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())))?;
            if is_dir {
                builder.append_dir(relative, &path).map_err(io)?;
            } else {
                builder.append_path_with_name(&path, relative).map_err(io)?;
            }
        }
        builder.finish().map_err(io)?;
    }
    encoder.flush().map_err(io)?;
    let compressed = encoder.finish().map_err(io)?;

    debug!(dir = %src.display(), compressed_size = compressed.len(), "archived directory");
    Ok(Bytes::from(compressed))
}

/// Paths under `dir` with whether each is a real directory
fn walk(dir: &Path) -> std::io::Result<Vec<(PathBuf, bool)>> {
    let mut entries = std::fs::read_dir(dir)?
        .map(|entry| entry.and_then(|e| Ok((e.path(), e.file_type()?.is_dir()))))
        .collect::<std::io::Result<Vec<_>>>()?;
    entries.sort();

    let mut paths = Vec::with_capacity(entries.len());
    for (path, is_dir) in entries {
        paths.push((path.clone(), is_dir));
        if is_dir {
            paths.extend(walk(&path)?);
        }
    }
    Ok(paths)
}
