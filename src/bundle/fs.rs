//! File system utilities for staging bundle contents.

use crate::error::{BundleError, FsContext};
use std::path::Path;
use tokio::fs;

/// Copies a regular file, creating parent directories of the destination.
///
/// Permissions are carried over by `fs::copy`; the modification time is
/// copied as well so archives reflect the source file.
pub async fn copy_file(from: &Path, to: &Path) -> Result<(), BundleError> {
    if let Some(dest_dir) = to.parent() {
        fs::create_dir_all(dest_dir)
            .await
            .fs_context("creating directory", dest_dir)?;
    }
    fs::copy(from, to).await.fs_context("copying", from)?;

    let modified = fs::metadata(from)
        .await
        .and_then(|m| m.modified())
        .fs_context("reading metadata of", from)?;
    let dest = std::fs::File::options()
        .write(true)
        .open(to)
        .fs_context("opening", to)?;
    dest.set_modified(modified).fs_context("setting mtime of", to)?;
    Ok(())
}

/// Recursively copies a directory, preserving its relative layout.
///
/// Symlinks are followed so the bundle contains real files.
pub async fn copy_dir(from: &Path, to: &Path) -> Result<(), BundleError> {
    if !from.is_dir() {
        return Err(BundleError::Fs {
            context: "copying directory",
            path: from.to_path_buf(),
            error: std::io::Error::new(std::io::ErrorKind::NotFound, "not a directory"),
        });
    }

    for entry in walkdir::WalkDir::new(from).follow_links(true) {
        let entry = entry?;
        let Ok(rel_path) = entry.path().strip_prefix(from) else {
            continue;
        };
        let dest_path = to.join(rel_path);

        if entry.file_type().is_dir() {
            fs::create_dir_all(&dest_path)
                .await
                .fs_context("creating directory", &dest_path)?;
        } else {
            copy_file(entry.path(), &dest_path).await?;
        }
    }
    Ok(())
}

/// Creates an empty file if it does not exist.
pub async fn touch(path: &Path) -> Result<(), BundleError> {
    fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .await
        .fs_context("touching", path)?;
    Ok(())
}
