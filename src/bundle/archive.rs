//! Zip archive creation.

use crate::error::{BundleError, FsContext};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

/// Zip every file under `src_dir` into `dest_dir/file_name`.
///
/// Entry names are relative to `src_dir` and always use `/` separators.
/// `.zip` is appended to `file_name` when missing. Unix permission bits are
/// preserved so executables stay executable in the deployed bundle.
pub fn archive(src_dir: &Path, dest_dir: &Path, file_name: &str) -> Result<PathBuf, BundleError> {
    let file_name = if file_name.ends_with(".zip") {
        file_name.to_string()
    } else {
        format!("{file_name}.zip")
    };
    let zip_path = dest_dir.join(file_name);

    let file = File::create(&zip_path).fs_context("creating archive", &zip_path)?;
    let mut writer = ZipWriter::new(BufWriter::new(file));
    let base_options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    let mut entries: Vec<_> = WalkDir::new(src_dir)
        .follow_links(true)
        .into_iter()
        .collect::<Result<_, _>>()?;
    // Deterministic entry order
    entries.sort_by(|a, b| a.path().cmp(b.path()));

    let mut files_added = 0usize;
    for entry in entries {
        let path = entry.path();
        let Ok(rel_path) = path.strip_prefix(src_dir) else {
            continue;
        };
        if rel_path.as_os_str().is_empty() {
            continue;
        }
        let name = entry_name(rel_path);
        let options = base_options.unix_permissions(unix_mode(&entry));

        if entry.file_type().is_dir() {
            writer.add_directory(format!("{name}/"), options)?;
        } else {
            writer.start_file(name, options)?;
            let mut source = File::open(path).fs_context("opening", path)?;
            std::io::copy(&mut source, &mut writer).fs_context("archiving", path)?;
            files_added += 1;
        }
    }

    let mut inner = writer.finish()?;
    inner.flush().fs_context("flushing archive", &zip_path)?;

    log::debug!("Archived {} files into {}", files_added, zip_path.display());
    Ok(zip_path)
}

fn entry_name(rel_path: &Path) -> String {
    rel_path
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(unix)]
fn unix_mode(entry: &walkdir::DirEntry) -> u32 {
    use std::os::unix::fs::PermissionsExt;
    entry
        .metadata()
        .map(|m| m.permissions().mode() & 0o7777)
        .unwrap_or(if entry.file_type().is_dir() { 0o755 } else { 0o644 })
}

#[cfg(not(unix))]
fn unix_mode(entry: &walkdir::DirEntry) -> u32 {
    if entry.file_type().is_dir() { 0o755 } else { 0o644 }
}
