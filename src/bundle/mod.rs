//! Zip bundle assembly.
//!
//! A bundle is built in a temporary staging directory:
//! 1. Install dependencies into the staging root
//! 2. Copy the project's top-level files and configured source directories
//! 3. Zip the staging directory into `<project>/<dist_directory>`
//! 4. Compute the checksums that identify the artifact
//!
//! The staging directory is removed when the build finishes.

mod archive;
mod checksum;
pub mod dependencies;
mod fs;

pub use archive::archive;
pub use checksum::{code_sha256, md5_hex, staging_key, unix_timestamp};

use crate::config::{DEFAULT_CONFIG_FILE, FunctionConfig};
use crate::error::{FsContext, Result};
use chrono::{DateTime, Local};
use std::path::{Path, PathBuf};

/// Files never copied into a bundle
const IGNORED_FILES: &[&str] = &[".DS_Store"];

/// Options for a bundle build
#[derive(Debug, Clone)]
pub struct BuildOptions {
    /// Config file name, excluded from the bundle
    pub config_file: String,
    /// Requirements file; `None` bundles everything `pip freeze` reports
    pub requirements: Option<PathBuf>,
    /// Extra local packages to install
    pub local_packages: Vec<String>,
    /// Python interpreter for pip
    pub python: Option<PathBuf>,
    /// Skip dependency installation entirely
    pub skip_dependencies: bool,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            config_file: DEFAULT_CONFIG_FILE.to_string(),
            requirements: None,
            local_packages: Vec::new(),
            python: None,
            skip_dependencies: false,
        }
    }
}

/// A built zip bundle and its identity
#[derive(Debug, Clone)]
pub struct BundleArtifact {
    /// Path to the zip file
    pub path: PathBuf,
    /// Size in bytes
    pub size: u64,
    /// Hex MD5 of the archive
    pub md5: String,
    /// Base64 SHA-256 of the archive, as reported by Lambda
    pub code_sha256: String,
    /// Build time
    pub built_at: DateTime<Local>,
}

impl BundleArtifact {
    /// Inspect an existing zip file
    pub fn from_path(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path).fs_context("reading bundle", path)?;
        Ok(Self {
            path: path.to_path_buf(),
            size: bytes.len() as u64,
            md5: md5_hex(&bytes),
            code_sha256: code_sha256(&bytes),
            built_at: Local::now(),
        })
    }

    /// Read the archive bytes for an upload
    pub fn read(&self) -> Result<Vec<u8>> {
        Ok(std::fs::read(&self.path).fs_context("reading bundle", &self.path)?)
    }
}

/// Output file name, `<YYYY-MM-DD-HHMMSS>-<function_name>.zip`
pub fn output_file_name(function_name: &str, now: DateTime<Local>) -> String {
    format!("{}-{}.zip", now.format("%Y-%m-%d-%H%M%S"), function_name)
}

/// Select the project entries that go into the bundle.
///
/// Top-level regular files except ignored ones and the config file, plus any
/// top-level directory named in `source_directories`. Sorted by name.
pub fn collect_sources(
    project: &Path,
    config_file: &str,
    source_directories: &[String],
) -> Result<Vec<PathBuf>> {
    let mut sources = Vec::new();
    for entry in std::fs::read_dir(project).fs_context("listing", project)? {
        let entry = entry.fs_context("listing", project)?;
        let name = entry.file_name().to_string_lossy().to_string();
        let path = entry.path();

        if path.is_file() {
            if IGNORED_FILES.contains(&name.as_str()) || name == config_file {
                continue;
            }
            log::info!("Bundling: {:?}", name);
            sources.push(path);
        } else if path.is_dir() && source_directories.iter().any(|dir| *dir == name) {
            log::info!("Bundling directory: {:?}", name);
            sources.push(path);
        }
    }
    sources.sort();
    Ok(sources)
}

/// Build the zip bundle for a project.
pub async fn build(
    project: &Path,
    config: &FunctionConfig,
    options: &BuildOptions,
) -> Result<BundleArtifact> {
    let function_name = config.function_name()?;

    let dist_dir = project.join(config.dist_directory_or_default());
    tokio::fs::create_dir_all(&dist_dir)
        .await
        .fs_context("creating dist directory", &dist_dir)?;

    let built_at = Local::now();
    let output_name = output_file_name(function_name, built_at);

    let staging = tempfile::Builder::new()
        .prefix("aws-lambda")
        .tempdir()
        .fs_context("creating staging directory", std::env::temp_dir())?;
    log::debug!("Staging bundle in {}", staging.path().display());

    if options.skip_dependencies {
        log::info!("Skipping dependency installation");
    } else {
        let python = dependencies::find_python(options.python.as_deref())?;
        let packages = dependencies::gather_packages(
            &python,
            options.requirements.as_deref(),
            &options.local_packages,
        )
        .await?;
        dependencies::install_packages(&python, staging.path(), &packages).await?;
    }

    fix_namespace_packages(staging.path()).await?;

    let sources = collect_sources(project, &options.config_file, &config.source_directories())?;
    for source in &sources {
        let Some(name) = source.file_name() else {
            continue;
        };
        let dest = staging.path().join(name);
        if source.is_dir() {
            fs::copy_dir(source, &dest).await?;
        } else {
            fs::copy_file(source, &dest).await?;
        }
    }

    let path = archive(staging.path(), &dist_dir, &output_name)?;
    let mut artifact = BundleArtifact::from_path(&path)?;
    artifact.built_at = built_at;

    log::info!(
        "Built {} ({} bytes, md5 {})",
        artifact.path.display(),
        artifact.size,
        artifact.md5
    );
    Ok(artifact)
}

/// Namespace packages without an `__init__.py` are not importable from a zip.
/// Returns whether a package was fixed.
async fn fix_namespace_packages(staging: &Path) -> Result<bool> {
    let zope = staging.join("zope");
    if !zope.is_dir() {
        return Ok(false);
    }
    log::info!("Zope packages detected; fixing Zope package paths to make them importable.");
    fs::touch(&zope.join("__init__.py")).await?;
    Ok(true)
}
