//! Installing the project's Python dependencies into the staging directory.

use crate::error::BundleError;
use std::path::{Path, PathBuf};
use tokio::process::Command;

/// Requirement line prefixes that are never installed into a bundle
const BLOCKLIST: &[&str] = &["-i", "#", "Python==", "python-lambda=="];

/// Locate a Python interpreter: the explicit one, else `python3`, else `python`.
pub fn find_python(explicit: Option<&Path>) -> Result<PathBuf, BundleError> {
    if let Some(path) = explicit {
        return Ok(path.to_path_buf());
    }
    which::which("python3")
        .or_else(|_| which::which("python"))
        .map_err(|e| BundleError::Dependencies {
            command: "which python3".to_string(),
            reason: e.to_string(),
        })
}

/// Filter requirement lines down to installable package specifiers.
///
/// Blank lines, comments, index options and the interpreter itself are
/// dropped; editable installs (`-e <path>`) are installed as plain paths.
pub fn filter_packages<I, S>(lines: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    lines
        .into_iter()
        .map(|line| line.as_ref().trim().to_string())
        .filter(|line| !line.is_empty())
        .filter(|line| !BLOCKLIST.iter().any(|prefix| line.starts_with(prefix)))
        .map(|line| match line.strip_prefix("-e ") {
            Some(rest) => rest.trim().to_string(),
            None => line,
        })
        .collect()
}

/// Gather the packages to install.
///
/// With a requirements file its lines are used (a missing file yields no
/// packages); otherwise the active environment's `pip freeze`. Local
/// packages are appended either way.
pub async fn gather_packages(
    python: &Path,
    requirements: Option<&Path>,
    local_packages: &[String],
) -> Result<Vec<String>, BundleError> {
    let mut lines: Vec<String> = match requirements {
        Some(path) if path.is_file() => {
            log::info!("Gathering requirement packages from {}", path.display());
            tokio::fs::read_to_string(path)
                .await
                .map_err(|e| BundleError::Fs {
                    context: "reading requirements",
                    path: path.to_path_buf(),
                    error: e,
                })?
                .lines()
                .map(str::to_string)
                .collect()
        }
        Some(path) => {
            log::warn!("Requirements file {} not found", path.display());
            Vec::new()
        }
        None => {
            log::info!("Gathering pip packages");
            pip_freeze(python).await?
        }
    };

    if lines.is_empty() {
        log::warn!("No dependency packages installed!");
    }
    lines.extend(local_packages.iter().cloned());
    Ok(filter_packages(lines))
}

async fn pip_freeze(python: &Path) -> Result<Vec<String>, BundleError> {
    let command = format!("{} -m pip freeze", python.display());
    let output = Command::new(python)
        .args(["-m", "pip", "freeze"])
        .output()
        .await
        .map_err(|e| BundleError::Dependencies {
            command: command.clone(),
            reason: e.to_string(),
        })?;

    if !output.status.success() {
        return Err(BundleError::Dependencies {
            command,
            reason: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }
    Ok(String::from_utf8_lossy(&output.stdout)
        .lines()
        .map(str::to_string)
        .collect())
}

/// Install each package into `target` with `pip install -t`.
pub async fn install_packages(
    python: &Path,
    target: &Path,
    packages: &[String],
) -> Result<(), BundleError> {
    for package in packages {
        log::info!("Installing {}", package);
        let status = Command::new(python)
            .args(["-m", "pip", "install", package.as_str(), "-t"])
            .arg(target)
            .arg("--ignore-installed")
            .status()
            .await
            .map_err(|e| BundleError::Dependencies {
                command: format!("pip install {package}"),
                reason: e.to_string(),
            })?;

        if !status.success() {
            return Err(BundleError::Dependencies {
                command: format!("pip install {package}"),
                reason: format!("exit code {}", status.code().unwrap_or(-1)),
            });
        }
    }
    Ok(())
}
