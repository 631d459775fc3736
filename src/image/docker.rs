//! Docker CLI invocation.

use crate::error::ImageError;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tokio::time::timeout;

/// Timeout for the `docker info` daemon check
pub const DOCKER_INFO_TIMEOUT: Duration = Duration::from_secs(5);

#[cfg(target_os = "macos")]
const DOCKER_START_HELP: &str = "Start Docker Desktop from Applications or Spotlight";

#[cfg(target_os = "linux")]
const DOCKER_START_HELP: &str = "Start Docker daemon: sudo systemctl start docker";

#[cfg(target_os = "windows")]
const DOCKER_START_HELP: &str = "Start Docker Desktop from the Start menu";

#[cfg(not(any(target_os = "macos", target_os = "linux", target_os = "windows")))]
const DOCKER_START_HELP: &str = "Start the Docker daemon";

/// Checks that Docker is installed and the daemon responds.
pub async fn check_docker_available() -> Result<(), ImageError> {
    if which::which("docker").is_err() {
        return Err(ImageError::DockerUnavailable {
            reason: "docker command not found in PATH. Install from: https://docs.docker.com/get-docker/"
                .to_string(),
        });
    }

    let status = timeout(
        DOCKER_INFO_TIMEOUT,
        Command::new("docker")
            .arg("info")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status(),
    )
    .await;

    match status {
        Err(_) => Err(ImageError::DockerUnavailable {
            reason: format!(
                "daemon check timed out after {} seconds. {}",
                DOCKER_INFO_TIMEOUT.as_secs(),
                DOCKER_START_HELP
            ),
        }),
        Ok(Ok(status)) if status.success() => Ok(()),
        Ok(Ok(status)) => Err(ImageError::DockerUnavailable {
            reason: format!(
                "daemon is not responding (exit code: {}). {}",
                status.code().unwrap_or(-1),
                DOCKER_START_HELP
            ),
        }),
        Ok(Err(e)) => Err(ImageError::DockerUnavailable {
            reason: e.to_string(),
        }),
    }
}

/// Run a command with inherited stdio, failing on a non-zero exit.
pub async fn run(args: &[String]) -> Result<(), ImageError> {
    let rendered = args.join(" ");
    let Some((program, rest)) = args.split_first() else {
        return Err(ImageError::Spawn {
            command: rendered,
            error: std::io::Error::new(std::io::ErrorKind::InvalidInput, "empty command"),
        });
    };

    log::info!("Running: {}", rendered);
    let status = Command::new(program)
        .args(rest)
        .stdin(Stdio::null())
        .status()
        .await
        .map_err(|error| ImageError::Spawn {
            command: rendered.clone(),
            error,
        })?;

    if status.success() {
        Ok(())
    } else {
        Err(ImageError::CommandFailed {
            command: rendered,
            code: status.code().unwrap_or(-1),
        })
    }
}
