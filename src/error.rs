//! Error types for lambda_deploy operations.
//!
//! This module defines all error types with actionable error messages and recovery suggestions.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for lambda_deploy operations
pub type Result<T> = std::result::Result<T, DeployError>;

/// Main error type for all lambda_deploy operations
#[derive(Error, Debug)]
pub enum DeployError {
    /// Configuration errors
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    /// Bundle assembly errors
    #[error("Bundle error: {0}")]
    Bundle(#[from] BundleError),

    /// Cloud API errors
    #[error("AWS error: {0}")]
    Aws(#[from] AwsError),

    /// Container toolchain errors
    #[error("Image error: {0}")]
    Image(#[from] ImageError),

    /// Local invocation errors
    #[error("Invoke error: {0}")]
    Invoke(#[from] InvokeError),

    /// CLI argument errors
    #[error("CLI error: {0}")]
    Cli(#[from] CliError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Configuration file errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Config file missing
    #[error("Config file not found at {path}")]
    NotFound {
        /// Path where the config was expected
        path: PathBuf,
    },

    /// Config file is not valid YAML for the expected schema
    #[error("Failed to parse {path}: {source}")]
    Parse {
        /// Path of the config file
        path: PathBuf,
        /// Parser error
        #[source]
        source: serde_yaml::Error,
    },

    /// A key required by the current operation is absent
    #[error("'{key}' must be set in the config file")]
    MissingKey {
        /// Config key name
        key: &'static str,
    },
}

/// Errors while assembling a zip bundle
#[derive(Error, Debug)]
pub enum BundleError {
    /// File system error with path context
    #[error("{context} {path}: {error}")]
    Fs {
        /// Operation being performed (e.g. "copying")
        context: &'static str,
        /// Path that was being accessed
        path: PathBuf,
        /// The underlying I/O error
        error: std::io::Error,
    },

    /// Zip writer error
    #[error("Failed to write archive: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// Directory walk error
    #[error("Failed to walk directory: {0}")]
    Walk(#[from] walkdir::Error),

    /// Dependency installation failed
    #[error("Dependency installation failed: {command} - {reason}")]
    Dependencies {
        /// Command that failed
        command: String,
        /// Reason for the error
        reason: String,
    },

    /// Project template rendering failed
    #[error("Template error: {0}")]
    Template(#[from] handlebars::RenderError),
}

/// Errors returned by the cloud APIs
#[derive(Error, Debug)]
pub enum AwsError {
    /// The target function does not exist
    #[error("Function '{name}' not found")]
    FunctionNotFound {
        /// Function name
        name: String,
    },

    /// An API call failed
    #[error("{operation} failed: {reason}")]
    Api {
        /// API operation name
        operation: &'static str,
        /// Error reported by the SDK
        reason: String,
    },

    /// The function's last update did not reach a successful state
    #[error("Function '{name}' update {status}: {reason}")]
    UpdateFailed {
        /// Function name
        name: String,
        /// Final update status
        status: String,
        /// Reason reported by the service
        reason: String,
    },

    /// Waiting for the function update timed out
    #[error("Timed out waiting for function '{name}' to finish updating after {attempts} attempts")]
    WaitTimeout {
        /// Function name
        name: String,
        /// Number of polls performed
        attempts: u32,
    },
}

impl AwsError {
    /// Wrap an SDK error with the operation name
    pub fn api(operation: &'static str, error: impl std::fmt::Display) -> Self {
        AwsError::Api {
            operation,
            reason: error.to_string(),
        }
    }
}

/// Container toolchain errors
#[derive(Error, Debug)]
pub enum ImageError {
    /// Docker is not installed or the daemon does not respond
    #[error("Docker is not available: {reason}")]
    DockerUnavailable {
        /// Reason for the error
        reason: String,
    },

    /// A docker command exited unsuccessfully
    #[error("Command `{command}` failed with exit code {code}")]
    CommandFailed {
        /// Rendered command line
        command: String,
        /// Exit code (-1 when killed by a signal)
        code: i32,
    },

    /// A docker command could not be spawned
    #[error("Failed to run `{command}`: {error}")]
    Spawn {
        /// Rendered command line
        command: String,
        /// The underlying I/O error
        error: std::io::Error,
    },
}

/// Local invocation errors
#[derive(Error, Debug)]
pub enum InvokeError {
    /// Handler string is not `<module>.<function>`
    #[error("Invalid handler '{handler}': expected <module>.<function>")]
    InvalidHandler {
        /// Handler value from the config
        handler: String,
    },

    /// Event file could not be read or parsed
    #[error("Failed to read event file {path}: {reason}")]
    Event {
        /// Event file path
        path: PathBuf,
        /// Reason for the error
        reason: String,
    },

    /// No interpreter could be located
    #[error("Python interpreter not found: {0}")]
    InterpreterNotFound(String),

    /// Handler exceeded its configured timeout
    #[error("Task timed out after {seconds} seconds")]
    Timeout {
        /// Configured timeout
        seconds: u64,
    },

    /// Handler raised or the process exited unsuccessfully
    #[error("Handler failed (exit code {code}): {stderr}")]
    HandlerFailed {
        /// Exit code (-1 when killed by a signal)
        code: i32,
        /// Captured standard error
        stderr: String,
    },
}

/// CLI-specific errors
#[derive(Error, Debug)]
pub enum CliError {
    /// Project directory problems
    #[error("Project directory {path} is not usable: {reason}")]
    InvalidProject {
        /// Project path
        path: PathBuf,
        /// Reason for the error
        reason: String,
    },
}

impl DeployError {
    /// Get actionable recovery suggestions for this error
    pub fn recovery_suggestions(&self) -> Vec<String> {
        match self {
            DeployError::Config(ConfigError::NotFound { path }) => vec![
                format!("Create {} or run `lambda_deploy init`", path.display()),
                "Pass --config-file to point at a differently named config".to_string(),
            ],
            DeployError::Config(ConfigError::MissingKey { key }) => {
                vec![format!("Add '{}' to config.yaml", key)]
            }
            DeployError::Aws(AwsError::FunctionNotFound { .. }) => vec![
                "Create the function first with `lambda_deploy deploy`".to_string(),
                "Check LAMBDA_FUNCTION_NAME and the configured region".to_string(),
            ],
            DeployError::Aws(AwsError::Api { .. }) => vec![
                "Verify credentials: aws sts get-caller-identity".to_string(),
                "Check the profile and region used for the call".to_string(),
            ],
            DeployError::Image(ImageError::DockerUnavailable { .. }) => vec![
                "Install Docker: https://docs.docker.com/get-docker/".to_string(),
                "Start the Docker daemon and retry".to_string(),
            ],
            DeployError::Image(ImageError::CommandFailed { .. }) => vec![
                "Log in to the registry: aws ecr get-login-password | docker login".to_string(),
            ],
            DeployError::Bundle(BundleError::Dependencies { .. }) => vec![
                "Check the requirements file for typos".to_string(),
                "Use --no-deps to bundle only the project files".to_string(),
            ],
            _ => vec!["Check the error message above for specific details".to_string()],
        }
    }
}

/// Attach a path to an `io::Error`
pub trait FsContext<T> {
    /// Map the error into [`BundleError::Fs`]
    fn fs_context(self, context: &'static str, path: impl Into<PathBuf>) -> std::result::Result<T, BundleError>;
}

impl<T> FsContext<T> for std::result::Result<T, std::io::Error> {
    fn fs_context(self, context: &'static str, path: impl Into<PathBuf>) -> std::result::Result<T, BundleError> {
        self.map_err(|error| BundleError::Fs {
            context,
            path: path.into(),
            error,
        })
    }
}
