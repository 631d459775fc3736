//! Shared helper functions for command execution.

use crate::bundle::BuildOptions;
use crate::cli::{BuildArgs, ProjectArgs, RuntimeConfig};
use crate::config::FunctionConfig;
use crate::deploy::{DeployAction, DeployOutcome};
use crate::error::{CliError, Result};
use path_absolutize::Absolutize;
use std::path::PathBuf;

/// A project directory with its loaded config
pub(super) struct Project {
    pub root: PathBuf,
    pub config: FunctionConfig,
}

/// Resolve the project directory and load its config
pub(super) fn load_project(args: &ProjectArgs) -> Result<Project> {
    let root = args
        .src
        .absolutize()
        .map_err(|e| CliError::InvalidProject {
            path: args.src.clone(),
            reason: e.to_string(),
        })?
        .to_path_buf();

    if !root.is_dir() {
        return Err(CliError::InvalidProject {
            path: root,
            reason: "not a directory".to_string(),
        }
        .into());
    }

    let config = FunctionConfig::load(&root.join(&args.config_file), args.profile.as_deref())?;
    Ok(Project { root, config })
}

/// Bundle options from the command line
pub(super) fn build_options(project: &ProjectArgs, build: &BuildArgs) -> BuildOptions {
    BuildOptions {
        config_file: project.config_file.clone(),
        requirements: build.requirements.clone(),
        local_packages: build.local_packages.clone(),
        python: build.python.clone(),
        skip_dependencies: build.no_deps,
    }
}

/// Report a finished deploy
pub(super) fn print_outcome(config: &RuntimeConfig, outcome: &DeployOutcome) {
    let verb = match outcome.action {
        DeployAction::Created => "Created",
        DeployAction::Updated => "Updated",
    };
    config.success_println(&format!("{} function {}", verb, outcome.function_name));
    config.indent(&format!("code: {}", outcome.code));
    if let Some(arn) = &outcome.function_arn {
        config.indent(&format!("arn:  {}", arn));
    }
}
