//! Init command implementation.

use crate::cli::{Args, Command, RuntimeConfig};
use crate::error::{CliError, Result};
use crate::init::{InitOptions, init_project};
use path_absolutize::Absolutize;

/// Execute init command
pub(super) async fn execute_init(args: &Args, config: &RuntimeConfig) -> Result<()> {
    let Command::Init {
        folder,
        minimal,
        name,
        runtime,
    } = &args.command
    else {
        unreachable!("execute_init called with non-Init command");
    };

    let dir = folder
        .absolutize()
        .map_err(|e| CliError::InvalidProject {
            path: folder.clone(),
            reason: e.to_string(),
        })?
        .to_path_buf();

    let mut options = InitOptions {
        minimal: *minimal,
        ..Default::default()
    };
    if let Some(name) = name {
        options.function_name = name.clone();
    }
    if let Some(runtime) = runtime {
        options.runtime = runtime.clone();
    }

    config.verbose_println(&format!("Initializing project in {}", dir.display()));
    let report = init_project(&dir, &options)?;

    for path in &report.written {
        config.indent(&format!("created {}", path.display()));
    }
    for path in &report.skipped {
        config.warning_println(&format!("{} already exists, left unchanged", path.display()));
    }
    Ok(())
}
