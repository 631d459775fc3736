//! Build command implementation.

use super::helpers::{build_options, load_project};
use crate::bundle;
use crate::cli::{Args, Command, RuntimeConfig};
use crate::error::Result;

/// Execute build command
pub(super) async fn execute_build(args: &Args, config: &RuntimeConfig) -> Result<()> {
    let Command::Build { project, build } = &args.command else {
        unreachable!("execute_build called with non-Build command");
    };

    let loaded = load_project(project)?;
    config.progress(&format!("Building bundle for {}", loaded.config.function_name()?));

    let artifact =
        bundle::build(&loaded.root, &loaded.config, &build_options(project, build)).await?;

    config.success_println(&format!("Bundle written to {}", artifact.path.display()));
    config.verbose_println(&format!("size: {} bytes", artifact.size));
    config.verbose_println(&format!("md5: {}", artifact.md5));
    config.verbose_println(&format!("sha256: {}", artifact.code_sha256));
    Ok(())
}
