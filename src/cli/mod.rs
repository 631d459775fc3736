//! Command line interface for lambda_deploy.
//!
//! Parses arguments, loads the project config, and dispatches to the
//! bundle, deploy, image and invoke workflows.

mod args;
pub mod commands;
mod output;

pub use args::{Args, BuildArgs, Command, ImageArgs, ProjectArgs, RuntimeConfig};
pub use commands::execute_command;
pub use output::OutputManager;

use crate::error::Result;

/// Main CLI entry point
pub async fn run() -> Result<i32> {
    let args = Args::parse_args();
    execute_command(args).await
}
