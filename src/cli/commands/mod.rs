//! Command execution functions.
//!
//! Each command loads the project config, runs one workflow and reports the
//! result. Failures are reported here with recovery suggestions.

mod build;
mod cleanup;
mod deploy;
mod helpers;
mod image;
mod init;
mod invoke;

use crate::cli::{Args, Command, RuntimeConfig};
use crate::error::Result;

use build::execute_build;
use cleanup::execute_cleanup;
use deploy::{execute_deploy, execute_deploy_image, execute_upload};
use image::{execute_build_image, execute_push_image, execute_tag_image};
use init::execute_init;
use invoke::execute_invoke;

/// Execute the main command based on parsed arguments
pub async fn execute_command(args: Args) -> Result<i32> {
    if let Err(validation_error) = args.validate() {
        // Validation errors are shown even in quiet mode
        let output = super::OutputManager::new(false, false);
        output.error(&format!("Invalid arguments: {}", validation_error));
        return Ok(1);
    }

    let config = RuntimeConfig::from(&args);
    log::debug!("Running command '{}'", args.command.name());

    let result = match &args.command {
        Command::Init { .. } => execute_init(&args, &config).await,
        Command::Build { .. } => execute_build(&args, &config).await,
        Command::Deploy { .. } | Command::DeployS3 { .. } => execute_deploy(&args, &config).await,
        Command::Upload { .. } => execute_upload(&args, &config).await,
        Command::DeployImage { .. } => execute_deploy_image(&args, &config).await,
        Command::Invoke { .. } => execute_invoke(&args, &config).await,
        Command::Cleanup { .. } => execute_cleanup(&args, &config).await,
        Command::BuildImage { .. } => execute_build_image(&args, &config).await,
        Command::TagImage { .. } => execute_tag_image(&args, &config).await,
        Command::PushImage { .. } => execute_push_image(&args, &config).await,
    };

    match result {
        Ok(()) => {
            config.success_println(&format!(
                "Command '{}' completed successfully",
                args.command.name()
            ));
            Ok(0)
        }
        Err(e) => {
            config.error_println(&format!("Command '{}' failed: {}", args.command.name(), e));

            if config.is_verbose() {
                let suggestions = e.recovery_suggestions();
                if !suggestions.is_empty() {
                    config.println("\n💡 Recovery suggestions:");
                    for suggestion in suggestions {
                        config.println(&format!("  • {}", suggestion));
                    }
                }
            }

            Ok(1)
        }
    }
}
