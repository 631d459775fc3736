//! Cleanup command implementation.
//!
//! Removes old published versions of the function.

use super::helpers::load_project;
use crate::aws::AwsClients;
use crate::cli::{Args, Command, RuntimeConfig};
use crate::deploy::{CleanupOutcome, Deployer};
use crate::error::Result;

/// Execute cleanup command
pub(super) async fn execute_cleanup(args: &Args, config: &RuntimeConfig) -> Result<()> {
    let Command::Cleanup { project, keep_last } = &args.command else {
        unreachable!("execute_cleanup called with non-Cleanup command");
    };

    let loaded = load_project(project)?;
    let clients = AwsClients::connect(&loaded.config).await;
    let deployer = Deployer::new(&clients.lambda, &clients.s3, &clients.sts, &loaded.config);

    config.verbose_println(&format!("Keeping the last {} version(s)", keep_last));
    match deployer.cleanup_old_versions(*keep_last).await? {
        CleanupOutcome::Refused => {
            config.warning_println("Won't delete all versions. Please do this manually");
        }
        CleanupOutcome::NothingToDelete => {
            config.println("Nothing to delete. (Too few versions published)");
        }
        CleanupOutcome::Deleted { deleted, skipped } => {
            for version in &deleted {
                config.indent(&format!("deleted version {}", version));
            }
            for (version, reason) in &skipped {
                config.warning_println(&format!("Skipping Version {}: {}", version, reason));
            }
            config.println(&format!(
                "Deleted {} version(s), skipped {}",
                deleted.len(),
                skipped.len()
            ));
        }
    }
    Ok(())
}
