//! Deploy command implementations.
//!
//! `deploy`, `deploy-s3` and `upload` build a fresh bundle before talking
//! to AWS; `deploy-image` only points the function at an already pushed
//! image.

use super::helpers::{build_options, load_project, print_outcome};
use crate::aws::AwsClients;
use crate::bundle;
use crate::cli::{Args, Command, RuntimeConfig};
use crate::deploy::Deployer;
use crate::error::Result;

/// Execute deploy and deploy-s3 commands
pub(super) async fn execute_deploy(args: &Args, config: &RuntimeConfig) -> Result<()> {
    let (project, build, preserve_vpc, staged) = match &args.command {
        Command::Deploy {
            project,
            build,
            preserve_vpc,
        } => (project, build, *preserve_vpc, false),
        Command::DeployS3 {
            project,
            build,
            preserve_vpc,
        } => (project, build, *preserve_vpc, true),
        _ => unreachable!("execute_deploy called with non-deploy command"),
    };

    let loaded = load_project(project)?;
    config.progress("Building bundle");
    let artifact =
        bundle::build(&loaded.root, &loaded.config, &build_options(project, build)).await?;
    config.verbose_println(&format!("Bundle: {}", artifact.path.display()));

    let clients = AwsClients::connect(&loaded.config).await;
    let deployer = Deployer::new(&clients.lambda, &clients.s3, &clients.sts, &loaded.config);

    let outcome = if staged {
        config.progress("Uploading bundle to S3 and deploying");
        deployer.deploy_staged(&artifact, preserve_vpc).await?
    } else {
        config.progress("Deploying bundle");
        deployer.deploy_zip(&artifact, preserve_vpc).await?
    };

    print_outcome(config, &outcome);
    Ok(())
}

/// Execute upload command
pub(super) async fn execute_upload(args: &Args, config: &RuntimeConfig) -> Result<()> {
    let Command::Upload { project, build } = &args.command else {
        unreachable!("execute_upload called with non-Upload command");
    };

    let loaded = load_project(project)?;
    config.progress("Building bundle");
    let artifact =
        bundle::build(&loaded.root, &loaded.config, &build_options(project, build)).await?;

    let clients = AwsClients::connect(&loaded.config).await;
    let deployer = Deployer::new(&clients.lambda, &clients.s3, &clients.sts, &loaded.config);
    let staged = deployer.upload(&artifact).await?;

    config.success_println(&format!("Uploaded to s3://{}/{}", staged.bucket, staged.key));
    Ok(())
}

/// Execute deploy-image command
pub(super) async fn execute_deploy_image(args: &Args, config: &RuntimeConfig) -> Result<()> {
    let Command::DeployImage {
        project,
        image,
        preserve_vpc,
    } = &args.command
    else {
        unreachable!("execute_deploy_image called with non-DeployImage command");
    };

    let loaded = load_project(project)?;
    let image_uri = loaded
        .config
        .image_uri(image.image_uri.as_deref(), image.image_tag.as_deref())?;
    config.progress(&format!("Deploying image {}", image_uri));

    let clients = AwsClients::connect(&loaded.config).await;
    let deployer = Deployer::new(&clients.lambda, &clients.s3, &clients.sts, &loaded.config);
    let outcome = deployer.deploy_image(&image_uri, *preserve_vpc).await?;

    print_outcome(config, &outcome);
    Ok(())
}
