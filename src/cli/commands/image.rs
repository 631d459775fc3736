//! Container image commands.

use super::helpers::load_project;
use crate::cli::{Args, Command, RuntimeConfig};
use crate::error::Result;
use crate::image;

/// Execute build-image command
pub(super) async fn execute_build_image(args: &Args, config: &RuntimeConfig) -> Result<()> {
    let Command::BuildImage { project } = &args.command else {
        unreachable!("execute_build_image called with non-BuildImage command");
    };

    let loaded = load_project(project)?;
    if config.is_verbose() {
        let command = image::build_command(&loaded.config.image_build_variables)?;
        config.verbose_println(&command.join(" "));
    }
    config.progress("Building docker image");
    image::build_image(&loaded.config).await?;
    Ok(())
}

/// Execute tag-image command
pub(super) async fn execute_tag_image(args: &Args, config: &RuntimeConfig) -> Result<()> {
    let Command::TagImage {
        project,
        local_image,
        image_tag,
    } = &args.command
    else {
        unreachable!("execute_tag_image called with non-TagImage command");
    };

    let loaded = load_project(project)?;
    let target =
        image::tag_image(&loaded.config, local_image.as_deref(), image_tag.as_deref()).await?;
    config.success_println(&format!("Tagged {}", target));
    Ok(())
}

/// Execute push-image command
pub(super) async fn execute_push_image(args: &Args, config: &RuntimeConfig) -> Result<()> {
    let Command::PushImage { project, image } = &args.command else {
        unreachable!("execute_push_image called with non-PushImage command");
    };

    let loaded = load_project(project)?;
    let pushed = image::push_image(
        &loaded.config,
        image.image_uri.as_deref(),
        image.image_tag.as_deref(),
    )
    .await?;
    config.success_println(&format!("Pushed {}", pushed));
    Ok(())
}
