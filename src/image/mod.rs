//! Container image pipeline: build, tag and push with the docker CLI.
//!
//! Command lines are built from the config first and run second, so the
//! exact invocations can be inspected (and tested) without docker.

mod docker;

pub use docker::{DOCKER_INFO_TIMEOUT, check_docker_available};

use crate::config::{BUILD_PATH_KEY, FunctionConfig};
use crate::error::{ConfigError, Result};
use std::collections::BTreeMap;

/// Flags forced onto every image build; Lambda rejects provenance manifests
const FORCED_BUILD_VARIABLES: &[(&str, &str)] = &[("--provenance", "false")];

/// `docker buildx build <flag>=<value>... <build_path>`
pub fn build_command(variables: &BTreeMap<String, String>) -> Result<Vec<String>> {
    let mut variables = variables.clone();
    for (key, value) in FORCED_BUILD_VARIABLES {
        variables.insert(key.to_string(), value.to_string());
    }
    let build_path = variables
        .remove(BUILD_PATH_KEY)
        .ok_or(ConfigError::MissingKey {
            key: "image_build_variables.build_path",
        })?;

    let mut command = vec!["docker".to_string(), "buildx".to_string(), "build".to_string()];
    command.extend(variables.iter().map(|(key, value)| format!("{key}={value}")));
    command.push(build_path);
    Ok(command)
}

/// `docker tag <local_image> <target>`
pub fn tag_command(local_image: &str, target: &str) -> Vec<String> {
    vec![
        "docker".to_string(),
        "tag".to_string(),
        local_image.to_string(),
        target.to_string(),
    ]
}

/// `docker push <image_uri>`
pub fn push_command(image_uri: &str) -> Vec<String> {
    vec!["docker".to_string(), "push".to_string(), image_uri.to_string()]
}

/// Local image name, from the argument or the `--tag` build variable
pub fn local_image(config: &FunctionConfig, explicit: Option<&str>) -> Result<String> {
    explicit
        .map(str::to_string)
        .or_else(|| config.image_build_variables.get("--tag").cloned())
        .ok_or_else(|| {
            ConfigError::MissingKey {
                key: "image_build_variables.--tag",
            }
            .into()
        })
}

/// Build the image described by `image_build_variables`
pub async fn build_image(config: &FunctionConfig) -> Result<()> {
    let command = build_command(&config.image_build_variables)?;
    log::info!("Building docker image with command: {:?}", command);
    check_docker_available().await?;
    docker::run(&command).await?;
    Ok(())
}

/// Tag a local image with the ECR URI, returning the URI
pub async fn tag_image(
    config: &FunctionConfig,
    local: Option<&str>,
    tag: Option<&str>,
) -> Result<String> {
    let local = local_image(config, local)?;
    let target = config.ecr_uri(tag.or(config.lambda_image_tag.as_deref()))?;
    let command = tag_command(&local, &target);
    check_docker_available().await?;
    docker::run(&command).await?;
    Ok(target)
}

/// Push the resolved image URI, returning it
pub async fn push_image(
    config: &FunctionConfig,
    uri: Option<&str>,
    tag: Option<&str>,
) -> Result<String> {
    let image_uri = config.image_uri(uri, tag)?;
    let command = push_command(&image_uri);
    check_docker_available().await?;
    docker::run(&command).await?;
    Ok(image_uri)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn build_command_puts_context_last_and_disables_provenance() {
        let command = build_command(&vars(&[
            ("--tag", "my-fn:latest"),
            ("--platform", "linux/amd64"),
            ("build_path", "./app"),
            ("--provenance", "true"),
        ]))
        .unwrap();
        assert_eq!(
            command,
            vec![
                "docker",
                "buildx",
                "build",
                "--platform=linux/amd64",
                "--provenance=false",
                "--tag=my-fn:latest",
                "./app",
            ]
        );
    }

    #[test]
    fn build_command_requires_build_path() {
        let err = build_command(&vars(&[("--tag", "x")])).unwrap_err();
        assert!(err.to_string().contains("build_path"));
    }

    #[test]
    fn local_image_falls_back_to_tag_variable() {
        let config = FunctionConfig::from_yaml("image_build_variables:\n  --tag: fn:dev\n").unwrap();
        assert_eq!(local_image(&config, None).unwrap(), "fn:dev");
        assert_eq!(local_image(&config, Some("other")).unwrap(), "other");
        assert!(local_image(&FunctionConfig::default(), None).is_err());
    }

    #[test]
    fn tag_and_push_commands() {
        assert_eq!(
            tag_command("fn:dev", "1.dkr.ecr.us-east-1.amazonaws.com/fn:v1"),
            vec!["docker", "tag", "fn:dev", "1.dkr.ecr.us-east-1.amazonaws.com/fn:v1"]
        );
        assert_eq!(push_command("repo/fn:v1"), vec!["docker", "push", "repo/fn:v1"]);
    }
}
