//! Function configuration loaded from the project's `config.yaml`.
//!
//! The config is read once per invocation and used to populate API requests.
//! Every key is optional at parse time; operations check for the keys they need
//! and fail with [`ConfigError::MissingKey`] before any API call is issued.

mod arn;
mod env;

pub use arn::{ecr_uri, partition_for_region, role_arn};
pub use env::resolve_env_value;

use crate::error::{ConfigError, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;

/// Default config file name inside a project directory
pub const DEFAULT_CONFIG_FILE: &str = "config.yaml";

/// Default function timeout in seconds
pub const DEFAULT_TIMEOUT: i32 = 15;

/// Default function memory in MB
pub const DEFAULT_MEMORY_SIZE: i32 = 512;

/// Runtime used on create when the config does not name one
pub const DEFAULT_RUNTIME: &str = "python3.12";

/// Execution role used when the config does not name one
pub const DEFAULT_ROLE: &str = "lambda_basic_execution";

/// Staging key prefix used when the config does not name one
pub const DEFAULT_S3_KEY_PREFIX: &str = "/dist";

/// Output directory for zip bundles, relative to the project
pub const DEFAULT_DIST_DIRECTORY: &str = "dist";

/// Environment variable that overrides the staging bucket
pub const BUCKET_ENV: &str = "S3_BUCKET_NAME";

/// Environment variable that overrides the function name
pub const FUNCTION_NAME_ENV: &str = "LAMBDA_FUNCTION_NAME";

/// Environment variable naming the AWS profile when no flag is given
pub const PROFILE_ENV: &str = "AWS_PROFILE";

/// Image build variable naming the docker build context
pub const BUILD_PATH_KEY: &str = "build_path";

/// Function configuration record
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct FunctionConfig {
    /// Function name
    pub function_name: Option<String>,
    /// Runtime identifier (e.g. `python3.12`)
    pub runtime: Option<String>,
    /// Execution role name or ARN
    pub role: Option<String>,
    /// `<module>.<function>` entry point
    pub handler: Option<String>,
    /// Function description
    pub description: Option<String>,
    /// AWS region
    pub region: Option<String>,
    /// Named credentials profile
    pub profile: Option<String>,
    /// Static access key
    pub aws_access_key_id: Option<String>,
    /// Static secret key
    pub aws_secret_access_key: Option<String>,
    /// Timeout in seconds
    pub timeout: Option<i32>,
    /// Memory in MB
    pub memory_size: Option<i32>,
    /// VPC subnets
    pub subnet_ids: Vec<String>,
    /// VPC security groups
    pub security_group_ids: Vec<String>,
    /// Reserved concurrent executions
    pub concurrency: Option<i64>,
    /// Resource tags
    pub tags: Option<BTreeMap<String, serde_yaml::Value>>,
    /// Function environment
    pub environment_variables: Option<BTreeMap<String, serde_yaml::Value>>,
    /// Staging bucket
    pub bucket_name: Option<String>,
    /// Staging key prefix
    pub s3_key_prefix: Option<String>,
    /// Bundle output directory
    pub dist_directory: Option<String>,
    /// Bundle build options
    pub build: BuildSection,
    /// Flags passed to `docker buildx build`
    pub image_build_variables: BTreeMap<String, String>,
    /// Account owning the ECR repository
    pub aws_account_id: Option<String>,
    /// ECR repository name
    pub ecr_repository: Option<String>,
    /// Full image URI
    pub lambda_image_uri: Option<String>,
    /// Image tag appended to the composed ECR URI
    pub lambda_image_tag: Option<String>,
}

/// `build:` section of the config
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct BuildSection {
    /// Comma-separated directories copied into the bundle
    pub source_directories: Option<String>,
}

/// VPC attachment sent with create/update requests
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VpcSettings {
    /// Subnet ids
    pub subnet_ids: Vec<String>,
    /// Security group ids
    pub security_group_ids: Vec<String>,
}

impl FunctionConfig {
    /// Load and parse a config file.
    ///
    /// `profile` (from the command line) wins over `AWS_PROFILE`, which wins
    /// over the `profile` key in the file.
    pub fn load(path: &Path, profile: Option<&str>) -> Result<Self> {
        Self::load_with(path, profile, process_env)
    }

    fn load_with(
        path: &Path,
        profile: Option<&str>,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self> {
        if !path.is_file() {
            return Err(ConfigError::NotFound {
                path: path.to_path_buf(),
            }
            .into());
        }
        let contents = std::fs::read_to_string(path)?;
        let mut config = Self::from_yaml(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

        if let Some(profile) = profile {
            config.profile = Some(profile.to_string());
        } else if let Some(profile) = env(PROFILE_ENV) {
            config.profile = Some(profile);
        }

        log::debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Parse config from a YAML string. An empty document yields the defaults.
    pub fn from_yaml(contents: &str) -> std::result::Result<Self, serde_yaml::Error> {
        if contents.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(contents)
    }

    /// Function name from the config file, ignoring environment overrides
    pub fn function_name(&self) -> Result<&str> {
        self.function_name
            .as_deref()
            .ok_or_else(|| ConfigError::MissingKey { key: "function_name" }.into())
    }

    /// Function name with `LAMBDA_FUNCTION_NAME` taking precedence
    pub fn effective_function_name(&self) -> Result<String> {
        self.effective_function_name_with(process_env)
    }

    fn effective_function_name_with(&self, env: impl Fn(&str) -> Option<String>) -> Result<String> {
        match non_empty(env(FUNCTION_NAME_ENV)) {
            Some(name) => Ok(name),
            None => self.function_name().map(str::to_string),
        }
    }

    /// Staging bucket with `S3_BUCKET_NAME` taking precedence
    pub fn effective_bucket_name(&self) -> Result<String> {
        self.effective_bucket_name_with(process_env)
    }

    fn effective_bucket_name_with(&self, env: impl Fn(&str) -> Option<String>) -> Result<String> {
        non_empty(env(BUCKET_ENV))
            .or_else(|| self.bucket_name.clone())
            .ok_or_else(|| ConfigError::MissingKey { key: "bucket_name" }.into())
    }

    /// Handler entry point
    pub fn handler(&self) -> Result<&str> {
        self.handler
            .as_deref()
            .ok_or_else(|| ConfigError::MissingKey { key: "handler" }.into())
    }

    /// Runtime for new functions
    pub fn runtime_or_default(&self) -> &str {
        self.runtime.as_deref().unwrap_or(DEFAULT_RUNTIME)
    }

    /// Role name or ARN
    pub fn role_or_default(&self) -> &str {
        self.role.as_deref().unwrap_or(DEFAULT_ROLE)
    }

    /// Description, empty when unset
    pub fn description_or_default(&self) -> &str {
        self.description.as_deref().unwrap_or("")
    }

    /// Timeout in seconds
    pub fn timeout_or_default(&self) -> i32 {
        self.timeout.unwrap_or(DEFAULT_TIMEOUT)
    }

    /// Memory in MB
    pub fn memory_size_or_default(&self) -> i32 {
        self.memory_size.unwrap_or(DEFAULT_MEMORY_SIZE)
    }

    /// Staging key prefix
    pub fn s3_key_prefix_or_default(&self) -> &str {
        self.s3_key_prefix.as_deref().unwrap_or(DEFAULT_S3_KEY_PREFIX)
    }

    /// Bundle output directory
    pub fn dist_directory_or_default(&self) -> &str {
        self.dist_directory.as_deref().unwrap_or(DEFAULT_DIST_DIRECTORY)
    }

    /// Reserved concurrency, negative values clamp to zero
    pub fn concurrency(&self) -> i32 {
        self.concurrency
            .unwrap_or(0)
            .clamp(0, i64::from(i32::MAX)) as i32
    }

    /// VPC settings from the config
    pub fn vpc(&self) -> VpcSettings {
        VpcSettings {
            subnet_ids: self.subnet_ids.clone(),
            security_group_ids: self.security_group_ids.clone(),
        }
    }

    /// Tags as strings, `None` when the config has no `tags` key
    pub fn tags(&self) -> Option<BTreeMap<String, String>> {
        self.tags.as_ref().map(|tags| {
            tags.iter()
                .map(|(key, value)| (key.clone(), scalar_to_string(value)))
                .collect()
        })
    }

    /// Environment variables with `${NAME}` references resolved, `None`
    /// when the config has no `environment_variables` key
    pub fn environment(&self) -> Option<BTreeMap<String, String>> {
        self.environment_variables.as_ref().map(|vars| {
            vars.iter()
                .map(|(key, value)| (key.clone(), resolve_env_value(&scalar_to_string(value))))
                .collect()
        })
    }

    /// Directories named in `build.source_directories`
    pub fn source_directories(&self) -> Vec<String> {
        self.build
            .source_directories
            .as_deref()
            .unwrap_or("")
            .split(',')
            .map(str::trim)
            .filter(|dir| !dir.is_empty())
            .map(str::to_string)
            .collect()
    }

    /// ECR URI composed from account, region and repository
    pub fn ecr_uri(&self, tag: Option<&str>) -> Result<String> {
        ecr_uri(
            self.aws_account_id.as_deref(),
            self.region.as_deref(),
            self.ecr_repository.as_deref(),
            tag,
        )
    }

    /// Image URI to deploy or push.
    ///
    /// An explicit URI wins, then `lambda_image_uri`, then the composed ECR
    /// URI tagged with the explicit tag or `lambda_image_tag`.
    pub fn image_uri(&self, uri: Option<&str>, tag: Option<&str>) -> Result<String> {
        if let Some(uri) = uri.or(self.lambda_image_uri.as_deref()) {
            return Ok(uri.to_string());
        }
        self.ecr_uri(tag.or(self.lambda_image_tag.as_deref()))
    }
}

fn process_env(name: &str) -> Option<String> {
    std::env::var(name).ok()
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|value| !value.is_empty())
}

/// Render a YAML scalar the way it should appear in an API string field
pub fn scalar_to_string(value: &serde_yaml::Value) -> String {
    match value {
        serde_yaml::Value::Null => String::new(),
        serde_yaml::Value::Bool(b) => b.to_string(),
        serde_yaml::Value::Number(n) => n.to_string(),
        serde_yaml::Value::String(s) => s.clone(),
        other => serde_yaml::to_string(other)
            .map(|s| s.trim_end().to_string())
            .unwrap_or_default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
region: us-east-1
function_name: my_lambda_function
handler: service.handler
description: My lambda function
runtime: python3.12
role: lambda_basic_execution
timeout: 30
memory_size: 256
concurrency: -3
subnet_ids: [subnet-1, subnet-2]
security_group_ids: [sg-1]
tags:
  team: data
  cost_center: 42
environment_variables:
  MODE: production
build:
  source_directories: lib, vendor ,
image_build_variables:
  --tag: my-image:latest
  build_path: .
"#;

    #[test]
    fn parses_sample_config() {
        let config = FunctionConfig::from_yaml(SAMPLE).unwrap();
        assert_eq!(config.function_name().unwrap(), "my_lambda_function");
        assert_eq!(config.timeout_or_default(), 30);
        assert_eq!(config.memory_size_or_default(), 256);
        assert_eq!(config.concurrency(), 0);
        assert_eq!(config.source_directories(), vec!["lib", "vendor"]);
        assert_eq!(
            config.vpc(),
            VpcSettings {
                subnet_ids: vec!["subnet-1".into(), "subnet-2".into()],
                security_group_ids: vec!["sg-1".into()],
            }
        );
        let tags = config.tags().unwrap();
        assert_eq!(tags["cost_center"], "42");
        assert_eq!(config.image_build_variables["--tag"], "my-image:latest");
    }

    #[test]
    fn defaults_apply_to_empty_config() {
        let config = FunctionConfig::from_yaml("").unwrap();
        assert_eq!(config.timeout_or_default(), DEFAULT_TIMEOUT);
        assert_eq!(config.memory_size_or_default(), DEFAULT_MEMORY_SIZE);
        assert_eq!(config.role_or_default(), DEFAULT_ROLE);
        assert_eq!(config.s3_key_prefix_or_default(), "/dist");
        assert_eq!(config.dist_directory_or_default(), "dist");
        assert!(config.tags().is_none());
        assert!(config.environment().is_none());
        assert!(config.source_directories().is_empty());
        assert!(matches!(
            config.function_name(),
            Err(crate::DeployError::Config(ConfigError::MissingKey { key: "function_name" }))
        ));
    }

    #[test]
    fn image_uri_precedence() {
        let config = FunctionConfig::from_yaml(
            "aws_account_id: '123456789012'\nregion: eu-west-1\necr_repository: app\nlambda_image_tag: v1\n",
        )
        .unwrap();
        assert_eq!(
            config.image_uri(None, None).unwrap(),
            "123456789012.dkr.ecr.eu-west-1.amazonaws.com/app:v1"
        );
        assert_eq!(
            config.image_uri(None, Some("v2")).unwrap(),
            "123456789012.dkr.ecr.eu-west-1.amazonaws.com/app:v2"
        );
        assert_eq!(
            config.image_uri(Some("registry/app:x"), Some("v2")).unwrap(),
            "registry/app:x"
        );
    }

    #[test]
    fn load_reports_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = FunctionConfig::load(&dir.path().join("config.yaml"), None).unwrap_err();
        assert!(matches!(
            err,
            crate::DeployError::Config(ConfigError::NotFound { .. })
        ));
    }

    #[test]
    fn load_applies_profile_override() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, "function_name: f\nprofile: from-file\n").unwrap();
        let config = FunctionConfig::load(&path, Some("from-flag")).unwrap();
        assert_eq!(config.profile.as_deref(), Some("from-flag"));
    }

    fn env_with(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: BTreeMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn aws_profile_env_beats_file_profile() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, "function_name: f\nprofile: from-file\n").unwrap();

        let env = env_with(&[(PROFILE_ENV, "from-env")]);
        let config = FunctionConfig::load_with(&path, None, &env).unwrap();
        assert_eq!(config.profile.as_deref(), Some("from-env"));

        let config = FunctionConfig::load_with(&path, Some("from-flag"), &env).unwrap();
        assert_eq!(config.profile.as_deref(), Some("from-flag"));

        let config = FunctionConfig::load_with(&path, None, env_with(&[])).unwrap();
        assert_eq!(config.profile.as_deref(), Some("from-file"));
    }

    #[test]
    fn function_name_env_overrides_config() {
        let config = FunctionConfig::from_yaml("function_name: from-file\n").unwrap();

        let name = config
            .effective_function_name_with(env_with(&[(FUNCTION_NAME_ENV, "from-env")]))
            .unwrap();
        assert_eq!(name, "from-env");

        let name = config
            .effective_function_name_with(env_with(&[(FUNCTION_NAME_ENV, "")]))
            .unwrap();
        assert_eq!(name, "from-file");

        let unnamed = FunctionConfig::default();
        let name = unnamed
            .effective_function_name_with(env_with(&[(FUNCTION_NAME_ENV, "from-env")]))
            .unwrap();
        assert_eq!(name, "from-env");
    }

    #[test]
    fn bucket_env_overrides_config() {
        let config = FunctionConfig::from_yaml("bucket_name: from-file\n").unwrap();

        let bucket = config
            .effective_bucket_name_with(env_with(&[(BUCKET_ENV, "from-env")]))
            .unwrap();
        assert_eq!(bucket, "from-env");

        let bucket = config
            .effective_bucket_name_with(env_with(&[(BUCKET_ENV, "")]))
            .unwrap();
        assert_eq!(bucket, "from-file");

        let err = FunctionConfig::default()
            .effective_bucket_name_with(env_with(&[]))
            .unwrap_err();
        assert!(matches!(
            err,
            crate::error::DeployError::Config(ConfigError::MissingKey { key: "bucket_name" })
        ));
    }
}
