//! SDK configuration from the function config.

use super::{LambdaClient, S3Store, StsIdentity};
use crate::config::FunctionConfig;
use aws_config::{BehaviorVersion, SdkConfig};
use aws_sdk_lambda::config::{Credentials, Region};

/// Provider name attached to credentials read from config.yaml
const CONFIG_CREDENTIALS_PROVIDER: &str = "lambda_deploy-config";

/// Load SDK configuration.
///
/// Profile, region and static credentials from the config are applied on
/// top of the default provider chain.
pub async fn load_sdk_config(config: &FunctionConfig) -> SdkConfig {
    let mut loader = aws_config::defaults(BehaviorVersion::latest());

    if let Some(profile) = &config.profile {
        log::debug!("Using AWS profile {}", profile);
        loader = loader.profile_name(profile);
    }
    if let Some(region) = &config.region {
        loader = loader.region(Region::new(region.clone()));
    }
    if let (Some(key_id), Some(secret)) = (&config.aws_access_key_id, &config.aws_secret_access_key) {
        log::debug!("Using static credentials from config");
        loader = loader.credentials_provider(Credentials::new(
            key_id.clone(),
            secret.clone(),
            None,
            None,
            CONFIG_CREDENTIALS_PROVIDER,
        ));
    }

    loader.load().await
}

/// SDK-backed adapters sharing one configuration
#[derive(Debug, Clone)]
pub struct AwsClients {
    /// Function management
    pub lambda: LambdaClient,
    /// Staging uploads
    pub s3: S3Store,
    /// Account lookup
    pub sts: StsIdentity,
}

impl AwsClients {
    /// Build all adapters from the function config
    pub async fn connect(config: &FunctionConfig) -> Self {
        let sdk_config = load_sdk_config(config).await;
        Self::from_sdk_config(&sdk_config)
    }

    /// Build all adapters from a loaded SDK config
    pub fn from_sdk_config(sdk_config: &SdkConfig) -> Self {
        Self {
            lambda: LambdaClient::new(aws_sdk_lambda::Client::new(sdk_config)),
            s3: S3Store::new(aws_sdk_s3::Client::new(sdk_config)),
            sts: StsIdentity::new(aws_sdk_sts::Client::new(sdk_config)),
        }
    }
}
