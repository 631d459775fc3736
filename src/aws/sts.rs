use super::{ApiResult, IdentityApi};
use crate::error::AwsError;
use aws_sdk_sts::error::DisplayErrorContext;

/// STS-backed identity lookup
#[derive(Debug, Clone)]
pub struct StsIdentity {
    client: aws_sdk_sts::Client,
}

impl StsIdentity {
    /// Wrap an SDK client
    pub fn new(client: aws_sdk_sts::Client) -> Self {
        Self { client }
    }
}

impl IdentityApi for StsIdentity {
    async fn account_id(&self) -> ApiResult<String> {
        let output = self
            .client
            .get_caller_identity()
            .send()
            .await
            .map_err(|error| AwsError::api("GetCallerIdentity", DisplayErrorContext(&error)))?;

        output
            .account()
            .map(str::to_string)
            .ok_or_else(|| AwsError::api("GetCallerIdentity", "response carried no account id"))
    }
}
