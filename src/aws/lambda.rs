//! Lambda-backed [`FunctionApi`].

use super::{
    ApiResult, CodeSource, ConfigurationUpdate, CreateFunctionRequest, ExistingFunction,
    FunctionApi, InvokeOutput, UpdateStatus,
};
use crate::config::VpcSettings;
use crate::error::AwsError;
use aws_sdk_lambda::error::DisplayErrorContext;
use aws_sdk_lambda::primitives::Blob;
use aws_sdk_lambda::types::{
    Environment, FunctionCode, LastUpdateStatus, LogType, PackageType, Runtime, VpcConfig,
};
use std::collections::{BTreeMap, HashMap};

/// Lambda management client
#[derive(Debug, Clone)]
pub struct LambdaClient {
    client: aws_sdk_lambda::Client,
}

impl LambdaClient {
    /// Wrap an SDK client
    pub fn new(client: aws_sdk_lambda::Client) -> Self {
        Self { client }
    }
}

fn vpc_config(vpc: &VpcSettings) -> VpcConfig {
    VpcConfig::builder()
        .set_subnet_ids(Some(vpc.subnet_ids.clone()))
        .set_security_group_ids(Some(vpc.security_group_ids.clone()))
        .build()
}

fn environment(vars: &BTreeMap<String, String>) -> Environment {
    Environment::builder()
        .set_variables(Some(to_hash_map(vars)))
        .build()
}

fn to_hash_map(map: &BTreeMap<String, String>) -> HashMap<String, String> {
    map.iter().map(|(k, v)| (k.clone(), v.clone())).collect()
}

fn function_code(code: CodeSource) -> FunctionCode {
    match code {
        CodeSource::ZipFile(bytes) => FunctionCode::builder().zip_file(Blob::new(bytes)).build(),
        CodeSource::S3 { bucket, key } => {
            FunctionCode::builder().s3_bucket(bucket).s3_key(key).build()
        }
        CodeSource::Image(uri) => FunctionCode::builder().image_uri(uri).build(),
    }
}

impl FunctionApi for LambdaClient {
    async fn get_function(&self, name: &str) -> ApiResult<Option<ExistingFunction>> {
        let output = match self.client.get_function().function_name(name).send().await {
            Ok(output) => output,
            Err(error) => {
                if error
                    .as_service_error()
                    .is_some_and(|e| e.is_resource_not_found_exception())
                {
                    log::debug!("Function {} not found", name);
                    return Ok(None);
                }
                return Err(AwsError::api("GetFunction", DisplayErrorContext(&error)));
            }
        };

        let configuration = output.configuration();
        let vpc = configuration
            .and_then(|c| c.vpc_config())
            .filter(|v| v.vpc_id().is_some_and(|id| !id.is_empty()) || !v.subnet_ids().is_empty())
            .map(|v| VpcSettings {
                subnet_ids: v.subnet_ids().to_vec(),
                security_group_ids: v.security_group_ids().to_vec(),
            });

        Ok(Some(ExistingFunction {
            function_arn: configuration.and_then(|c| c.function_arn()).map(str::to_string),
            vpc,
            reserved_concurrency: output
                .concurrency()
                .and_then(|c| c.reserved_concurrent_executions()),
            tags: output
                .tags()
                .map(|tags| tags.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
                .unwrap_or_default(),
            code_sha256: configuration
                .and_then(|c| c.code_sha256())
                .map(str::to_string),
        }))
    }

    async fn create_function(&self, request: CreateFunctionRequest) -> ApiResult<()> {
        let is_image = matches!(request.code, CodeSource::Image(_));
        let mut builder = self
            .client
            .create_function()
            .function_name(&request.function_name)
            .role(&request.role)
            .code(function_code(request.code))
            .description(&request.description)
            .timeout(request.timeout)
            .memory_size(request.memory_size)
            .vpc_config(vpc_config(&request.vpc))
            .publish(request.publish);

        if is_image {
            builder = builder.package_type(PackageType::Image);
        } else {
            builder = builder
                .runtime(Runtime::from(request.runtime.as_str()))
                .handler(&request.handler);
        }
        if let Some(tags) = &request.tags {
            builder = builder.set_tags(Some(to_hash_map(tags)));
        }
        if let Some(vars) = &request.environment {
            builder = builder.environment(environment(vars));
        }

        builder
            .send()
            .await
            .map(|_| ())
            .map_err(|error| AwsError::api("CreateFunction", DisplayErrorContext(&error)))
    }

    async fn update_function_code(&self, name: &str, code: CodeSource) -> ApiResult<()> {
        let builder = self
            .client
            .update_function_code()
            .function_name(name)
            .publish(true);

        let builder = match code {
            CodeSource::ZipFile(bytes) => builder.zip_file(Blob::new(bytes)),
            CodeSource::S3 { bucket, key } => builder.s3_bucket(bucket).s3_key(key),
            CodeSource::Image(uri) => builder.image_uri(uri),
        };

        builder
            .send()
            .await
            .map(|_| ())
            .map_err(|error| AwsError::api("UpdateFunctionCode", DisplayErrorContext(&error)))
    }

    async fn last_update_status(&self, name: &str) -> ApiResult<UpdateStatus> {
        let output = self
            .client
            .get_function_configuration()
            .function_name(name)
            .send()
            .await
            .map_err(|error| AwsError::api("GetFunctionConfiguration", DisplayErrorContext(&error)))?;

        Ok(match output.last_update_status() {
            Some(LastUpdateStatus::InProgress) => UpdateStatus::InProgress,
            Some(LastUpdateStatus::Failed) => UpdateStatus::Failed(
                output
                    .last_update_status_reason()
                    .unwrap_or("no reason given")
                    .to_string(),
            ),
            // Functions that were never updated report no status
            _ => UpdateStatus::Successful,
        })
    }

    async fn update_function_configuration(
        &self,
        update: ConfigurationUpdate,
    ) -> ApiResult<Option<String>> {
        let mut builder = self
            .client
            .update_function_configuration()
            .function_name(&update.function_name)
            .role(&update.role)
            .description(&update.description)
            .timeout(update.timeout)
            .memory_size(update.memory_size)
            .vpc_config(vpc_config(&update.vpc));

        if let Some(runtime) = &update.runtime {
            builder = builder.runtime(Runtime::from(runtime.as_str()));
        }
        if let Some(handler) = &update.handler {
            builder = builder.handler(handler);
        }
        if let Some(vars) = &update.environment {
            builder = builder.environment(environment(vars));
        }

        let output = builder.send().await.map_err(|error| {
            AwsError::api("UpdateFunctionConfiguration", DisplayErrorContext(&error))
        })?;

        Ok(output.function_arn().map(str::to_string))
    }

    async fn put_function_concurrency(&self, name: &str, concurrency: i32) -> ApiResult<()> {
        self.client
            .put_function_concurrency()
            .function_name(name)
            .reserved_concurrent_executions(concurrency)
            .send()
            .await
            .map(|_| ())
            .map_err(|error| AwsError::api("PutFunctionConcurrency", DisplayErrorContext(&error)))
    }

    async fn delete_function_concurrency(&self, name: &str) -> ApiResult<()> {
        self.client
            .delete_function_concurrency()
            .function_name(name)
            .send()
            .await
            .map(|_| ())
            .map_err(|error| AwsError::api("DeleteFunctionConcurrency", DisplayErrorContext(&error)))
    }

    async fn tag_resource(&self, arn: &str, tags: BTreeMap<String, String>) -> ApiResult<()> {
        self.client
            .tag_resource()
            .resource(arn)
            .set_tags(Some(to_hash_map(&tags)))
            .send()
            .await
            .map(|_| ())
            .map_err(|error| AwsError::api("TagResource", DisplayErrorContext(&error)))
    }

    async fn untag_resource(&self, arn: &str, keys: Vec<String>) -> ApiResult<()> {
        self.client
            .untag_resource()
            .resource(arn)
            .set_tag_keys(Some(keys))
            .send()
            .await
            .map(|_| ())
            .map_err(|error| AwsError::api("UntagResource", DisplayErrorContext(&error)))
    }

    async fn list_versions(&self, name: &str) -> ApiResult<Vec<String>> {
        let mut versions = Vec::new();
        let mut marker: Option<String> = None;

        loop {
            let output = self
                .client
                .list_versions_by_function()
                .function_name(name)
                .set_marker(marker.take())
                .send()
                .await
                .map_err(|error| AwsError::api("ListVersionsByFunction", DisplayErrorContext(&error)))?;

            versions.extend(
                output
                    .versions()
                    .iter()
                    .filter_map(|v| v.version())
                    .map(str::to_string),
            );

            match output.next_marker() {
                Some(next) if !next.is_empty() => marker = Some(next.to_string()),
                _ => break,
            }
        }

        Ok(versions)
    }

    async fn delete_function_version(&self, name: &str, version: &str) -> ApiResult<()> {
        self.client
            .delete_function()
            .function_name(name)
            .qualifier(version)
            .send()
            .await
            .map(|_| ())
            .map_err(|error| AwsError::api("DeleteFunction", DisplayErrorContext(&error)))
    }

    async fn invoke(&self, name: &str, payload: Vec<u8>) -> ApiResult<InvokeOutput> {
        let output = self
            .client
            .invoke()
            .function_name(name)
            .payload(Blob::new(payload))
            .log_type(LogType::Tail)
            .send()
            .await
            .map_err(|error| AwsError::api("Invoke", DisplayErrorContext(&error)))?;

        Ok(InvokeOutput {
            status_code: output.status_code(),
            payload: output
                .payload()
                .map(|blob| blob.as_ref().to_vec())
                .unwrap_or_default(),
            function_error: output.function_error().map(str::to_string),
            log_result: output.log_result().map(str::to_string),
        })
    }
}
