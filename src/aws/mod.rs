//! Cloud API adapters.
//!
//! Deploy workflows talk to the platform through three small traits so the
//! request sequence can be exercised without network access:
//!
//! - [`FunctionApi`] - function management (Lambda)
//! - [`ObjectStore`] - staging uploads (S3)
//! - [`IdentityApi`] - caller account lookup (STS)
//!
//! The SDK-backed implementations live in the submodules.

#![allow(async_fn_in_trait)]

mod lambda;
mod s3;
mod session;
mod sts;

pub use lambda::LambdaClient;
pub use s3::S3Store;
pub use session::{AwsClients, load_sdk_config};
pub use sts::StsIdentity;

use crate::config::VpcSettings;
use crate::error::AwsError;
use std::collections::BTreeMap;

/// Result alias for adapter calls
pub type ApiResult<T> = std::result::Result<T, AwsError>;

/// Where the function code comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CodeSource {
    /// Inline zip bytes
    ZipFile(Vec<u8>),
    /// Staged object
    S3 {
        /// Bucket name
        bucket: String,
        /// Object key
        key: String,
    },
    /// Container image URI
    Image(String),
}

impl CodeSource {
    /// Short label for logs
    pub fn describe(&self) -> String {
        match self {
            CodeSource::ZipFile(bytes) => format!("zip ({} bytes)", bytes.len()),
            CodeSource::S3 { bucket, key } => format!("s3://{bucket}/{key}"),
            CodeSource::Image(uri) => format!("image {uri}"),
        }
    }
}

/// State of a function that already exists
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExistingFunction {
    /// Function ARN
    pub function_arn: Option<String>,
    /// Attached VPC, when the function has one
    pub vpc: Option<VpcSettings>,
    /// Reserved concurrency, when set
    pub reserved_concurrency: Option<i32>,
    /// Resource tags
    pub tags: BTreeMap<String, String>,
    /// Base64 SHA-256 of the deployed code
    pub code_sha256: Option<String>,
}

/// Parameters for creating a function
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateFunctionRequest {
    /// Function name
    pub function_name: String,
    /// Runtime identifier
    pub runtime: String,
    /// Execution role ARN
    pub role: String,
    /// Handler entry point
    pub handler: String,
    /// Code location
    pub code: CodeSource,
    /// Description
    pub description: String,
    /// Timeout in seconds
    pub timeout: i32,
    /// Memory in MB
    pub memory_size: i32,
    /// VPC attachment
    pub vpc: VpcSettings,
    /// Publish a version on create
    pub publish: bool,
    /// Tags, when configured
    pub tags: Option<BTreeMap<String, String>>,
    /// Environment, when configured
    pub environment: Option<BTreeMap<String, String>>,
}

/// Parameters for updating a function's configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigurationUpdate {
    /// Function name
    pub function_name: String,
    /// Execution role ARN
    pub role: String,
    /// Runtime; omitted for image functions
    pub runtime: Option<String>,
    /// Handler; omitted for image functions
    pub handler: Option<String>,
    /// Description
    pub description: String,
    /// Timeout in seconds
    pub timeout: i32,
    /// Memory in MB
    pub memory_size: i32,
    /// VPC attachment
    pub vpc: VpcSettings,
    /// Environment, when configured
    pub environment: Option<BTreeMap<String, String>>,
}

/// Progress of the most recent function update
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateStatus {
    /// Update applied
    Successful,
    /// Update still propagating
    InProgress,
    /// Update failed, with the reason reported by the service
    Failed(String),
}

/// Response of a synchronous invoke
#[derive(Debug, Clone, Default)]
pub struct InvokeOutput {
    /// HTTP status code
    pub status_code: i32,
    /// Response payload
    pub payload: Vec<u8>,
    /// Error type when the function raised
    pub function_error: Option<String>,
    /// Base64 tail of the execution log
    pub log_result: Option<String>,
}

/// Function management operations
pub trait FunctionApi {
    /// Fetch a function, `None` when it does not exist
    async fn get_function(&self, name: &str) -> ApiResult<Option<ExistingFunction>>;

    /// Create a function
    async fn create_function(&self, request: CreateFunctionRequest) -> ApiResult<()>;

    /// Replace a function's code and publish a version
    async fn update_function_code(&self, name: &str, code: CodeSource) -> ApiResult<()>;

    /// Status of the function's last update
    async fn last_update_status(&self, name: &str) -> ApiResult<UpdateStatus>;

    /// Update configuration, returning the function ARN when the response carries one
    async fn update_function_configuration(
        &self,
        update: ConfigurationUpdate,
    ) -> ApiResult<Option<String>>;

    /// Set reserved concurrency
    async fn put_function_concurrency(&self, name: &str, concurrency: i32) -> ApiResult<()>;

    /// Remove reserved concurrency
    async fn delete_function_concurrency(&self, name: &str) -> ApiResult<()>;

    /// Add tags to a function
    async fn tag_resource(&self, arn: &str, tags: BTreeMap<String, String>) -> ApiResult<()>;

    /// Remove tags from a function
    async fn untag_resource(&self, arn: &str, keys: Vec<String>) -> ApiResult<()>;

    /// Version identifiers, oldest first (`$LATEST` leads)
    async fn list_versions(&self, name: &str) -> ApiResult<Vec<String>>;

    /// Delete one published version
    async fn delete_function_version(&self, name: &str, version: &str) -> ApiResult<()>;

    /// Invoke synchronously
    async fn invoke(&self, name: &str, payload: Vec<u8>) -> ApiResult<InvokeOutput>;
}

/// Object storage used for staging uploads
pub trait ObjectStore {
    /// Store `body` at `bucket/key`
    async fn put_object(&self, bucket: &str, key: &str, body: Vec<u8>) -> ApiResult<()>;
}

/// Caller identity lookup
pub trait IdentityApi {
    /// Account id of the credentials in use
    async fn account_id(&self) -> ApiResult<String>;
}
