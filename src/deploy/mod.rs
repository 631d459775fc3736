//! Deploy workflows.
//!
//! Each workflow is a short, linear sequence of API calls:
//!
//! - zip: get function → update code + configuration, or create
//! - staged: upload to S3 → get function → update or create from the object
//! - image: get function → update code from the image URI
//!
//! Updates wait for the code change to settle before the configuration
//! update, since Lambda rejects configuration changes while an update is
//! in progress.

pub mod request;

use crate::aws::{CodeSource, ExistingFunction, FunctionApi, IdentityApi, ObjectStore, UpdateStatus};
use crate::bundle::{BundleArtifact, staging_key, unix_timestamp};
use crate::config::{FunctionConfig, role_arn};
use crate::error::{AwsError, Result};
use request::{CleanupPlan, ConcurrencyChange};
use std::time::Duration;

/// Polling policy while a function update propagates
#[derive(Debug, Clone, Copy)]
pub struct WaitPolicy {
    /// Delay between polls
    pub delay: Duration,
    /// Polls before giving up
    pub max_attempts: u32,
}

impl Default for WaitPolicy {
    fn default() -> Self {
        Self {
            delay: Duration::from_secs(5),
            max_attempts: 60,
        }
    }
}

/// Whether a deploy created or updated the function
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeployAction {
    /// New function
    Created,
    /// Existing function updated
    Updated,
}

/// Result of a deploy
#[derive(Debug, Clone)]
pub struct DeployOutcome {
    /// Function name
    pub function_name: String,
    /// Create or update
    pub action: DeployAction,
    /// Code location that was deployed
    pub code: String,
    /// Function ARN, when known
    pub function_arn: Option<String>,
}

/// Location of a staged bundle
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedBundle {
    /// Bucket name
    pub bucket: String,
    /// Object key
    pub key: String,
}

/// Result of a version cleanup
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CleanupOutcome {
    /// `keep_last` was not positive
    Refused,
    /// Fewer versions published than would be kept
    NothingToDelete,
    /// Versions processed
    Deleted {
        /// Versions removed
        deleted: Vec<String>,
        /// Versions that could not be removed, with the reason
        skipped: Vec<(String, String)>,
    },
}

/// Runs deploy workflows against the platform adapters
pub struct Deployer<'a, F, S, I> {
    functions: &'a F,
    store: &'a S,
    identity: &'a I,
    config: &'a FunctionConfig,
    wait: WaitPolicy,
}

impl<'a, F, S, I> Deployer<'a, F, S, I>
where
    F: FunctionApi,
    S: ObjectStore,
    I: IdentityApi,
{
    /// Create a deployer for one function config
    pub fn new(functions: &'a F, store: &'a S, identity: &'a I, config: &'a FunctionConfig) -> Self {
        Self {
            functions,
            store,
            identity,
            config,
            wait: WaitPolicy::default(),
        }
    }

    /// Override the update polling policy
    pub fn with_wait_policy(mut self, wait: WaitPolicy) -> Self {
        self.wait = wait;
        self
    }

    /// Deploy a zip bundle inline with the API call
    pub async fn deploy_zip(&self, artifact: &BundleArtifact, preserve_vpc: bool) -> Result<DeployOutcome> {
        let name = self.config.effective_function_name()?;
        let existing = self.functions.get_function(&name).await?;

        if let Some(existing) = &existing
            && existing.code_sha256.as_deref() == Some(artifact.code_sha256.as_str())
        {
            log::info!("Bundle matches the deployed code ({}); publishing anyway", artifact.code_sha256);
        }

        let code = CodeSource::ZipFile(artifact.read()?);
        self.create_or_update(&name, code, existing, preserve_vpc).await
    }

    /// Upload a bundle to the staging bucket
    pub async fn upload(&self, artifact: &BundleArtifact) -> Result<StagedBundle> {
        let bucket = self.config.effective_bucket_name()?;
        let key = staging_key(
            self.config.s3_key_prefix_or_default(),
            &artifact.md5,
            &unix_timestamp(chrono::Utc::now()),
        );

        log::info!("Uploading {} to s3://{}/{}", artifact.path.display(), bucket, key);
        self.store.put_object(&bucket, &key, artifact.read()?).await?;
        log::info!(
            "Finished uploading {} to S3 bucket {}",
            self.config.effective_function_name().unwrap_or_default(),
            bucket
        );

        Ok(StagedBundle { bucket, key })
    }

    /// Stage a bundle in S3 and deploy from there
    pub async fn deploy_staged(&self, artifact: &BundleArtifact, preserve_vpc: bool) -> Result<DeployOutcome> {
        let staged = self.upload(artifact).await?;
        let name = self.config.effective_function_name()?;
        let existing = self.functions.get_function(&name).await?;
        let code = CodeSource::S3 {
            bucket: staged.bucket,
            key: staged.key,
        };
        self.create_or_update(&name, code, existing, preserve_vpc).await
    }

    /// Point an existing function at a container image
    pub async fn deploy_image(&self, image_uri: &str, preserve_vpc: bool) -> Result<DeployOutcome> {
        let name = self.config.effective_function_name()?;
        log::info!("Deploying docker image with URI: {}", image_uri);

        let existing = self
            .functions
            .get_function(&name)
            .await?
            .ok_or_else(|| AwsError::FunctionNotFound { name: name.clone() })?;

        self.update(&name, CodeSource::Image(image_uri.to_string()), &existing, preserve_vpc)
            .await
    }

    /// Delete published versions, keeping `$LATEST` and the newest `keep_last`
    pub async fn cleanup_old_versions(&self, keep_last: i64) -> Result<CleanupOutcome> {
        if keep_last <= 0 {
            return Ok(CleanupOutcome::Refused);
        }
        let name = self.config.effective_function_name()?;
        let versions = self.functions.list_versions(&name).await?;

        let to_delete = match request::cleanup_plan(&versions, keep_last) {
            CleanupPlan::Refused => return Ok(CleanupOutcome::Refused),
            CleanupPlan::TooFewVersions => return Ok(CleanupOutcome::NothingToDelete),
            CleanupPlan::Delete(versions) => versions,
        };

        let mut deleted = Vec::new();
        let mut skipped = Vec::new();
        for version in to_delete {
            match self.functions.delete_function_version(&name, &version).await {
                Ok(()) => {
                    log::info!("Deleted version {}", version);
                    deleted.push(version);
                }
                Err(e) => {
                    log::warn!("Skipping Version {}: {}", version, e);
                    skipped.push((version, e.to_string()));
                }
            }
        }
        Ok(CleanupOutcome::Deleted { deleted, skipped })
    }

    async fn create_or_update(
        &self,
        name: &str,
        code: CodeSource,
        existing: Option<ExistingFunction>,
        preserve_vpc: bool,
    ) -> Result<DeployOutcome> {
        match existing {
            Some(existing) => self.update(name, code, &existing, preserve_vpc).await,
            None => self.create(name, code).await,
        }
    }

    async fn role_arn(&self) -> Result<String> {
        let role = self.config.role_or_default();
        if role.starts_with("arn:") {
            return Ok(role.to_string());
        }
        let account_id = self.identity.account_id().await?;
        Ok(role_arn(self.config.region.as_deref(), &account_id, role))
    }

    async fn create(&self, name: &str, code: CodeSource) -> Result<DeployOutcome> {
        log::info!("Creating lambda function with name: {}", name);
        let role = self.role_arn().await?;
        let described = code.describe();
        let request = request::create_request(self.config, name, &role, code)?;

        self.functions.create_function(request).await?;

        let concurrency = self.config.concurrency();
        if concurrency > 0 {
            self.functions.put_function_concurrency(name, concurrency).await?;
        }

        Ok(DeployOutcome {
            function_name: name.to_string(),
            action: DeployAction::Created,
            code: described,
            function_arn: None,
        })
    }

    async fn update(
        &self,
        name: &str,
        code: CodeSource,
        existing: &ExistingFunction,
        preserve_vpc: bool,
    ) -> Result<DeployOutcome> {
        log::info!("Updating your Lambda function {}", name);
        let role = self.role_arn().await?;
        let is_image = matches!(code, CodeSource::Image(_));
        let described = code.describe();

        self.functions.update_function_code(name, code).await?;
        self.wait_until_updated(name).await?;

        let update =
            request::configuration_update(self.config, name, &role, existing, preserve_vpc, is_image);
        log::debug!("VPC for {}: {}", name, request::describe_vpc(&update.vpc));
        let function_arn = self
            .functions
            .update_function_configuration(update)
            .await?
            .or_else(|| existing.function_arn.clone());

        match request::concurrency_change(self.config, existing) {
            ConcurrencyChange::Put(n) => self.functions.put_function_concurrency(name, n).await?,
            ConcurrencyChange::Delete => self.functions.delete_function_concurrency(name).await?,
            ConcurrencyChange::Keep => {}
        }

        let configured_tags = self.config.tags();
        if let Some(change) = request::tag_change(configured_tags.as_ref(), &existing.tags) {
            match &function_arn {
                Some(arn) => {
                    if !change.untag.is_empty() {
                        self.functions.untag_resource(arn, change.untag).await?;
                    }
                    self.functions.tag_resource(arn, change.tag).await?;
                }
                None => log::warn!("No ARN known for {}; tags were not updated", name),
            }
        }

        Ok(DeployOutcome {
            function_name: name.to_string(),
            action: DeployAction::Updated,
            code: described,
            function_arn,
        })
    }

    /// Poll until the last update leaves `InProgress`
    async fn wait_until_updated(&self, name: &str) -> Result<()> {
        for attempt in 1..=self.wait.max_attempts {
            match self.functions.last_update_status(name).await? {
                UpdateStatus::Successful => {
                    log::debug!("Function {} updated after {} poll(s)", name, attempt);
                    return Ok(());
                }
                UpdateStatus::Failed(reason) => {
                    return Err(AwsError::UpdateFailed {
                        name: name.to_string(),
                        status: "Failed".to_string(),
                        reason,
                    }
                    .into());
                }
                UpdateStatus::InProgress => {
                    log::debug!("Function {} update in progress (attempt {})", name, attempt);
                    if attempt < self.wait.max_attempts {
                        tokio::time::sleep(self.wait.delay).await;
                    }
                }
            }
        }
        Err(AwsError::WaitTimeout {
            name: name.to_string(),
            attempts: self.wait.max_attempts,
        }
        .into())
    }
}
