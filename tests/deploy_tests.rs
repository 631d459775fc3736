//! Deploy workflow tests against in-memory platform adapters.

use lambda_deploy::aws::{
    ApiResult, CodeSource, ConfigurationUpdate, CreateFunctionRequest, ExistingFunction,
    FunctionApi, IdentityApi, InvokeOutput, ObjectStore, UpdateStatus,
};
use lambda_deploy::bundle::BundleArtifact;
use lambda_deploy::config::{FunctionConfig, VpcSettings};
use lambda_deploy::deploy::{CleanupOutcome, DeployAction, Deployer, WaitPolicy};
use lambda_deploy::error::{AwsError, DeployError};
use std::collections::{BTreeMap, VecDeque};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

const ACCOUNT: &str = "123456789012";
const FUNCTION_ARN: &str = "arn:aws:lambda:us-east-1:123456789012:function:orders";

#[derive(Debug, Clone, PartialEq)]
enum Call {
    Get(String),
    Create(CreateFunctionRequest),
    UpdateCode(String, CodeSource),
    Status(String),
    UpdateConfig(ConfigurationUpdate),
    PutConcurrency(String, i32),
    DeleteConcurrency(String),
    Tag(String, BTreeMap<String, String>),
    Untag(String, Vec<String>),
    ListVersions(String),
    DeleteVersion(String, String),
    Invoke(String, Vec<u8>),
}

struct FakeLambda {
    existing: Option<ExistingFunction>,
    statuses: Mutex<VecDeque<UpdateStatus>>,
    settled: UpdateStatus,
    versions: Vec<String>,
    undeletable: Vec<String>,
    config_arn: Option<String>,
    calls: Mutex<Vec<Call>>,
}

impl FakeLambda {
    fn new(existing: Option<ExistingFunction>) -> Self {
        Self {
            existing,
            statuses: Mutex::new(VecDeque::new()),
            settled: UpdateStatus::Successful,
            versions: Vec::new(),
            undeletable: Vec::new(),
            config_arn: Some(FUNCTION_ARN.to_string()),
            calls: Mutex::new(Vec::new()),
        }
    }

    fn with_statuses(self, statuses: Vec<UpdateStatus>) -> Self {
        *self.statuses.lock().unwrap() = statuses.into();
        self
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }

    fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }
}

impl FunctionApi for FakeLambda {
    async fn get_function(&self, name: &str) -> ApiResult<Option<ExistingFunction>> {
        self.record(Call::Get(name.to_string()));
        Ok(self.existing.clone())
    }

    async fn create_function(&self, request: CreateFunctionRequest) -> ApiResult<()> {
        self.record(Call::Create(request));
        Ok(())
    }

    async fn update_function_code(&self, name: &str, code: CodeSource) -> ApiResult<()> {
        self.record(Call::UpdateCode(name.to_string(), code));
        Ok(())
    }

    async fn last_update_status(&self, name: &str) -> ApiResult<UpdateStatus> {
        self.record(Call::Status(name.to_string()));
        let next = self.statuses.lock().unwrap().pop_front();
        Ok(next.unwrap_or_else(|| self.settled.clone()))
    }

    async fn update_function_configuration(
        &self,
        update: ConfigurationUpdate,
    ) -> ApiResult<Option<String>> {
        self.record(Call::UpdateConfig(update));
        Ok(self.config_arn.clone())
    }

    async fn put_function_concurrency(&self, name: &str, concurrency: i32) -> ApiResult<()> {
        self.record(Call::PutConcurrency(name.to_string(), concurrency));
        Ok(())
    }

    async fn delete_function_concurrency(&self, name: &str) -> ApiResult<()> {
        self.record(Call::DeleteConcurrency(name.to_string()));
        Ok(())
    }

    async fn tag_resource(&self, arn: &str, tags: BTreeMap<String, String>) -> ApiResult<()> {
        self.record(Call::Tag(arn.to_string(), tags));
        Ok(())
    }

    async fn untag_resource(&self, arn: &str, keys: Vec<String>) -> ApiResult<()> {
        self.record(Call::Untag(arn.to_string(), keys));
        Ok(())
    }

    async fn list_versions(&self, name: &str) -> ApiResult<Vec<String>> {
        self.record(Call::ListVersions(name.to_string()));
        Ok(self.versions.clone())
    }

    async fn delete_function_version(&self, name: &str, version: &str) -> ApiResult<()> {
        self.record(Call::DeleteVersion(name.to_string(), version.to_string()));
        if self.undeletable.iter().any(|v| v == version) {
            return Err(AwsError::api("DeleteFunction", "version is referenced by an alias"));
        }
        Ok(())
    }

    async fn invoke(&self, name: &str, payload: Vec<u8>) -> ApiResult<InvokeOutput> {
        self.record(Call::Invoke(name.to_string(), payload.clone()));
        Ok(InvokeOutput {
            status_code: 200,
            payload,
            function_error: None,
            log_result: None,
        })
    }
}

#[derive(Default)]
struct FakeStore {
    puts: Mutex<Vec<(String, String, usize)>>,
}

impl ObjectStore for FakeStore {
    async fn put_object(&self, bucket: &str, key: &str, body: Vec<u8>) -> ApiResult<()> {
        self.puts
            .lock()
            .unwrap()
            .push((bucket.to_string(), key.to_string(), body.len()));
        Ok(())
    }
}

#[derive(Default)]
struct FakeIdentity {
    lookups: AtomicUsize,
}

impl IdentityApi for FakeIdentity {
    async fn account_id(&self) -> ApiResult<String> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        Ok(ACCOUNT.to_string())
    }
}

fn config(yaml: &str) -> FunctionConfig {
    FunctionConfig::from_yaml(yaml).unwrap()
}

fn no_wait() -> WaitPolicy {
    WaitPolicy {
        delay: Duration::ZERO,
        max_attempts: 3,
    }
}

/// Writes a small file standing in for a built bundle
fn artifact(dir: &tempfile::TempDir) -> BundleArtifact {
    let path = dir.path().join("2024-01-01-000000-orders.zip");
    std::fs::write(&path, b"PK\x05\x06bundle").unwrap();
    BundleArtifact::from_path(&path).unwrap()
}

const BASE: &str = "function_name: orders\nhandler: service.handler\nregion: us-east-1\n";

#[tokio::test]
async fn zip_deploy_creates_missing_function() {
    let dir = tempfile::tempdir().unwrap();
    let artifact = artifact(&dir);
    let cfg = config(&format!("{BASE}concurrency: 3\n"));
    let lambda = FakeLambda::new(None);
    let store = FakeStore::default();
    let identity = FakeIdentity::default();

    let outcome = Deployer::new(&lambda, &store, &identity, &cfg)
        .with_wait_policy(no_wait())
        .deploy_zip(&artifact, false)
        .await
        .unwrap();

    assert_eq!(outcome.action, DeployAction::Created);
    let calls = lambda.calls();
    assert_eq!(calls.len(), 3);
    assert_eq!(calls[0], Call::Get("orders".to_string()));
    let Call::Create(request) = &calls[1] else {
        panic!("expected create, got {:?}", calls[1]);
    };
    assert_eq!(
        request.role,
        "arn:aws:iam::123456789012:role/lambda_basic_execution"
    );
    assert_eq!(request.handler, "service.handler");
    assert_eq!(request.code, CodeSource::ZipFile(artifact.read().unwrap()));
    assert!(request.publish);
    assert_eq!(calls[2], Call::PutConcurrency("orders".to_string(), 3));
    assert!(store.puts.lock().unwrap().is_empty());
}

#[tokio::test]
async fn update_waits_before_configuration_and_syncs_tags() {
    let dir = tempfile::tempdir().unwrap();
    let artifact = artifact(&dir);
    let cfg = config(&format!("{BASE}tags:\n  team: data\n"));
    let existing = ExistingFunction {
        function_arn: Some(FUNCTION_ARN.to_string()),
        reserved_concurrency: Some(5),
        tags: BTreeMap::from([("owner".to_string(), "old".to_string())]),
        ..Default::default()
    };
    let lambda = FakeLambda::new(Some(existing))
        .with_statuses(vec![UpdateStatus::InProgress, UpdateStatus::Successful]);
    let store = FakeStore::default();
    let identity = FakeIdentity::default();

    let outcome = Deployer::new(&lambda, &store, &identity, &cfg)
        .with_wait_policy(no_wait())
        .deploy_zip(&artifact, false)
        .await
        .unwrap();

    assert_eq!(outcome.action, DeployAction::Updated);
    assert_eq!(outcome.function_arn.as_deref(), Some(FUNCTION_ARN));

    let calls = lambda.calls();
    let kinds: Vec<&str> = calls
        .iter()
        .map(|call| match call {
            Call::Get(_) => "get",
            Call::UpdateCode(..) => "code",
            Call::Status(_) => "status",
            Call::UpdateConfig(_) => "config",
            Call::DeleteConcurrency(_) => "delete-concurrency",
            Call::Untag(..) => "untag",
            Call::Tag(..) => "tag",
            other => panic!("unexpected call {other:?}"),
        })
        .collect();
    assert_eq!(
        kinds,
        vec!["get", "code", "status", "status", "config", "delete-concurrency", "untag", "tag"]
    );
    assert!(calls.contains(&Call::Untag(FUNCTION_ARN.to_string(), vec!["owner".to_string()])));
    assert!(calls.contains(&Call::Tag(
        FUNCTION_ARN.to_string(),
        BTreeMap::from([("team".to_string(), "data".to_string())])
    )));
}

#[tokio::test]
async fn update_tags_through_existing_arn_when_configuration_omits_it() {
    let dir = tempfile::tempdir().unwrap();
    let artifact = artifact(&dir);
    let cfg = config(&format!("{BASE}tags:\n  team: data\n"));
    let existing = ExistingFunction {
        function_arn: Some(FUNCTION_ARN.to_string()),
        ..Default::default()
    };
    let mut lambda = FakeLambda::new(Some(existing));
    lambda.config_arn = None;

    let outcome = Deployer::new(&lambda, &FakeStore::default(), &FakeIdentity::default(), &cfg)
        .with_wait_policy(no_wait())
        .deploy_zip(&artifact, false)
        .await
        .unwrap();

    assert_eq!(outcome.function_arn.as_deref(), Some(FUNCTION_ARN));
    assert!(lambda.calls().contains(&Call::Tag(
        FUNCTION_ARN.to_string(),
        BTreeMap::from([("team".to_string(), "data".to_string())])
    )));
}

#[tokio::test]
async fn update_without_any_arn_skips_tagging() {
    let dir = tempfile::tempdir().unwrap();
    let artifact = artifact(&dir);
    let cfg = config(&format!("{BASE}tags:\n  team: data\n"));
    let mut lambda = FakeLambda::new(Some(ExistingFunction::default()));
    lambda.config_arn = None;

    let outcome = Deployer::new(&lambda, &FakeStore::default(), &FakeIdentity::default(), &cfg)
        .with_wait_policy(no_wait())
        .deploy_zip(&artifact, false)
        .await
        .unwrap();

    assert_eq!(outcome.function_arn, None);
    assert!(
        !lambda
            .calls()
            .iter()
            .any(|c| matches!(c, Call::Tag(..) | Call::Untag(..)))
    );
}

#[tokio::test]
async fn failed_update_stops_before_configuration() {
    let dir = tempfile::tempdir().unwrap();
    let artifact = artifact(&dir);
    let cfg = config(BASE);
    let lambda = FakeLambda::new(Some(ExistingFunction::default()))
        .with_statuses(vec![UpdateStatus::Failed("InvalidImage".to_string())]);

    let err = Deployer::new(&lambda, &FakeStore::default(), &FakeIdentity::default(), &cfg)
        .with_wait_policy(no_wait())
        .deploy_zip(&artifact, false)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        DeployError::Aws(AwsError::UpdateFailed { ref reason, .. }) if reason == "InvalidImage"
    ));
    assert!(!lambda.calls().iter().any(|c| matches!(c, Call::UpdateConfig(_))));
}

#[tokio::test]
async fn stuck_update_times_out_after_max_attempts() {
    let dir = tempfile::tempdir().unwrap();
    let artifact = artifact(&dir);
    let cfg = config(BASE);
    let mut lambda = FakeLambda::new(Some(ExistingFunction::default()));
    lambda.settled = UpdateStatus::InProgress;

    let err = Deployer::new(&lambda, &FakeStore::default(), &FakeIdentity::default(), &cfg)
        .with_wait_policy(no_wait())
        .deploy_zip(&artifact, false)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        DeployError::Aws(AwsError::WaitTimeout { attempts: 3, .. })
    ));
    let polls = lambda
        .calls()
        .iter()
        .filter(|c| matches!(c, Call::Status(_)))
        .count();
    assert_eq!(polls, 3);
}

#[tokio::test]
async fn staged_deploy_uploads_then_creates_from_object() {
    let dir = tempfile::tempdir().unwrap();
    let artifact = artifact(&dir);
    let cfg = config(&format!("{BASE}bucket_name: deploy-bucket\ns3_key_prefix: builds/\n"));
    let lambda = FakeLambda::new(None);
    let store = FakeStore::default();
    let identity = FakeIdentity::default();

    Deployer::new(&lambda, &store, &identity, &cfg)
        .deploy_staged(&artifact, false)
        .await
        .unwrap();

    let puts = store.puts.lock().unwrap().clone();
    assert_eq!(puts.len(), 1);
    let (bucket, key, size) = &puts[0];
    assert_eq!(bucket, "deploy-bucket");
    assert!(key.starts_with(&format!("builds/{}-", artifact.md5)));
    assert!(key.ends_with(".zip"));
    assert_eq!(*size as u64, artifact.size);

    let calls = lambda.calls();
    let Some(Call::Create(request)) = calls.iter().find(|c| matches!(c, Call::Create(_))) else {
        panic!("expected create");
    };
    assert_eq!(
        request.code,
        CodeSource::S3 {
            bucket: bucket.clone(),
            key: key.clone(),
        }
    );
}

#[tokio::test]
async fn upload_requires_bucket() {
    let dir = tempfile::tempdir().unwrap();
    let artifact = artifact(&dir);
    let cfg = config(BASE);
    if std::env::var("S3_BUCKET_NAME").is_ok() {
        return;
    }
    let lambda = FakeLambda::new(None);
    let store = FakeStore::default();

    let err = Deployer::new(&lambda, &store, &FakeIdentity::default(), &cfg)
        .upload(&artifact)
        .await
        .unwrap_err();
    assert!(err.to_string().contains("bucket_name"));
    assert!(store.puts.lock().unwrap().is_empty());
}

#[tokio::test]
async fn image_deploy_requires_existing_function() {
    let cfg = config(BASE);
    let lambda = FakeLambda::new(None);

    let err = Deployer::new(&lambda, &FakeStore::default(), &FakeIdentity::default(), &cfg)
        .deploy_image("1.dkr.ecr.us-east-1.amazonaws.com/orders:v1", false)
        .await
        .unwrap_err();

    assert!(matches!(err, DeployError::Aws(AwsError::FunctionNotFound { .. })));
    assert_eq!(lambda.calls(), vec![Call::Get("orders".to_string())]);
}

#[tokio::test]
async fn image_deploy_preserves_vpc_and_omits_runtime() {
    let cfg = config(&format!("{BASE}runtime: python3.12\nrole: arn:aws:iam::9:role/custom\n"));
    let vpc = VpcSettings {
        subnet_ids: vec!["subnet-1".to_string()],
        security_group_ids: vec!["sg-1".to_string()],
    };
    let lambda = FakeLambda::new(Some(ExistingFunction {
        vpc: Some(vpc.clone()),
        ..Default::default()
    }));
    let identity = FakeIdentity::default();
    let uri = "1.dkr.ecr.us-east-1.amazonaws.com/orders:v1";

    Deployer::new(&lambda, &FakeStore::default(), &identity, &cfg)
        .with_wait_policy(no_wait())
        .deploy_image(uri, true)
        .await
        .unwrap();

    let calls = lambda.calls();
    assert!(calls.contains(&Call::UpdateCode(
        "orders".to_string(),
        CodeSource::Image(uri.to_string())
    )));
    let Some(Call::UpdateConfig(update)) = calls.iter().find(|c| matches!(c, Call::UpdateConfig(_)))
    else {
        panic!("expected configuration update");
    };
    assert_eq!(update.vpc, vpc);
    assert_eq!(update.runtime, None);
    assert_eq!(update.handler, None);
    assert_eq!(update.role, "arn:aws:iam::9:role/custom");
    // Role given as an ARN needs no account lookup
    assert_eq!(identity.lookups.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn cleanup_skips_failed_deletes_and_continues() {
    let cfg = config(BASE);
    let mut lambda = FakeLambda::new(None);
    lambda.versions = ["$LATEST", "1", "2", "3", "4", "5"]
        .iter()
        .map(|v| v.to_string())
        .collect();
    lambda.undeletable = vec!["2".to_string()];

    let outcome = Deployer::new(&lambda, &FakeStore::default(), &FakeIdentity::default(), &cfg)
        .cleanup_old_versions(2)
        .await
        .unwrap();

    let CleanupOutcome::Deleted { deleted, skipped } = outcome else {
        panic!("expected deletions");
    };
    assert_eq!(deleted, vec!["1", "3"]);
    assert_eq!(skipped.len(), 1);
    assert_eq!(skipped[0].0, "2");
}

#[tokio::test]
async fn cleanup_refuses_non_positive_keep_last() {
    let cfg = config(BASE);
    let lambda = FakeLambda::new(None);

    for keep_last in [0, -1] {
        let outcome = Deployer::new(&lambda, &FakeStore::default(), &FakeIdentity::default(), &cfg)
            .cleanup_old_versions(keep_last)
            .await
            .unwrap();
        assert_eq!(outcome, CleanupOutcome::Refused);
    }
    assert!(lambda.calls().is_empty());
}

#[tokio::test]
async fn cleanup_with_too_few_versions_deletes_nothing() {
    let cfg = config(BASE);
    let mut lambda = FakeLambda::new(None);
    lambda.versions = vec!["$LATEST".to_string(), "1".to_string()];

    let outcome = Deployer::new(&lambda, &FakeStore::default(), &FakeIdentity::default(), &cfg)
        .cleanup_old_versions(5)
        .await
        .unwrap();
    assert_eq!(outcome, CleanupOutcome::NothingToDelete);
}

#[tokio::test]
async fn remote_invoke_sends_event_payload() {
    let cfg = config(BASE);
    let lambda = FakeLambda::new(None);
    let event = serde_json::json!({ "order_id": 7 });

    let output = lambda_deploy::invoke::invoke_remote(&lambda, &cfg, &event)
        .await
        .unwrap();

    assert_eq!(output.status_code, 200);
    assert_eq!(
        serde_json::from_slice::<serde_json::Value>(&output.payload).unwrap(),
        event
    );
}
