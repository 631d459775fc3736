//! Request construction from the function config.
//!
//! Everything here is a pure function of the config and the existing
//! function state, so the payloads can be checked without the network.

use crate::aws::{CodeSource, ConfigurationUpdate, CreateFunctionRequest, ExistingFunction};
use crate::config::{FunctionConfig, VpcSettings};
use crate::error::Result;
use std::collections::BTreeMap;

/// Build the create request for a new function
pub fn create_request(
    config: &FunctionConfig,
    function_name: &str,
    role_arn: &str,
    code: CodeSource,
) -> Result<CreateFunctionRequest> {
    let handler = match code {
        CodeSource::Image(_) => config.handler.clone().unwrap_or_default(),
        _ => config.handler()?.to_string(),
    };

    Ok(CreateFunctionRequest {
        function_name: function_name.to_string(),
        runtime: config.runtime_or_default().to_string(),
        role: role_arn.to_string(),
        handler,
        code,
        description: config.description_or_default().to_string(),
        timeout: config.timeout_or_default(),
        memory_size: config.memory_size_or_default(),
        vpc: config.vpc(),
        publish: true,
        tags: config.tags(),
        environment: config.environment(),
    })
}

/// Build the configuration update sent after new code is live.
///
/// Image functions carry neither runtime nor handler. With `preserve_vpc`
/// the existing function's VPC attachment is kept when it has one.
pub fn configuration_update(
    config: &FunctionConfig,
    function_name: &str,
    role_arn: &str,
    existing: &ExistingFunction,
    preserve_vpc: bool,
    is_image: bool,
) -> ConfigurationUpdate {
    let vpc = if preserve_vpc {
        existing.vpc.clone().unwrap_or_else(|| config.vpc())
    } else {
        config.vpc()
    };

    let (runtime, handler) = if is_image {
        (None, None)
    } else {
        (config.runtime.clone(), config.handler.clone())
    };

    ConfigurationUpdate {
        function_name: function_name.to_string(),
        role: role_arn.to_string(),
        runtime,
        handler,
        description: config.description_or_default().to_string(),
        timeout: config.timeout_or_default(),
        memory_size: config.memory_size_or_default(),
        vpc,
        environment: config.environment(),
    }
}

/// What to do with reserved concurrency on update
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConcurrencyChange {
    /// Set reserved concurrency
    Put(i32),
    /// Remove the existing reservation
    Delete,
    /// Leave as is
    Keep,
}

/// Decide the concurrency call for an update
pub fn concurrency_change(config: &FunctionConfig, existing: &ExistingFunction) -> ConcurrencyChange {
    match config.concurrency() {
        n if n > 0 => ConcurrencyChange::Put(n),
        _ if existing.reserved_concurrency.is_some() => ConcurrencyChange::Delete,
        _ => ConcurrencyChange::Keep,
    }
}

/// Tag calls needed to bring the function's tags to the configured set
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagChange {
    /// Keys to remove first
    pub untag: Vec<String>,
    /// Tags to apply
    pub tag: BTreeMap<String, String>,
}

/// Compare configured tags with the existing ones.
///
/// `None` when tags are not configured or already match. Otherwise every
/// existing key is removed and the configured set applied.
pub fn tag_change(
    configured: Option<&BTreeMap<String, String>>,
    existing: &BTreeMap<String, String>,
) -> Option<TagChange> {
    let configured = configured?;
    if configured == existing {
        return None;
    }
    Some(TagChange {
        untag: existing.keys().cloned().collect(),
        tag: configured.clone(),
    })
}

/// Which versions a cleanup removes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CleanupPlan {
    /// Keeping zero versions is refused
    Refused,
    /// Fewer versions than would be kept
    TooFewVersions,
    /// Versions to delete, oldest first
    Delete(Vec<String>),
}

/// Select versions to delete, keeping `$LATEST` (the first entry) and the
/// newest `keep_last` versions.
pub fn cleanup_plan(versions: &[String], keep_last: i64) -> CleanupPlan {
    if keep_last <= 0 {
        return CleanupPlan::Refused;
    }
    let keep_last = usize::try_from(keep_last).unwrap_or(usize::MAX);
    if versions.len() < keep_last {
        return CleanupPlan::TooFewVersions;
    }
    let end = versions.len() - keep_last;
    if end <= 1 {
        return CleanupPlan::Delete(Vec::new());
    }
    CleanupPlan::Delete(versions[1..end].to_vec())
}

/// VPC settings to compare in logs
pub fn describe_vpc(vpc: &VpcSettings) -> String {
    if vpc.subnet_ids.is_empty() && vpc.security_group_ids.is_empty() {
        "no VPC".to_string()
    } else {
        format!(
            "subnets [{}], security groups [{}]",
            vpc.subnet_ids.join(", "),
            vpc.security_group_ids.join(", ")
        )
    }
}
