//! ARN and registry URI composition.

use crate::error::{ConfigError, Result};

/// Regions whose resources live outside the `aws` partition
const PARTITIONS: &[(&str, &str)] = &[
    ("cn-north-1", "aws-cn"),
    ("cn-northwest-1", "aws-cn"),
    ("us-gov-west-1", "aws-us-gov"),
];

/// ARN partition for a region
pub fn partition_for_region(region: Option<&str>) -> &'static str {
    region
        .and_then(|region| {
            PARTITIONS
                .iter()
                .find(|(name, _)| *name == region)
                .map(|(_, partition)| *partition)
        })
        .unwrap_or("aws")
}

/// Execution role ARN for a role name.
///
/// A role that is already an ARN is returned unchanged.
pub fn role_arn(region: Option<&str>, account_id: &str, role: &str) -> String {
    if role.starts_with("arn:") {
        return role.to_string();
    }
    format!(
        "arn:{}:iam::{}:role/{}",
        partition_for_region(region),
        account_id,
        role
    )
}

/// ECR image URI, `<account>.dkr.ecr.<region>.amazonaws.com/<repository>[:<tag>]`
pub fn ecr_uri(
    account_id: Option<&str>,
    region: Option<&str>,
    repository: Option<&str>,
    tag: Option<&str>,
) -> Result<String> {
    let account_id = account_id.ok_or(ConfigError::MissingKey { key: "aws_account_id" })?;
    let region = region.ok_or(ConfigError::MissingKey { key: "region" })?;
    let repository = repository.ok_or(ConfigError::MissingKey { key: "ecr_repository" })?;

    let mut uri = format!("{account_id}.dkr.ecr.{region}.amazonaws.com/{repository}");
    if let Some(tag) = tag {
        uri.push(':');
        uri.push_str(tag);
    }
    Ok(uri)
}
