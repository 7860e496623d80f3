//! IAM role lifecycle: ensure the cluster's role exists, tear it down again

use anyhow::{Context, Result};
use songplay_common::Settings;
use tracing::{info, warn};

use crate::aws::AwsError;
use crate::aws::iam::{IamOperations, ROLE_DESCRIPTION, redshift_trust_policy};

/// The role the cluster assumes to read from S3
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleHandle {
    pub name: String,
    pub arn: String,
    /// False when the role already existed and was reused as-is
    pub created: bool,
}

/// Create the cluster role and attach the S3 read policy.
///
/// An existing role is reused: its ARN is fetched and returned without
/// attaching anything, so policies attached by hand are left alone.
pub async fn ensure_role<I: IamOperations>(iam: &I, settings: &Settings) -> Result<RoleHandle> {
    let role_name = settings.iam.role_name.as_str();
    let trust_policy = redshift_trust_policy();

    info!(role_name = %role_name, "Creating IAM role");
    match iam
        .create_role(role_name, ROLE_DESCRIPTION, &trust_policy)
        .await
    {
        Ok(()) => {
            iam.attach_role_policy(role_name, &settings.iam.policy_arn)
                .await
                .with_context(|| {
                    format!(
                        "Failed to attach {} to role {}",
                        settings.iam.policy_arn, role_name
                    )
                })?;
            info!(role_name = %role_name, policy_arn = %settings.iam.policy_arn, "Policy attached");

            let arn = fetch_role_arn(iam, role_name).await?;
            Ok(RoleHandle {
                name: role_name.to_string(),
                arn,
                created: true,
            })
        }
        Err(AwsError::AlreadyExists { message }) => {
            warn!(
                role_name = %role_name,
                %message,
                "IAM role already exists; reusing it (its attached policies are not updated)"
            );
            let arn = fetch_role_arn(iam, role_name).await?;
            Ok(RoleHandle {
                name: role_name.to_string(),
                arn,
                created: false,
            })
        }
        Err(e) => {
            Err(anyhow::Error::new(e).context(format!("Failed to create IAM role {role_name}")))
        }
    }
}

async fn fetch_role_arn<I: IamOperations>(iam: &I, role_name: &str) -> Result<String> {
    let arn = iam
        .get_role_arn(role_name)
        .await
        .with_context(|| format!("Failed to look up IAM role {role_name}"))?;
    info!(role_name = %role_name, role_arn = %arn, "IAM role ready");
    Ok(arn)
}

/// The role ARN the COPY statements run with.
///
/// Uses `iam.role_arn` when configured, otherwise looks the role up by name.
pub async fn resolve_role_arn<I: IamOperations>(iam: &I, settings: &Settings) -> Result<String> {
    match &settings.iam.role_arn {
        Some(arn) => Ok(arn.clone()),
        None => fetch_role_arn(iam, &settings.iam.role_name).await,
    }
}

/// Detach every managed policy from the cluster role, then delete it.
pub async fn delete_role<I: IamOperations>(iam: &I, settings: &Settings) -> Result<()> {
    let role_name = settings.iam.role_name.as_str();

    let policies = iam
        .list_attached_role_policies(role_name)
        .await
        .with_context(|| format!("Failed to list policies of IAM role {role_name}"))?;

    for policy_arn in &policies {
        iam.detach_role_policy(role_name, policy_arn)
            .await
            .with_context(|| format!("Failed to detach {policy_arn} from role {role_name}"))?;
        info!(role_name = %role_name, policy_arn = %policy_arn, "Policy detached");
    }

    iam.delete_role(role_name)
        .await
        .with_context(|| format!("Failed to delete IAM role {role_name}"))?;
    info!(role_name = %role_name, "IAM role deleted");

    Ok(())
}
