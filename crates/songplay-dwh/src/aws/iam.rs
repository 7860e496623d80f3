//! IAM role management for the Redshift cluster

use crate::aws::context::AwsContext;
use crate::aws::error::{AwsError, classify_sdk_error};
use aws_sdk_iam::Client;
use tracing::debug;

/// Description attached to the role at creation time
pub const ROLE_DESCRIPTION: &str = "Allows Redshift clusters to call AWS services on your behalf.";

/// Generate the trust policy allowing Redshift to assume the role
pub fn redshift_trust_policy() -> String {
    serde_json::json!({
        "Version": "2012-10-17",
        "Statement": [
            {
                "Effect": "Allow",
                "Principal": {
                    "Service": "redshift.amazonaws.com"
                },
                "Action": "sts:AssumeRole"
            }
        ]
    })
    .to_string()
}

/// Trait for the IAM calls the role manager makes.
///
/// Each method is a single API call so that tests can assert on exactly
/// which calls happen, and in which order.
#[allow(async_fn_in_trait)]
#[cfg_attr(test, mockall::automock)]
pub trait IamOperations: Send + Sync {
    /// Create a role with the given trust policy
    async fn create_role(
        &self,
        role_name: &str,
        description: &str,
        trust_policy: &str,
    ) -> Result<(), AwsError>;

    /// Look up the ARN of an existing role
    async fn get_role_arn(&self, role_name: &str) -> Result<String, AwsError>;

    /// Attach a managed policy to a role
    async fn attach_role_policy(&self, role_name: &str, policy_arn: &str) -> Result<(), AwsError>;

    /// List the ARNs of all managed policies attached to a role
    async fn list_attached_role_policies(&self, role_name: &str)
    -> Result<Vec<String>, AwsError>;

    /// Detach a managed policy from a role
    async fn detach_role_policy(&self, role_name: &str, policy_arn: &str) -> Result<(), AwsError>;

    /// Delete a role (it must have no attached policies)
    async fn delete_role(&self, role_name: &str) -> Result<(), AwsError>;
}

/// IAM client backed by the AWS SDK
pub struct IamClient {
    client: Client,
}

impl IamClient {
    /// Create a new IAM client (loads AWS config from environment)
    pub async fn new(region: &str) -> Self {
        let ctx = AwsContext::new(region).await;
        Self::from_context(&ctx)
    }

    /// Create an IAM client from a pre-loaded AWS context
    pub fn from_context(ctx: &AwsContext) -> Self {
        Self {
            client: ctx.iam_client(),
        }
    }
}

impl IamOperations for IamClient {
    async fn create_role(
        &self,
        role_name: &str,
        description: &str,
        trust_policy: &str,
    ) -> Result<(), AwsError> {
        self.client
            .create_role()
            .path("/")
            .role_name(role_name)
            .description(description)
            .assume_role_policy_document(trust_policy)
            .send()
            .await
            .map_err(classify_sdk_error)?;

        debug!(role_name = %role_name, "IAM role created");
        Ok(())
    }

    async fn get_role_arn(&self, role_name: &str) -> Result<String, AwsError> {
        let response = self
            .client
            .get_role()
            .role_name(role_name)
            .send()
            .await
            .map_err(classify_sdk_error)?;

        response
            .role()
            .map(|role| role.arn().to_string())
            .ok_or_else(|| AwsError::NotFound {
                resource_type: "role",
                resource_id: role_name.to_string(),
            })
    }

    async fn attach_role_policy(&self, role_name: &str, policy_arn: &str) -> Result<(), AwsError> {
        self.client
            .attach_role_policy()
            .role_name(role_name)
            .policy_arn(policy_arn)
            .send()
            .await
            .map_err(classify_sdk_error)?;

        debug!(role_name = %role_name, policy_arn = %policy_arn, "Managed policy attached");
        Ok(())
    }

    async fn list_attached_role_policies(
        &self,
        role_name: &str,
    ) -> Result<Vec<String>, AwsError> {
        let mut policy_arns = Vec::new();
        let mut marker: Option<String> = None;

        loop {
            let mut request = self.client.list_attached_role_policies().role_name(role_name);
            if let Some(m) = &marker {
                request = request.marker(m);
            }

            let response = request.send().await.map_err(classify_sdk_error)?;

            policy_arns.extend(
                response
                    .attached_policies()
                    .iter()
                    .filter_map(|p| p.policy_arn())
                    .map(|arn| arn.to_string()),
            );

            // Handle pagination
            if response.is_truncated() {
                marker = response.marker().map(|s| s.to_string());
            } else {
                break;
            }
        }

        debug!(role_name = %role_name, count = policy_arns.len(), "Listed attached policies");
        Ok(policy_arns)
    }

    async fn detach_role_policy(&self, role_name: &str, policy_arn: &str) -> Result<(), AwsError> {
        self.client
            .detach_role_policy()
            .role_name(role_name)
            .policy_arn(policy_arn)
            .send()
            .await
            .map_err(classify_sdk_error)?;

        debug!(role_name = %role_name, policy_arn = %policy_arn, "Managed policy detached");
        Ok(())
    }

    async fn delete_role(&self, role_name: &str) -> Result<(), AwsError> {
        self.client
            .delete_role()
            .role_name(role_name)
            .send()
            .await
            .map_err(classify_sdk_error)?;

        debug!(role_name = %role_name, "IAM role deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trust_policy_allows_redshift_to_assume_role() {
        let policy: serde_json::Value = serde_json::from_str(&redshift_trust_policy()).unwrap();
        assert_eq!(policy["Version"], "2012-10-17");

        let statement = &policy["Statement"][0];
        assert_eq!(statement["Effect"], "Allow");
        assert_eq!(statement["Action"], "sts:AssumeRole");
        assert_eq!(
            statement["Principal"]["Service"],
            "redshift.amazonaws.com"
        );
        assert_eq!(policy["Statement"].as_array().map(Vec::len), Some(1));
    }
}
