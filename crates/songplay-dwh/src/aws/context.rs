//! Shared AWS configuration context
//!
//! Provides `AwsContext` for loading AWS SDK configuration once and
//! creating the IAM and Redshift clients from the same config.

use aws_config::{BehaviorVersion, Region, SdkConfig};
use aws_sdk_iam::config::Credentials;
use songplay_common::AwsSettings;
use std::sync::Arc;

/// Provider name reported for credentials taken from the settings file
const SETTINGS_CREDENTIALS_PROVIDER: &str = "songplay-settings";

/// Shared AWS configuration context for creating service clients.
///
/// # Example
/// ```ignore
/// let aws = AwsContext::from_settings(&settings.aws).await;
///
/// let iam = IamClient::from_context(&aws);
/// let redshift = RedshiftClient::from_context(&aws);
/// ```
#[derive(Clone)]
pub struct AwsContext {
    config: Arc<SdkConfig>,
    region: String,
}

impl AwsContext {
    /// Load AWS configuration for the specified region.
    ///
    /// Credentials come from the default chain (environment, profile files,
    /// instance metadata).
    pub async fn new(region: &str) -> Self {
        let config = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(region.to_string()))
            .load()
            .await;

        Self {
            config: Arc::new(config),
            region: region.to_string(),
        }
    }

    /// Load AWS configuration with a static access key pair.
    pub async fn with_static_credentials(region: &str, key: &str, secret: &str) -> Self {
        let credentials = Credentials::new(key, secret, None, None, SETTINGS_CREDENTIALS_PROVIDER);
        let config = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(region.to_string()))
            .credentials_provider(credentials)
            .load()
            .await;

        Self {
            config: Arc::new(config),
            region: region.to_string(),
        }
    }

    /// Load AWS configuration from the `[aws]` settings section.
    ///
    /// Uses the configured key pair when present, the default chain otherwise.
    pub async fn from_settings(aws: &AwsSettings) -> Self {
        match aws.static_credentials() {
            Some((key, secret)) => Self::with_static_credentials(&aws.region, key, secret).await,
            None => Self::new(&aws.region).await,
        }
    }

    /// Get the underlying SDK config for direct client construction.
    pub fn sdk_config(&self) -> &SdkConfig {
        &self.config
    }

    /// Get the region string.
    pub fn region(&self) -> &str {
        &self.region
    }

    /// Create an IAM client from this context.
    pub fn iam_client(&self) -> aws_sdk_iam::Client {
        aws_sdk_iam::Client::new(self.sdk_config())
    }

    /// Create a Redshift client from this context.
    pub fn redshift_client(&self) -> aws_sdk_redshift::Client {
        aws_sdk_redshift::Client::new(self.sdk_config())
    }
}

impl std::fmt::Debug for AwsContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AwsContext")
            .field("region", &self.region)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_static_credentials_context() {
        let ctx = AwsContext::with_static_credentials("us-west-2", "AKIAEXAMPLE", "secret").await;
        assert_eq!(ctx.region(), "us-west-2");
        assert_eq!(
            ctx.sdk_config().region().map(|r| r.as_ref()),
            Some("us-west-2")
        );
        assert!(ctx.sdk_config().credentials_provider().is_some());
    }

    #[tokio::test]
    async fn test_debug_hides_config() {
        let ctx = AwsContext::with_static_credentials("us-west-2", "AKIAEXAMPLE", "secret").await;
        let debug = format!("{ctx:?}");
        assert!(debug.contains("us-west-2"));
        assert!(!debug.contains("AKIAEXAMPLE"));
    }

    #[tokio::test]
    #[ignore = "requires AWS credentials"]
    async fn test_context_creation() {
        let ctx = AwsContext::new("us-west-2").await;
        assert_eq!(ctx.region(), "us-west-2");
    }
}
