//! Settings file model
//!
//! Settings are read once from a TOML file at process start and passed by
//! reference to everything downstream. Nothing mutates them after loading.
//!
//! ```toml
//! [aws]
//! region = "us-west-2"
//!
//! [iam]
//! role_name = "dwhRole"
//!
//! [cluster]
//! cluster_type = "single-node"
//! node_type = "dc2.large"
//! security_group = "sg-0123456789abcdef0"
//! identifier = "dwhCluster"
//! db_name = "dwh"
//! master_user = "dwhuser"
//! master_password = "Passw0rd"
//!
//! [s3]
//! log_data = "s3://udacity-dend/log_data"
//! log_jsonpath = "s3://udacity-dend/log_json_path.json"
//! song_data = "s3://udacity-dend/song_data"
//! ```

use crate::defaults::{
    default_db_port, default_policy_arn, default_poll_interval_secs, default_source_region,
};
use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::Path;
use std::time::Duration;

/// A string that never shows up in `Debug` output
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Secret(String);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Borrow the underlying value
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("\"***\"")
    }
}

/// Redshift cluster topology
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ClusterTopology {
    SingleNode,
    MultiNode,
}

impl ClusterTopology {
    /// Value expected by the Redshift `ClusterType` parameter
    pub fn as_str(&self) -> &'static str {
        match self {
            ClusterTopology::SingleNode => "single-node",
            ClusterTopology::MultiNode => "multi-node",
        }
    }
}

impl fmt::Display for ClusterTopology {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `[aws]` section
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AwsSettings {
    /// Region for the IAM and Redshift clients
    pub region: String,

    /// Access key ID; the default credential chain is used when absent
    #[serde(default)]
    pub key: Option<String>,

    /// Secret access key paired with `key`
    #[serde(default)]
    pub secret: Option<Secret>,
}

impl AwsSettings {
    /// Static credentials, when both halves are configured
    pub fn static_credentials(&self) -> Option<(&str, &str)> {
        match (&self.key, &self.secret) {
            (Some(key), Some(secret)) => Some((key.as_str(), secret.expose())),
            _ => None,
        }
    }
}

/// `[iam]` section
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IamSettings {
    /// Name of the role the cluster assumes to read from S3
    pub role_name: String,

    /// ARN of that role, used by the COPY statements.
    /// Looked up by name when absent.
    #[serde(default)]
    pub role_arn: Option<String>,

    /// Managed policy attached to the role
    #[serde(default = "default_policy_arn")]
    pub policy_arn: String,
}

/// `[cluster]` section
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ClusterSettings {
    pub cluster_type: ClusterTopology,

    /// Node type (e.g., "dc2.large")
    pub node_type: String,

    /// Number of compute nodes; ignored for single-node clusters
    #[serde(default)]
    pub num_nodes: Option<u32>,

    /// VPC security group ID
    pub security_group: String,

    /// Cluster identifier
    pub identifier: String,

    /// Database created with the cluster
    pub db_name: String,

    pub master_user: String,
    pub master_password: Secret,

    /// Connection user; defaults to `master_user`
    #[serde(default)]
    pub db_user: Option<String>,

    /// Connection password; defaults to `master_password`
    #[serde(default)]
    pub db_password: Option<Secret>,

    /// Endpoint host; resolved from describe-clusters when absent
    #[serde(default)]
    pub host: Option<String>,

    #[serde(default = "default_db_port")]
    pub port: u16,

    /// Delay between status checks while creating or deleting
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,

    /// Give up waiting after this long; unbounded when absent
    #[serde(default)]
    pub poll_timeout_secs: Option<u64>,
}

impl ClusterSettings {
    /// Node count to send with a create request.
    ///
    /// Always `None` for single-node clusters, which reject the parameter.
    pub fn node_count(&self) -> Option<u32> {
        match self.cluster_type {
            ClusterTopology::SingleNode => None,
            ClusterTopology::MultiNode => self.num_nodes,
        }
    }

    pub fn db_user(&self) -> &str {
        self.db_user.as_deref().unwrap_or(&self.master_user)
    }

    pub fn db_password(&self) -> &str {
        self.db_password
            .as_ref()
            .unwrap_or(&self.master_password)
            .expose()
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn poll_timeout(&self) -> Option<Duration> {
        self.poll_timeout_secs.map(Duration::from_secs)
    }
}

/// `[s3]` section
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct S3Settings {
    /// Prefix holding the event logs
    pub log_data: String,

    /// JSONPaths file describing the event log layout
    pub log_jsonpath: String,

    /// Prefix holding the song catalog
    pub song_data: String,

    /// Region of the source bucket
    #[serde(default = "default_source_region")]
    pub region: String,
}

/// Complete settings file
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Settings {
    pub aws: AwsSettings,
    pub iam: IamSettings,
    pub cluster: ClusterSettings,
    pub s3: S3Settings,
}

impl Settings {
    /// Load and validate settings from a TOML file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content =
            fs::read_to_string(path).map_err(|e| ConfigError::io(path.display().to_string(), e))?;
        content.parse()
    }

    /// Validate settings values
    pub fn validate(&self) -> Result<(), ConfigError> {
        let required = [
            ("aws.region", self.aws.region.as_str()),
            ("iam.role_name", self.iam.role_name.as_str()),
            ("iam.policy_arn", self.iam.policy_arn.as_str()),
            ("cluster.node_type", self.cluster.node_type.as_str()),
            ("cluster.security_group", self.cluster.security_group.as_str()),
            ("cluster.identifier", self.cluster.identifier.as_str()),
            ("cluster.db_name", self.cluster.db_name.as_str()),
            ("cluster.master_user", self.cluster.master_user.as_str()),
            (
                "cluster.master_password",
                self.cluster.master_password.expose(),
            ),
            ("s3.log_data", self.s3.log_data.as_str()),
            ("s3.log_jsonpath", self.s3.log_jsonpath.as_str()),
            ("s3.song_data", self.s3.song_data.as_str()),
            ("s3.region", self.s3.region.as_str()),
        ];
        if let Some((name, _)) = required.iter().find(|(_, value)| value.trim().is_empty()) {
            return Err(ConfigError::EmptyField(*name));
        }

        if self.aws.key.is_some() != self.aws.secret.is_some() {
            return Err(ConfigError::PartialCredentials);
        }

        if self.cluster.cluster_type == ClusterTopology::MultiNode {
            match self.cluster.num_nodes {
                None => return Err(ConfigError::MissingNodeCount),
                Some(n) if n < 2 => return Err(ConfigError::InvalidNodeCount(n)),
                Some(_) => {}
            }
        }

        if self.cluster.port == 0 {
            return Err(ConfigError::InvalidPort);
        }

        if self.cluster.poll_interval_secs == 0 {
            return Err(ConfigError::InvalidPollInterval);
        }

        if self.cluster.poll_timeout_secs == Some(0) {
            return Err(ConfigError::InvalidPollTimeout);
        }

        Ok(())
    }
}

impl std::str::FromStr for Settings {
    type Err = ConfigError;

    /// Parse and validate settings from TOML text
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let settings: Settings = toml::from_str(s)?;
        settings.validate()?;
        Ok(settings)
    }
}
