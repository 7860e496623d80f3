//! AWS client modules
//!
//! This module provides wrappers around AWS SDK clients for:
//! - IAM: Role creation, policy attachment and teardown
//! - Redshift: Cluster creation, description and deletion

pub mod context;
pub mod error;
pub mod iam;
pub mod redshift;

// Core clients
pub use context::AwsContext;
pub use iam::{IamClient, IamOperations};
pub use redshift::{
    ClusterEndpoint, ClusterProps, CreateClusterRequest, RedshiftClient, RedshiftOperations,
};

// Error handling
pub use error::{AwsError, classify_aws_error, classify_sdk_error};
