//! AWS error classification and handling
//!
//! Provides typed errors for AWS SDK operations using the `.code()` method
//! instead of string matching on Debug format.

use aws_sdk_iam::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use thiserror::Error;

/// AWS error categories for the soft-failure paths
#[derive(Debug, Error)]
pub enum AwsError {
    /// Resource was not found
    #[error("Resource not found: {resource_type} '{resource_id}'")]
    NotFound {
        resource_type: &'static str,
        resource_id: String,
    },

    /// Resource already exists
    #[error("Resource already exists: {message}")]
    AlreadyExists { message: String },

    /// Rate limit exceeded
    #[error("Rate limit exceeded")]
    Throttled,

    /// Resource still has dependents (e.g., a role with attached policies)
    #[error("Resource has dependent objects: {message}")]
    DeleteConflict { message: String },

    /// Generic AWS SDK error with code and message
    #[error("AWS error: {message}")]
    Sdk {
        code: Option<String>,
        message: String,
    },
}

impl AwsError {
    /// Check if this is a "not found" error
    pub fn is_not_found(&self) -> bool {
        matches!(self, AwsError::NotFound { .. })
    }

    /// Check if this is an "already exists" error
    pub fn is_already_exists(&self) -> bool {
        matches!(self, AwsError::AlreadyExists { .. })
    }

    /// The AWS error code, when one was reported
    pub fn code(&self) -> Option<&str> {
        match self {
            AwsError::Sdk { code, .. } => code.as_deref(),
            _ => None,
        }
    }

    /// Get a user-friendly suggestion for resolving this error, if available.
    pub fn suggestion(&self) -> Option<String> {
        match self {
            AwsError::Throttled => suggestion_for_code("Throttling"),
            AwsError::DeleteConflict { .. } => suggestion_for_code("DeleteConflict"),
            AwsError::Sdk { code: Some(c), .. } => suggestion_for_code(c),
            _ => None,
        }
    }
}

/// Known AWS error codes for "not found" conditions
const NOT_FOUND_CODES: &[&str] = &["NoSuchEntity", "ClusterNotFound", "ClusterNotFoundFault"];

/// Known AWS error codes for "already exists" conditions
const ALREADY_EXISTS_CODES: &[&str] = &[
    "EntityAlreadyExists",
    "ClusterAlreadyExists",
    "ClusterAlreadyExistsFault",
];

/// Known AWS error codes for throttling/rate limiting
const THROTTLING_CODES: &[&str] = &["Throttling", "ThrottlingException", "RequestLimitExceeded"];

/// Known AWS error codes for deletes blocked by dependents
const DELETE_CONFLICT_CODES: &[&str] = &["DeleteConflict"];

/// Classify an AWS error from its code and message.
pub fn classify_aws_error(code: Option<&str>, message: Option<&str>) -> AwsError {
    let message = message.unwrap_or("Unknown error").to_string();

    match code {
        Some(c) if NOT_FOUND_CODES.contains(&c) => AwsError::NotFound {
            resource_type: "resource",
            resource_id: message,
        },
        Some(c) if ALREADY_EXISTS_CODES.contains(&c) => AwsError::AlreadyExists { message },
        Some(c) if THROTTLING_CODES.contains(&c) => AwsError::Throttled,
        Some(c) if DELETE_CONFLICT_CODES.contains(&c) => AwsError::DeleteConflict { message },
        _ => AwsError::Sdk {
            code: code.map(|s| s.to_string()),
            message,
        },
    }
}

/// Classify an SDK operation error by its error code.
///
/// Works for any service: IAM and Redshift share the same `SdkError` type.
/// Errors without a service-reported message (timeouts, dispatch failures)
/// keep the full error context as their message.
pub fn classify_sdk_error<E, R>(err: SdkError<E, R>) -> AwsError
where
    E: ProvideErrorMetadata + std::error::Error + 'static,
    R: std::fmt::Debug,
{
    let code = err.code().map(|c| c.to_string());
    let reported = err.message().map(|m| m.to_string());
    let message = match reported {
        Some(m) => m,
        None => DisplayErrorContext(err).to_string(),
    };
    classify_aws_error(code.as_deref(), Some(&message))
}

/// Error code to user-friendly suggestion mapping
const SUGGESTIONS: &[(&str, &str)] = &[
    (
        "AccessDenied",
        "Check that the configured credentials allow the iam:* and redshift:* actions used here.",
    ),
    (
        "AccessDeniedException",
        "Check that the configured credentials allow the iam:* and redshift:* actions used here.",
    ),
    (
        "InvalidClientTokenId",
        "The access key in [aws] is not recognized. Check aws.key and aws.secret.",
    ),
    (
        "SignatureDoesNotMatch",
        "The secret access key does not match the access key. Check aws.secret.",
    ),
    (
        "ClusterQuotaExceeded",
        "Delete unused clusters or request a Redshift quota increase.",
    ),
    (
        "NumberOfNodesQuotaExceeded",
        "Lower cluster.num_nodes or request a Redshift node quota increase.",
    ),
    (
        "InsufficientClusterCapacity",
        "Try a different node type or region.",
    ),
    (
        "InvalidVPCNetworkState",
        "Check that cluster.security_group belongs to the default VPC of the region.",
    ),
    (
        "DeleteConflict",
        "Detach all policies from the role before deleting it.",
    ),
    (
        "Throttling",
        "AWS API rate limit hit. Wait a moment and run the command again.",
    ),
];

/// Get a user-friendly suggestion for a known error code.
fn suggestion_for_code(code: &str) -> Option<String> {
    SUGGESTIONS
        .iter()
        .find(|(c, _)| *c == code)
        .map(|(_, s)| (*s).to_string())
}
