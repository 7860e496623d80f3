//! AWS test utilities
//!
//! Provides region detection and unique resource names for AWS integration tests.

use chrono::Utc;

/// Get the AWS region for tests.
///
/// Checks environment variables in order:
/// 1. AWS_REGION
/// 2. AWS_DEFAULT_REGION
/// 3. Falls back to us-west-2
pub fn get_test_region() -> String {
    std::env::var("AWS_REGION")
        .or_else(|_| std::env::var("AWS_DEFAULT_REGION"))
        .unwrap_or_else(|_| "us-west-2".to_string())
}

/// Generate a unique run ID for test resources.
///
/// Format: `test-{timestamp_ms}-{counter}`.
pub fn test_run_id() -> String {
    use std::sync::atomic::{AtomicU32, Ordering};
    static COUNTER: AtomicU32 = AtomicU32::new(0);

    let ts = Utc::now().timestamp_millis();
    let counter = COUNTER.fetch_add(1, Ordering::Relaxed);
    format!("test-{}-{}", ts, counter)
}

/// Unique IAM role name for a test
pub fn test_role_name() -> String {
    format!("songplay-dwh-{}", test_run_id())
}

/// Unique Redshift cluster identifier for a test.
///
/// Redshift identifiers are lowercase, start with a letter and are at most
/// 63 characters, which the run ID format already satisfies.
pub fn test_cluster_identifier() -> String {
    format!("songplay-{}", test_run_id())
}
