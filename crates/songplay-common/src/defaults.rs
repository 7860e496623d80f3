//! Default configuration values
//!
//! These constants are used as serde defaults for optional settings keys.

/// Default settings file name, looked up in the working directory
pub const DEFAULT_CONFIG_PATH: &str = "dwh.toml";

/// Managed policy granting the warehouse read access to the source buckets
pub const DEFAULT_POLICY_ARN: &str = "arn:aws:iam::aws:policy/AmazonS3ReadOnlyAccess";

/// Default Redshift listener port
pub const DEFAULT_DB_PORT: u16 = 5439;

/// Default delay between cluster status checks, in seconds
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 20;

/// Region of the public bucket holding the song and event logs
pub const DEFAULT_SOURCE_REGION: &str = "us-west-2";

// Serde default functions for struct field defaults

/// Returns the default policy ARN
pub fn default_policy_arn() -> String {
    DEFAULT_POLICY_ARN.to_string()
}

/// Returns the default database port
pub fn default_db_port() -> u16 {
    DEFAULT_DB_PORT
}

/// Returns the default poll interval
pub fn default_poll_interval_secs() -> u64 {
    DEFAULT_POLL_INTERVAL_SECS
}

/// Returns the default source bucket region
pub fn default_source_region() -> String {
    DEFAULT_SOURCE_REGION.to_string()
}
