//! songplay-common - Settings and shared defaults
//!
//! This crate holds the configuration model shared by the provisioning and
//! ETL code, without any AWS SDK or database dependencies.
//!
//! ## Modules
//!
//! - [`defaults`]: Default configuration values
//! - [`error`]: Typed configuration errors
//! - [`settings`]: Settings file model, loading and validation

pub mod defaults;
pub mod error;
pub mod settings;

// Re-export commonly used types
pub use error::ConfigError;
pub use settings::{
    AwsSettings, ClusterSettings, ClusterTopology, IamSettings, S3Settings, Secret, Settings,
};
