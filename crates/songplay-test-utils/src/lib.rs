//! Shared test utilities for songplay-dwh
//!
//! ## Modules
//!
//! - [`aws`]: AWS region detection and unique resource names
//! - [`settings`]: Ready-made `Settings` fixtures

pub mod aws;
pub mod settings;

// Re-export commonly used items
pub use aws::{get_test_region, test_cluster_identifier, test_role_name, test_run_id};
pub use settings::{test_settings, test_settings_multi_node};
