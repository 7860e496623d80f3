//! songplay-dwh - Redshift provisioning and star-schema ETL
//!
//! This crate provides the `songplay-dwh` binary that creates the IAM role
//! and Redshift cluster, builds the staging and star-schema tables, loads them
//! from S3, and tears everything down again.

pub mod aws;
pub mod provision;
pub mod wait;
pub mod warehouse;
