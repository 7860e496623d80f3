//! Drop and create the staging and star-schema tables

use anyhow::Result;
use tracing::info;

use super::sql::{CREATE_TABLE_QUERIES, DROP_TABLE_QUERIES};
use super::{Warehouse, execute_each};

/// Drop all seven tables. Missing tables are skipped.
pub async fn drop_tables<W: Warehouse>(warehouse: &mut W) -> Result<()> {
    info!(count = DROP_TABLE_QUERIES.len(), "Dropping tables");
    execute_each(warehouse, &DROP_TABLE_QUERIES, "drop tables").await
}

/// Create all seven tables. Existing tables are left untouched.
pub async fn create_tables<W: Warehouse>(warehouse: &mut W) -> Result<()> {
    info!(count = CREATE_TABLE_QUERIES.len(), "Creating tables");
    execute_each(warehouse, &CREATE_TABLE_QUERIES, "create tables").await
}
