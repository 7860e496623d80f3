//! Warehouse access: schema management and the staging/star-schema ETL
//!
//! Everything here talks to the database through the [`Warehouse`] trait so
//! that statement order and commit behaviour can be tested without a cluster.

pub mod connection;
pub mod etl;
pub mod schema;
pub mod sql;

pub use connection::{RedshiftConnection, connect_options};
pub use etl::{insert_tables, load_staging_tables};
pub use schema::{create_tables, drop_tables};
pub use sql::CopySource;

use anyhow::{Context, Result};
use tracing::{debug, info};

/// A database session that runs statements and commits them.
#[allow(async_fn_in_trait)]
#[cfg_attr(test, mockall::automock)]
pub trait Warehouse: Send {
    /// Run a single statement inside the current transaction
    async fn execute(&mut self, sql: &str) -> Result<()>;

    /// Commit the current transaction
    async fn commit(&mut self) -> Result<()>;
}

/// Run each statement in order, committing after every one.
///
/// Stops at the first failure; statements already committed stay applied.
pub(crate) async fn execute_each<W, S>(warehouse: &mut W, statements: &[S], step: &str) -> Result<()>
where
    W: Warehouse,
    S: AsRef<str>,
{
    for (index, statement) in statements.iter().enumerate() {
        let sql = statement.as_ref();
        debug!(step, index, sql = %sql.trim(), "Executing statement");

        warehouse
            .execute(sql)
            .await
            .with_context(|| format!("{step}: statement {} of {} failed", index + 1, statements.len()))?;
        warehouse
            .commit()
            .await
            .with_context(|| format!("{step}: commit after statement {} failed", index + 1))?;
    }

    info!(step, count = statements.len(), "Statements committed");
    Ok(())
}
