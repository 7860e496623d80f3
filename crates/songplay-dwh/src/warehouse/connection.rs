//! Connection to the Redshift database over the Postgres wire protocol

use anyhow::{Context, Result};
use songplay_common::Settings;
use sqlx::postgres::{PgConnectOptions, PgConnection};
use sqlx::Connection;
use tracing::{debug, info};

use super::Warehouse;

const APPLICATION_NAME: &str = "songplay-dwh";

/// Build connect options for the cluster database.
///
/// `host` is either `cluster.host` from the settings or the endpoint address
/// reported by describe-cluster.
pub fn connect_options(settings: &Settings, host: &str) -> PgConnectOptions {
    let cluster = &settings.cluster;
    PgConnectOptions::new()
        .host(host)
        .port(cluster.port)
        .username(cluster.db_user())
        .password(cluster.db_password())
        .database(&cluster.db_name)
        .application_name(APPLICATION_NAME)
}

/// A single session against the cluster.
///
/// Statements run through the simple-query protocol (Redshift `COPY` and
/// multi-statement DDL are not preparable). A transaction is opened by the
/// first `execute` after each commit.
pub struct RedshiftConnection {
    conn: PgConnection,
    in_transaction: bool,
}

impl RedshiftConnection {
    pub async fn connect(options: &PgConnectOptions) -> Result<Self> {
        let host = options.get_host().to_string();
        let conn = PgConnection::connect_with(options)
            .await
            .with_context(|| format!("Failed to connect to {host}:{}", options.get_port()))?;

        info!(host = %host, port = options.get_port(), "Connected to warehouse");
        Ok(Self {
            conn,
            in_transaction: false,
        })
    }

    /// Roll back anything uncommitted and close the session
    pub async fn close(mut self) -> Result<()> {
        if self.in_transaction {
            debug!("Rolling back uncommitted statements");
            sqlx::raw_sql("ROLLBACK")
                .execute(&mut self.conn)
                .await
                .context("Failed to roll back")?;
        }
        self.conn.close().await.context("Failed to close connection")?;
        Ok(())
    }
}

impl Warehouse for RedshiftConnection {
    async fn execute(&mut self, sql: &str) -> Result<()> {
        if !self.in_transaction {
            sqlx::raw_sql("BEGIN")
                .execute(&mut self.conn)
                .await
                .context("Failed to begin transaction")?;
            self.in_transaction = true;
        }

        let result = sqlx::raw_sql(sql).execute(&mut self.conn).await?;
        debug!(rows_affected = result.rows_affected(), "Statement executed");
        Ok(())
    }

    async fn commit(&mut self) -> Result<()> {
        if self.in_transaction {
            sqlx::raw_sql("COMMIT")
                .execute(&mut self.conn)
                .await
                .context("Failed to commit")?;
            self.in_transaction = false;
        }
        Ok(())
    }
}
