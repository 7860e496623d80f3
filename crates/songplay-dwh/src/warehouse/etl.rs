//! Load the staging tables from S3, then fill the star schema from them

use anyhow::Result;
use tracing::info;

use super::sql::{CopySource, INSERT_TABLE_QUERIES, copy_table_queries};
use super::{Warehouse, execute_each};

/// COPY the event logs and song metadata into the staging tables.
pub async fn load_staging_tables<W: Warehouse>(warehouse: &mut W, source: &CopySource) -> Result<()> {
    info!(
        log_data = %source.log_data,
        song_data = %source.song_data,
        region = %source.region,
        "Loading staging tables"
    );
    execute_each(warehouse, &copy_table_queries(source), "load staging tables").await
}

/// Insert into `songplay`, `users`, `song`, `artist` and then `time`.
pub async fn insert_tables<W: Warehouse>(warehouse: &mut W) -> Result<()> {
    info!(count = INSERT_TABLE_QUERIES.len(), "Inserting into star schema");
    execute_each(warehouse, &INSERT_TABLE_QUERIES, "insert tables").await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::warehouse::MockWarehouse;
    use crate::warehouse::sql::{
        ARTIST_INSERT, SONG_INSERT, SONGPLAY_INSERT, TIME_INSERT, USERS_INSERT,
    };
    use mockall::Sequence;
    use songplay_test_utils::test_settings;
    use std::sync::{Arc, Mutex};

    const ROLE_ARN: &str = "arn:aws:iam::123456789012:role/dwhRole";

    /// Mock that records every statement and counts commits
    fn recording_warehouse() -> (MockWarehouse, Arc<Mutex<Vec<String>>>, Arc<Mutex<usize>>) {
        let executed = Arc::new(Mutex::new(Vec::new()));
        let commits = Arc::new(Mutex::new(0));
        let mut warehouse = MockWarehouse::new();

        let log = Arc::clone(&executed);
        warehouse.expect_execute().returning(move |sql| {
            log.lock().unwrap().push(sql.to_string());
            Ok(())
        });
        let counter = Arc::clone(&commits);
        warehouse.expect_commit().returning(move || {
            *counter.lock().unwrap() += 1;
            Ok(())
        });

        (warehouse, executed, commits)
    }

    #[tokio::test]
    async fn staging_load_runs_events_then_songs() {
        let source = CopySource::from_settings(&test_settings(), ROLE_ARN);
        let (mut warehouse, executed, commits) = recording_warehouse();

        load_staging_tables(&mut warehouse, &source).await.unwrap();

        let executed = executed.lock().unwrap();
        assert_eq!(executed.len(), 2);
        assert!(executed[0].starts_with("COPY staging_events"));
        assert!(executed[1].starts_with("COPY staging_songs"));
        assert!(executed.iter().all(|sql| sql.contains(ROLE_ARN)));
        assert_eq!(*commits.lock().unwrap(), 2);
    }

    #[tokio::test]
    async fn inserts_commit_in_dependency_order() {
        let mut warehouse = MockWarehouse::new();
        let mut seq = Sequence::new();

        for statement in [SONGPLAY_INSERT, USERS_INSERT, SONG_INSERT, ARTIST_INSERT, TIME_INSERT] {
            warehouse
                .expect_execute()
                .withf(move |sql| sql == statement)
                .times(1)
                .in_sequence(&mut seq)
                .returning(|_| Ok(()));
            warehouse
                .expect_commit()
                .times(1)
                .in_sequence(&mut seq)
                .returning(|| Ok(()));
        }

        insert_tables(&mut warehouse).await.unwrap();
    }

    #[tokio::test]
    async fn failed_copy_skips_song_load() {
        let source = CopySource::from_settings(&test_settings(), ROLE_ARN);
        let mut warehouse = MockWarehouse::new();

        warehouse
            .expect_execute()
            .times(1)
            .returning(|_| Err(anyhow::anyhow!("S3ServiceException: Access Denied")));
        warehouse.expect_commit().never();

        let err = load_staging_tables(&mut warehouse, &source)
            .await
            .unwrap_err();
        assert!(format!("{err:#}").contains("Access Denied"));
    }
}
