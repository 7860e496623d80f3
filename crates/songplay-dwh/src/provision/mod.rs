//! Provisioning of the IAM role and Redshift cluster
//!
//! - `role`: create/reuse the role the cluster assumes, and delete it
//! - `cluster`: create the cluster and wait for it, delete it and wait

pub mod cluster;
pub mod role;

pub use cluster::{
    create_cluster, delete_cluster, describe_cluster_props, resolve_host, wait_config,
};
pub use role::{RoleHandle, delete_role, ensure_role, resolve_role_arn};

use anyhow::Result;
use songplay_common::Settings;
use tracing::info;

use crate::aws::{ClusterProps, IamOperations, RedshiftOperations};

/// Ensure the role exists, then create the cluster and wait until it is available.
pub async fn provision<I, R>(
    iam: &I,
    redshift: &R,
    settings: &Settings,
) -> Result<(RoleHandle, ClusterProps)>
where
    I: IamOperations,
    R: RedshiftOperations,
{
    let role = ensure_role(iam, settings).await?;
    let props = create_cluster(redshift, settings, &role.arn, wait_config(settings)).await?;
    info!(
        role_arn = %role.arn,
        cluster_id = %props.identifier,
        "Provisioning complete"
    );
    Ok((role, props))
}

/// Delete the role, then delete the cluster and wait until it is gone.
///
/// Stops at the first failure; nothing already deleted is restored.
pub async fn teardown<I, R>(iam: &I, redshift: &R, settings: &Settings) -> Result<()>
where
    I: IamOperations,
    R: RedshiftOperations,
{
    delete_role(iam, settings).await?;
    delete_cluster(redshift, settings, wait_config(settings)).await?;
    info!(cluster_id = %settings.cluster.identifier, "Teardown complete");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aws::AwsError;
    use crate::aws::iam::MockIamOperations;
    use crate::aws::redshift::MockRedshiftOperations;
    use songplay_test_utils::test_settings;

    const ROLE_ARN: &str = "arn:aws:iam::123456789012:role/dwhRole";

    fn available() -> ClusterProps {
        ClusterProps {
            identifier: "dwhcluster".to_string(),
            node_type: Some("dc2.large".to_string()),
            status: "available".to_string(),
            master_username: Some("dwhuser".to_string()),
            db_name: Some("dwh".to_string()),
            endpoint: None,
            number_of_nodes: Some(1),
            vpc_id: None,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn provision_passes_role_arn_to_cluster() {
        let settings = test_settings();
        let mut iam = MockIamOperations::new();
        let mut redshift = MockRedshiftOperations::new();

        iam.expect_create_role().returning(|_, _, _| Ok(()));
        iam.expect_attach_role_policy().returning(|_, _| Ok(()));
        iam.expect_get_role_arn()
            .returning(|_| Ok(ROLE_ARN.to_string()));
        redshift
            .expect_create_cluster()
            .withf(|request| request.iam_roles == [ROLE_ARN])
            .times(1)
            .returning(|_| Ok(()));
        redshift
            .expect_describe_cluster()
            .returning(|_| Ok(available()));

        let (role, props) = provision(&iam, &redshift, &settings).await.unwrap();
        assert!(role.created);
        assert!(props.is_available());
    }

    #[tokio::test(start_paused = true)]
    async fn role_failure_stops_before_cluster_creation() {
        let settings = test_settings();
        let mut iam = MockIamOperations::new();
        let mut redshift = MockRedshiftOperations::new();

        iam.expect_create_role()
            .returning(|_, _, _| Err(AwsError::Throttled));
        redshift.expect_create_cluster().never();

        assert!(provision(&iam, &redshift, &settings).await.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn teardown_deletes_role_then_cluster() {
        let settings = test_settings();
        let mut iam = MockIamOperations::new();
        let mut redshift = MockRedshiftOperations::new();

        iam.expect_list_attached_role_policies()
            .returning(|_| Ok(Vec::new()));
        iam.expect_delete_role().times(1).returning(|_| Ok(()));
        redshift
            .expect_delete_cluster()
            .times(1)
            .returning(|_| Ok(()));
        redshift.expect_describe_cluster().returning(|_| {
            Err(AwsError::NotFound {
                resource_type: "cluster",
                resource_id: "dwhcluster".to_string(),
            })
        });

        teardown(&iam, &redshift, &settings).await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn teardown_keeps_cluster_when_role_delete_fails() {
        let settings = test_settings();
        let mut iam = MockIamOperations::new();
        let mut redshift = MockRedshiftOperations::new();

        iam.expect_list_attached_role_policies()
            .returning(|_| Ok(Vec::new()));
        iam.expect_delete_role().returning(|_| {
            Err(AwsError::DeleteConflict {
                message: "must detach all policies first".to_string(),
            })
        });
        redshift.expect_delete_cluster().never();

        assert!(teardown(&iam, &redshift, &settings).await.is_err());
    }
}
