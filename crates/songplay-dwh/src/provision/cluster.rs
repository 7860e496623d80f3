//! Redshift cluster lifecycle: create and wait for `available`, delete and
//! wait for the cluster to disappear.

use anyhow::{Context, Result};
use songplay_common::Settings;
use std::cell::RefCell;
use tracing::{debug, info, warn};

use crate::aws::AwsError;
use crate::aws::redshift::{ClusterProps, CreateClusterRequest, RedshiftOperations};
use crate::wait::{WaitConfig, wait_for_resource};

/// Build the poll configuration from the `[cluster]` settings
pub fn wait_config(settings: &Settings) -> WaitConfig {
    WaitConfig::new(
        settings.cluster.poll_interval(),
        settings.cluster.poll_timeout(),
    )
}

/// Create the cluster and poll until it reports `available`.
///
/// A cluster that already exists under the same identifier is polled like a
/// fresh one. Any other create failure propagates without polling.
pub async fn create_cluster<R: RedshiftOperations>(
    redshift: &R,
    settings: &Settings,
    role_arn: &str,
    wait: WaitConfig,
) -> Result<ClusterProps> {
    let request = CreateClusterRequest::from_settings(&settings.cluster, role_arn);
    let identifier = request.identifier.clone();

    info!(
        cluster_id = %identifier,
        cluster_type = %request.cluster_type,
        node_type = %request.node_type,
        num_nodes = ?request.number_of_nodes,
        "Creating Redshift cluster"
    );

    match redshift.create_cluster(request).await {
        Ok(()) => {}
        Err(AwsError::AlreadyExists { message }) => {
            warn!(cluster_id = %identifier, %message, "Cluster already exists, waiting for it");
        }
        Err(e) => {
            return Err(anyhow::Error::new(e)
                .context(format!("Failed to create Redshift cluster {identifier}")));
        }
    }

    let latest: RefCell<Option<ClusterProps>> = RefCell::new(None);
    wait_for_resource(
        wait,
        || async {
            let props = redshift
                .describe_cluster(&identifier)
                .await
                .with_context(|| format!("Failed to describe cluster {identifier}"))?;
            info!(cluster_id = %identifier, status = %props.status, "Cluster status");
            let available = props.is_available();
            *latest.borrow_mut() = Some(props);
            Ok(available)
        },
        &identifier,
    )
    .await?;

    let props = latest
        .into_inner()
        .with_context(|| format!("Cluster {identifier} was never described"))?;
    info!(cluster_id = %identifier, endpoint = ?props.endpoint, "Cluster available");
    Ok(props)
}

/// Delete the cluster (no final snapshot) and poll until it is gone.
pub async fn delete_cluster<R: RedshiftOperations>(
    redshift: &R,
    settings: &Settings,
    wait: WaitConfig,
) -> Result<()> {
    let identifier = settings.cluster.identifier.as_str();

    info!(cluster_id = %identifier, "Deleting Redshift cluster");
    redshift
        .delete_cluster(identifier)
        .await
        .with_context(|| format!("Failed to delete Redshift cluster {identifier}"))?;

    wait_for_resource(
        wait,
        || async {
            match redshift.describe_cluster(identifier).await {
                Ok(props) => {
                    info!(cluster_id = %identifier, status = %props.status, "Cluster status");
                    Ok(false)
                }
                Err(e) if e.is_not_found() => {
                    debug!(cluster_id = %identifier, "Cluster no longer described");
                    Ok(true)
                }
                Err(e) => Err(anyhow::Error::new(e)
                    .context(format!("Failed to describe cluster {identifier}"))),
            }
        },
        identifier,
    )
    .await?;

    info!(cluster_id = %identifier, "Cluster deleted");
    Ok(())
}

/// Describe the configured cluster once
pub async fn describe_cluster_props<R: RedshiftOperations>(
    redshift: &R,
    settings: &Settings,
) -> Result<ClusterProps> {
    let identifier = settings.cluster.identifier.as_str();
    redshift
        .describe_cluster(identifier)
        .await
        .with_context(|| format!("Failed to describe cluster {identifier}"))
}

/// The database host to connect to.
///
/// Uses `cluster.host` when configured, otherwise the endpoint address of the
/// (available) cluster.
pub async fn resolve_host<R: RedshiftOperations>(redshift: &R, settings: &Settings) -> Result<String> {
    if let Some(host) = &settings.cluster.host {
        return Ok(host.clone());
    }

    let props = describe_cluster_props(redshift, settings).await?;
    match props.endpoint {
        Some(endpoint) => {
            debug!(cluster_id = %props.identifier, host = %endpoint.address, "Using cluster endpoint");
            Ok(endpoint.address)
        }
        None => anyhow::bail!(
            "Cluster {} has no endpoint yet (status: {}); wait for it to become available or set cluster.host",
            props.identifier,
            props.status
        ),
    }
}
