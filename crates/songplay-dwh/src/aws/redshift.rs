//! Redshift cluster management

use crate::aws::context::AwsContext;
use crate::aws::error::{AwsError, classify_sdk_error};
use aws_sdk_redshift::Client;
use aws_sdk_redshift::types::Cluster;
use comfy_table::{Cell, ContentArrangement, Table, presets::UTF8_FULL_CONDENSED};
use songplay_common::{ClusterSettings, ClusterTopology, Secret};
use std::fmt;
use tracing::debug;

/// Status reported once a cluster accepts connections
pub const STATUS_AVAILABLE: &str = "available";

/// Parameters of a create-cluster call
#[derive(Debug, Clone, PartialEq)]
pub struct CreateClusterRequest {
    pub identifier: String,
    pub cluster_type: ClusterTopology,
    pub node_type: String,
    /// Only ever set for multi-node clusters
    pub number_of_nodes: Option<u32>,
    pub security_group_ids: Vec<String>,
    pub db_name: String,
    pub master_username: String,
    pub master_password: Secret,
    /// Roles the cluster may assume (for S3 access)
    pub iam_roles: Vec<String>,
}

impl CreateClusterRequest {
    /// Build a request from the `[cluster]` settings and the role ARN.
    ///
    /// Single-node clusters never carry a node count, even when
    /// `num_nodes` is configured: Redshift rejects the parameter for them.
    pub fn from_settings(cluster: &ClusterSettings, role_arn: &str) -> Self {
        Self {
            identifier: cluster.identifier.clone(),
            cluster_type: cluster.cluster_type,
            node_type: cluster.node_type.clone(),
            number_of_nodes: cluster.node_count(),
            security_group_ids: vec![cluster.security_group.clone()],
            db_name: cluster.db_name.clone(),
            master_username: cluster.master_user.clone(),
            master_password: cluster.master_password.clone(),
            iam_roles: vec![role_arn.to_string()],
        }
    }
}

/// Network endpoint of a cluster
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClusterEndpoint {
    pub address: String,
    pub port: Option<i32>,
}

impl fmt::Display for ClusterEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.port {
            Some(port) => write!(f, "{}:{}", self.address, port),
            None => f.write_str(&self.address),
        }
    }
}

/// The subset of cluster properties worth reviewing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClusterProps {
    pub identifier: String,
    pub node_type: Option<String>,
    pub status: String,
    pub master_username: Option<String>,
    pub db_name: Option<String>,
    /// Absent until the cluster has finished creating
    pub endpoint: Option<ClusterEndpoint>,
    pub number_of_nodes: Option<i32>,
    pub vpc_id: Option<String>,
}

impl ClusterProps {
    /// Project an SDK cluster description down to the reviewed properties
    pub fn from_cluster(cluster: &Cluster) -> Self {
        Self {
            identifier: cluster.cluster_identifier().unwrap_or_default().to_string(),
            node_type: cluster.node_type().map(|s| s.to_string()),
            status: cluster.cluster_status().unwrap_or_default().to_string(),
            master_username: cluster.master_username().map(|s| s.to_string()),
            db_name: cluster.db_name().map(|s| s.to_string()),
            endpoint: cluster.endpoint().and_then(|e| {
                e.address().map(|address| ClusterEndpoint {
                    address: address.to_string(),
                    port: e.port(),
                })
            }),
            number_of_nodes: cluster.number_of_nodes(),
            vpc_id: cluster.vpc_id().map(|s| s.to_string()),
        }
    }

    /// Whether the cluster has reached the `available` status
    pub fn is_available(&self) -> bool {
        self.status == STATUS_AVAILABLE
    }

    /// Key/value rows, keyed by the Redshift API property names
    pub fn rows(&self) -> Vec<(&'static str, String)> {
        fn or_dash(value: Option<String>) -> String {
            value.unwrap_or_else(|| "-".to_string())
        }

        vec![
            ("ClusterIdentifier", self.identifier.clone()),
            ("NodeType", or_dash(self.node_type.clone())),
            ("ClusterStatus", self.status.clone()),
            ("MasterUsername", or_dash(self.master_username.clone())),
            ("DBName", or_dash(self.db_name.clone())),
            (
                "Endpoint",
                or_dash(self.endpoint.as_ref().map(|e| e.to_string())),
            ),
            (
                "NumberOfNodes",
                or_dash(self.number_of_nodes.map(|n| n.to_string())),
            ),
            ("VpcId", or_dash(self.vpc_id.clone())),
        ]
    }

    /// Render the properties as a two-column table
    pub fn to_table(&self) -> Table {
        let mut table = Table::new();
        table
            .load_preset(UTF8_FULL_CONDENSED)
            .set_content_arrangement(ContentArrangement::Dynamic)
            .set_header(vec![Cell::new("Key"), Cell::new("Value")]);

        for (key, value) in self.rows() {
            table.add_row(vec![Cell::new(key), Cell::new(value)]);
        }

        table
    }
}

/// Trait for the Redshift calls the cluster controller makes.
#[allow(async_fn_in_trait)]
#[cfg_attr(test, mockall::automock)]
pub trait RedshiftOperations: Send + Sync {
    /// Issue a create-cluster call (returns once the request is accepted)
    async fn create_cluster(&self, request: CreateClusterRequest) -> Result<(), AwsError>;

    /// Describe a cluster by identifier.
    ///
    /// Returns `AwsError::NotFound` once the cluster no longer exists.
    async fn describe_cluster(&self, identifier: &str) -> Result<ClusterProps, AwsError>;

    /// Issue a delete-cluster call, skipping the final snapshot
    async fn delete_cluster(&self, identifier: &str) -> Result<(), AwsError>;
}

/// Redshift client backed by the AWS SDK
pub struct RedshiftClient {
    client: Client,
}

impl RedshiftClient {
    /// Create a new Redshift client (loads AWS config from environment)
    pub async fn new(region: &str) -> Self {
        let ctx = AwsContext::new(region).await;
        Self::from_context(&ctx)
    }

    /// Create a Redshift client from a pre-loaded AWS context
    pub fn from_context(ctx: &AwsContext) -> Self {
        Self {
            client: ctx.redshift_client(),
        }
    }
}

impl RedshiftOperations for RedshiftClient {
    async fn create_cluster(&self, request: CreateClusterRequest) -> Result<(), AwsError> {
        let number_of_nodes = request
            .number_of_nodes
            .map(|n| i32::try_from(n).unwrap_or(i32::MAX));

        self.client
            .create_cluster()
            .cluster_identifier(&request.identifier)
            .cluster_type(request.cluster_type.as_str())
            .node_type(&request.node_type)
            .set_number_of_nodes(number_of_nodes)
            .set_vpc_security_group_ids(Some(request.security_group_ids.clone()))
            .db_name(&request.db_name)
            .master_username(&request.master_username)
            .master_user_password(request.master_password.expose())
            .set_iam_roles(Some(request.iam_roles.clone()))
            .send()
            .await
            .map_err(classify_sdk_error)?;

        debug!(cluster_id = %request.identifier, "Create cluster request accepted");
        Ok(())
    }

    async fn describe_cluster(&self, identifier: &str) -> Result<ClusterProps, AwsError> {
        let response = self
            .client
            .describe_clusters()
            .cluster_identifier(identifier)
            .send()
            .await
            .map_err(classify_sdk_error)?;

        response
            .clusters()
            .first()
            .map(ClusterProps::from_cluster)
            .ok_or_else(|| AwsError::NotFound {
                resource_type: "cluster",
                resource_id: identifier.to_string(),
            })
    }

    async fn delete_cluster(&self, identifier: &str) -> Result<(), AwsError> {
        self.client
            .delete_cluster()
            .cluster_identifier(identifier)
            .skip_final_cluster_snapshot(true)
            .send()
            .await
            .map_err(classify_sdk_error)?;

        debug!(cluster_id = %identifier, "Delete cluster request accepted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aws_sdk_redshift::types::Endpoint;
    use songplay_test_utils::{test_settings, test_settings_multi_node};

    const ROLE_ARN: &str = "arn:aws:iam::123456789012:role/dwhRole";

    #[test]
    fn single_node_request_has_no_node_count() {
        let mut settings = test_settings();
        // A stray num_nodes must not leak into a single-node request
        settings.cluster.num_nodes = Some(8);

        let request = CreateClusterRequest::from_settings(&settings.cluster, ROLE_ARN);
        assert_eq!(request.cluster_type, ClusterTopology::SingleNode);
        assert_eq!(request.number_of_nodes, None);
    }

    #[test]
    fn multi_node_request_carries_configured_count() {
        let settings = test_settings_multi_node(4);
        let request = CreateClusterRequest::from_settings(&settings.cluster, ROLE_ARN);
        assert_eq!(request.cluster_type, ClusterTopology::MultiNode);
        assert_eq!(request.number_of_nodes, Some(4));
    }

    #[test]
    fn request_carries_identity_and_role() {
        let settings = test_settings();
        let request = CreateClusterRequest::from_settings(&settings.cluster, ROLE_ARN);
        assert_eq!(request.identifier, "dwhcluster");
        assert_eq!(request.node_type, "dc2.large");
        assert_eq!(request.security_group_ids, vec!["sg-0123456789abcdef0"]);
        assert_eq!(request.db_name, "dwh");
        assert_eq!(request.master_username, "dwhuser");
        assert_eq!(request.master_password.expose(), "Passw0rd");
        assert_eq!(request.iam_roles, vec![ROLE_ARN]);
        assert!(!format!("{request:?}").contains("Passw0rd"));
    }

    #[test]
    fn props_projection_from_sdk_cluster() {
        let cluster = Cluster::builder()
            .cluster_identifier("dwhcluster")
            .node_type("dc2.large")
            .cluster_status("available")
            .master_username("dwhuser")
            .db_name("dwh")
            .endpoint(
                Endpoint::builder()
                    .address("dwhcluster.abc123.us-west-2.redshift.amazonaws.com")
                    .port(5439)
                    .build(),
            )
            .number_of_nodes(1)
            .vpc_id("vpc-0abc")
            .build();

        let props = ClusterProps::from_cluster(&cluster);
        assert!(props.is_available());
        assert_eq!(props.identifier, "dwhcluster");
        assert_eq!(
            props.endpoint.as_ref().map(|e| e.to_string()).as_deref(),
            Some("dwhcluster.abc123.us-west-2.redshift.amazonaws.com:5439")
        );

        let keys: Vec<_> = props.rows().into_iter().map(|(k, _)| k).collect();
        assert_eq!(
            keys,
            vec![
                "ClusterIdentifier",
                "NodeType",
                "ClusterStatus",
                "MasterUsername",
                "DBName",
                "Endpoint",
                "NumberOfNodes",
                "VpcId",
            ]
        );
    }

    #[test]
    fn creating_cluster_has_no_endpoint_yet() {
        let cluster = Cluster::builder()
            .cluster_identifier("dwhcluster")
            .cluster_status("creating")
            .build();

        let props = ClusterProps::from_cluster(&cluster);
        assert!(!props.is_available());
        assert!(props.endpoint.is_none());
        assert!(props.rows().contains(&("Endpoint", "-".to_string())));
    }

    #[test]
    fn table_lists_every_property() {
        let props = ClusterProps {
            identifier: "dwhcluster".to_string(),
            node_type: Some("dc2.large".to_string()),
            status: "available".to_string(),
            master_username: Some("dwhuser".to_string()),
            db_name: Some("dwh".to_string()),
            endpoint: None,
            number_of_nodes: Some(1),
            vpc_id: None,
        };

        let rendered = props.to_table().to_string();
        for (key, _) in props.rows() {
            assert!(rendered.contains(key), "missing {key} in table");
        }
        assert!(rendered.contains("dc2.large"));
    }
}
