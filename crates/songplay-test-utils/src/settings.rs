//! Settings fixtures

use songplay_common::{
    AwsSettings, ClusterSettings, ClusterTopology, IamSettings, S3Settings, Secret, Settings,
};

/// Create a valid single-node `Settings` for testing
pub fn test_settings() -> Settings {
    Settings {
        aws: AwsSettings {
            region: "us-west-2".to_string(),
            key: None,
            secret: None,
        },
        iam: IamSettings {
            role_name: "dwhRole".to_string(),
            role_arn: Some("arn:aws:iam::123456789012:role/dwhRole".to_string()),
            policy_arn: "arn:aws:iam::aws:policy/AmazonS3ReadOnlyAccess".to_string(),
        },
        cluster: ClusterSettings {
            cluster_type: ClusterTopology::SingleNode,
            node_type: "dc2.large".to_string(),
            num_nodes: None,
            security_group: "sg-0123456789abcdef0".to_string(),
            identifier: "dwhcluster".to_string(),
            db_name: "dwh".to_string(),
            master_user: "dwhuser".to_string(),
            master_password: Secret::new("Passw0rd"),
            db_user: None,
            db_password: None,
            host: None,
            port: 5439,
            poll_interval_secs: 20,
            poll_timeout_secs: None,
        },
        s3: S3Settings {
            log_data: "s3://udacity-dend/log_data".to_string(),
            log_jsonpath: "s3://udacity-dend/log_json_path.json".to_string(),
            song_data: "s3://udacity-dend/song_data".to_string(),
            region: "us-west-2".to_string(),
        },
    }
}

/// Create a valid multi-node `Settings` with the given node count
pub fn test_settings_multi_node(num_nodes: u32) -> Settings {
    let mut settings = test_settings();
    settings.cluster.cluster_type = ClusterTopology::MultiNode;
    settings.cluster.num_nodes = Some(num_nodes);
    settings
}
