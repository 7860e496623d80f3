//! Settings loading and validation errors

use thiserror::Error;

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A required string setting is empty
    #[error("{0} cannot be empty")]
    EmptyField(&'static str),

    /// multi-node topology without a node count
    #[error("cluster.num_nodes is required when cluster_type is 'multi-node'")]
    MissingNodeCount,

    /// multi-node topology with fewer than two nodes
    #[error("cluster.num_nodes must be at least 2 for a multi-node cluster, got {0}")]
    InvalidNodeCount(u32),

    /// Zero poll interval
    #[error("cluster.poll_interval_secs must be greater than 0")]
    InvalidPollInterval,

    /// Zero poll timeout
    #[error("cluster.poll_timeout_secs must be greater than 0 when set")]
    InvalidPollTimeout,

    /// Port zero
    #[error("cluster.port must be greater than 0")]
    InvalidPort,

    /// Only one half of a static credential pair was given
    #[error("aws.key and aws.secret must be set together")]
    PartialCredentials,

    /// Failed to parse TOML
    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    /// Failed to read the settings file
    #[error("Failed to read config file '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl ConfigError {
    /// Create an IO error with path context
    pub fn io(path: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(
            ConfigError::EmptyField("cluster.identifier").to_string(),
            "cluster.identifier cannot be empty"
        );
        assert_eq!(
            ConfigError::InvalidNodeCount(1).to_string(),
            "cluster.num_nodes must be at least 2 for a multi-node cluster, got 1"
        );
    }

    #[test]
    fn test_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err = ConfigError::io("/path/to/dwh.toml", io_err);
        assert!(err.to_string().contains("/path/to/dwh.toml"));
    }
}
