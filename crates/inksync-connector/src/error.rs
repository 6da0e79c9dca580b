//! Connector error types.

use inksync_client::EsignError;
use thiserror::Error;

/// Errors from snapshot persistence.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Filesystem failure reading or writing the snapshot.
    #[error("snapshot io error: {0}")]
    Io(#[from] std::io::Error),

    /// The snapshot could not be serialized or deserialized.
    #[error("snapshot serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Errors from connector operations.
#[derive(Debug, Error)]
pub enum ConnectorError {
    /// The remote API call failed.
    #[error(transparent)]
    Api(#[from] EsignError),

    /// The connector configuration is invalid.
    #[error("invalid configuration: {message}")]
    InvalidConfig {
        /// What was wrong.
        message: String,
    },

    /// No remote group matches the requested name.
    #[error("no e-signature group named '{name}'")]
    GroupNotFound {
        /// The name that was looked up.
        name: String,
    },

    /// Snapshot persistence failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl ConnectorError {
    /// Create an invalid-configuration error.
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }
}

/// Result type for connector operations.
pub type ConnectorResult<T> = Result<T, ConnectorError>;
