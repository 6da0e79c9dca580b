//! Engine error types.

use inksync_connector::ConnectorError;
use thiserror::Error;

/// Failures that abort a reconciliation pass.
///
/// Per-user mutation failures are counted and logged inside the pass
/// and never surface here.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Remote state could not be read through the connector.
    #[error(transparent)]
    Connector(#[from] ConnectorError),
}

/// Result alias for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connector_errors_pass_through_display() {
        let error = EngineError::from(ConnectorError::GroupNotFound {
            name: "Design".to_string(),
        });
        assert_eq!(error.to_string(), "no e-signature group named 'Design'");
    }
}
