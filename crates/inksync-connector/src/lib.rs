//! Cached connector for the e-signature service.
//!
//! Bridges the HTTP client and the sync engine: typed configuration, a
//! local snapshot cache with time-boxed invalidation and pluggable
//! persistence, and the read-through [`EsignConnector`] facade the
//! engine drives.

pub mod cache;
pub mod config;
pub mod connector;
pub mod error;
pub mod store;

pub use cache::{CacheSnapshot, EsignCache};
pub use config::{CacheSettings, ConnectorConfig, Tuning};
pub use connector::{ConnectorOptions, EsignConnector};
pub use error::{ConnectorError, ConnectorResult, StoreError};
pub use store::{FsSnapshotStore, SnapshotStore};

use inksync_client::EsignClient;
use std::sync::Arc;

/// Build a production connector for `org`.
///
/// Validates the configuration, constructs the HTTP client, and hydrates
/// the cache from the snapshot store before any network traffic.
pub async fn connect(
    org: &str,
    config: &ConnectorConfig,
    dry_run: bool,
) -> ConnectorResult<EsignConnector<EsignClient>> {
    config.validate()?;
    let client = EsignClient::new(config.client_config())?;
    let store = FsSnapshotStore::new(&config.cache.path, org);
    let options = ConnectorOptions {
        create_users: config.create_users,
        deactivate_users: config.deactivate_users,
        dry_run,
    };
    Ok(EsignConnector::with_store(
        org,
        client,
        Arc::new(store),
        config.refresh_interval(),
        options,
    )
    .await)
}
