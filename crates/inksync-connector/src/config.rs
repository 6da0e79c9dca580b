//! Typed connector configuration.
//!
//! Supplied by the host application's configuration loader and validated
//! once, before any network I/O.

use crate::error::{ConnectorError, ConnectorResult};
use inksync_client::ClientConfig;
use inksync_client::auth::{ApiVersion, IntegrationKey};
use inksync_client::retry::RetryPolicy;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Configuration for one e-signature org connector.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectorConfig {
    /// Service host. A bare hostname is reached over https.
    pub host: String,
    /// Admin account email, excluded from bulk user fetches.
    pub admin_email: String,
    /// Integration credential.
    pub integration_key: IntegrationKey,
    /// API version, selecting the auth header shape.
    #[serde(default)]
    pub api_version: ApiVersion,
    /// Whether directory users missing remotely are created.
    #[serde(default)]
    pub create_users: bool,
    /// Whether remote users absent from the directory are deactivated.
    #[serde(default)]
    pub deactivate_users: bool,
    /// Cache storage and staleness settings.
    pub cache: CacheSettings,
    /// Connection tuning knobs.
    #[serde(default)]
    pub tuning: Tuning,
}

/// Cache storage and staleness settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheSettings {
    /// Directory holding one snapshot file per org.
    pub path: PathBuf,
    /// Hours between full refreshes.
    #[serde(default = "default_refresh_interval_hours")]
    pub refresh_interval_hours: u64,
}

/// Connection tuning knobs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tuning {
    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Retries after the initial attempt for transient failures.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// Concurrent per-user detail fetches.
    #[serde(default = "default_concurrency_limit")]
    pub concurrency_limit: usize,
    /// Pause after each detail fetch, in milliseconds. 0 disables
    /// pacing.
    #[serde(default)]
    pub throttle_delay_ms: u64,
}

fn default_refresh_interval_hours() -> u64 {
    24
}

fn default_timeout_secs() -> u64 {
    120
}

fn default_max_retries() -> u32 {
    3
}

fn default_concurrency_limit() -> usize {
    5
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            max_retries: default_max_retries(),
            concurrency_limit: default_concurrency_limit(),
            throttle_delay_ms: 0,
        }
    }
}

impl ConnectorConfig {
    /// Validate required fields.
    pub fn validate(&self) -> ConnectorResult<()> {
        if self.host.trim().is_empty() {
            return Err(ConnectorError::invalid_config("host must not be empty"));
        }
        if !self.admin_email.contains('@') {
            return Err(ConnectorError::invalid_config(
                "admin_email must be an email address",
            ));
        }
        if self.integration_key.is_empty() {
            return Err(ConnectorError::invalid_config(
                "integration_key must not be empty",
            ));
        }
        if self.cache.path.as_os_str().is_empty() {
            return Err(ConnectorError::invalid_config(
                "cache.path must not be empty",
            ));
        }
        Ok(())
    }

    /// Interval between full cache refreshes.
    #[must_use]
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.cache.refresh_interval_hours.saturating_mul(3600))
    }

    /// Lower this configuration into the client's.
    #[must_use]
    pub fn client_config(&self) -> ClientConfig {
        let mut config = ClientConfig::new(
            self.host.clone(),
            self.integration_key.clone(),
            self.admin_email.clone(),
        );
        config.api_version = self.api_version;
        config.timeout = Duration::from_secs(self.tuning.timeout_secs);
        config.retry = RetryPolicy {
            max_retries: self.tuning.max_retries,
            ..RetryPolicy::default()
        };
        config.concurrency_limit = self.tuning.concurrency_limit;
        config.throttle_delay = match self.tuning.throttle_delay_ms {
            0 => None,
            ms => Some(Duration::from_millis(ms)),
        };
        config
    }
}
