//! Read-through cached facade over the e-signature API.

use crate::cache::{CacheSnapshot, EsignCache};
use crate::error::{ConnectorError, ConnectorResult};
use crate::store::SnapshotStore;
use inksync_client::EsignApi;
use inksync_client::models::{EsignUser, GroupId, GroupInfo, NewUser, UserId, UserUpdate};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// Behavior switches for a connector instance.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConnectorOptions {
    /// Whether directory users missing remotely are created.
    pub create_users: bool,
    /// Whether remote users absent from the directory are deactivated.
    pub deactivate_users: bool,
    /// Suppress every mutation, logging what would have happened.
    pub dry_run: bool,
}

/// Cached connector for one e-signature org.
///
/// Reads are served from the local cache, rebuilding it when stale;
/// writes pass straight through to the API and are suppressed in
/// dry-run mode.
pub struct EsignConnector<A: EsignApi> {
    org: String,
    api: A,
    cache: EsignCache,
    store: Option<Arc<dyn SnapshotStore>>,
    options: ConnectorOptions,
    /// Serializes refreshes so concurrent readers trigger one rebuild.
    refresh_gate: Mutex<()>,
}

impl<A: EsignApi> EsignConnector<A> {
    /// Create a memory-only connector (no snapshot persistence).
    pub fn new(
        org: impl Into<String>,
        api: A,
        refresh_interval: Duration,
        options: ConnectorOptions,
    ) -> Self {
        Self {
            org: org.into(),
            api,
            cache: EsignCache::new(refresh_interval),
            store: None,
            options,
            refresh_gate: Mutex::new(()),
        }
    }

    /// Create a connector hydrated from a snapshot store.
    ///
    /// A missing snapshot starts the cache empty; an unreadable one is
    /// logged and also starts empty, since the next refresh replaces it
    /// wholesale.
    pub async fn with_store(
        org: impl Into<String>,
        api: A,
        store: Arc<dyn SnapshotStore>,
        refresh_interval: Duration,
        options: ConnectorOptions,
    ) -> Self {
        let org = org.into();
        let snapshot = match store.load().await {
            Ok(Some(snapshot)) => {
                debug!(org = %org, users = snapshot.users.len(), "hydrated cache from snapshot");
                snapshot
            }
            Ok(None) => CacheSnapshot::default(),
            Err(e) => {
                warn!(org = %org, error = %e, "failed to load cache snapshot, starting empty");
                CacheSnapshot::default()
            }
        };
        Self {
            org,
            api,
            cache: EsignCache::with_snapshot(snapshot, refresh_interval),
            store: Some(store),
            options,
            refresh_gate: Mutex::new(()),
        }
    }

    /// The org this connector serves.
    #[must_use]
    pub fn org(&self) -> &str {
        &self.org
    }

    /// Whether missing directory users are created remotely.
    #[must_use]
    pub fn create_users(&self) -> bool {
        self.options.create_users
    }

    /// Whether remote users absent from the directory are deactivated.
    #[must_use]
    pub fn deactivate_users(&self) -> bool {
        self.options.deactivate_users
    }

    /// Whether mutations are suppressed.
    #[must_use]
    pub fn dry_run(&self) -> bool {
        self.options.dry_run
    }

    /// Whether the next read-through access would rebuild the cache.
    pub async fn should_refresh(&self) -> bool {
        self.cache.should_refresh().await
    }

    /// Force a rebuild on the next read-through access.
    pub fn invalidate_cache(&self) {
        self.cache.invalidate();
    }

    // ── Reads ─────────────────────────────────────────────────────────

    /// Remote groups keyed by lowercased name.
    pub async fn groups(&self) -> ConnectorResult<HashMap<String, GroupInfo>> {
        self.refresh_if_due().await?;
        Ok(self
            .cache
            .get_groups()
            .await
            .into_iter()
            .map(|group| (group.group_name.to_lowercase(), group))
            .collect())
    }

    /// Active remote users keyed by user id.
    pub async fn users(&self) -> ConnectorResult<HashMap<UserId, EsignUser>> {
        self.refresh_if_due().await?;
        Ok(self
            .cache
            .get_users()
            .await
            .into_iter()
            .filter(EsignUser::is_active)
            .map(|user| (user.user_id.clone(), user))
            .collect())
    }

    /// Membership edges keyed by user id.
    pub async fn user_groups(&self) -> ConnectorResult<HashMap<UserId, Vec<GroupId>>> {
        self.refresh_if_due().await?;
        Ok(self.cache.get_user_groups().await)
    }

    /// Case-insensitive group lookup against the cached listing.
    pub async fn group_id(&self, name: &str) -> ConnectorResult<GroupId> {
        self.refresh_if_due().await?;
        let wanted = name.to_lowercase();
        self.cache
            .get_groups()
            .await
            .into_iter()
            .find(|group| group.group_name.to_lowercase() == wanted)
            .map(|group| group.group_id)
            .ok_or_else(|| ConnectorError::GroupNotFound {
                name: name.to_string(),
            })
    }

    // ── Refresh ───────────────────────────────────────────────────────

    async fn refresh_if_due(&self) -> ConnectorResult<()> {
        if !self.cache.should_refresh().await {
            return Ok(());
        }
        let _gate = self.refresh_gate.lock().await;
        // Another caller may have refreshed while we waited on the gate.
        if !self.cache.should_refresh().await {
            return Ok(());
        }
        self.refresh_all().await
    }

    /// Rebuild the cache from the remote service.
    ///
    /// Fetch order is users, then groups, then membership edges; the
    /// membership fetch needs the refreshed user id set. On failure the
    /// previous snapshot stays live and the cache remains marked stale.
    pub async fn refresh_all(&self) -> ConnectorResult<()> {
        info!(org = %self.org, "refreshing e-signature cache");
        let mut snapshot = CacheSnapshot::default();

        for user in self.api.get_users().await?.into_values() {
            snapshot.cache_user(user);
        }
        for group in self.api.get_groups().await? {
            snapshot.cache_group(group);
        }
        let user_ids: Vec<UserId> = snapshot.users.keys().cloned().collect();
        for (user_id, memberships) in self.api.get_user_groups(&user_ids).await? {
            for membership in memberships {
                snapshot.cache_user_group(user_id.clone(), membership.group_id);
            }
        }

        self.cache.replace(snapshot).await;
        self.cache.update_next_refresh().await;
        self.persist_snapshot().await;
        Ok(())
    }

    /// Best-effort persistence; a failed write never fails the refresh.
    async fn persist_snapshot(&self) {
        let Some(store) = &self.store else {
            return;
        };
        let snapshot = self.cache.snapshot().await;
        if let Err(e) = store.persist(&snapshot).await {
            warn!(org = %self.org, error = %e, "failed to persist cache snapshot");
        }
    }

    // ── Writes ────────────────────────────────────────────────────────

    /// Create a remote group and record it in the cache.
    pub async fn create_group(&self, name: &str) -> ConnectorResult<()> {
        if self.options.dry_run {
            info!(org = %self.org, group = name, "dry run: would create group");
            return Ok(());
        }
        let group_id = self.api.create_group(name).await?;
        self.cache
            .cache_group(GroupInfo {
                group_id,
                group_name: name.to_string(),
            })
            .await;
        Ok(())
    }

    /// Create a remote user.
    pub async fn insert_user(&self, user: &NewUser) -> ConnectorResult<()> {
        if self.options.dry_run {
            info!(org = %self.org, email = %user.email, "dry run: would create user");
            return Ok(());
        }
        self.api.insert_user(user).await?;
        Ok(())
    }

    /// Replace profile and roles for each listed user.
    pub async fn update_users(&self, updates: &[(UserId, UserUpdate)]) -> ConnectorResult<()> {
        if self.options.dry_run {
            info!(org = %self.org, count = updates.len(), "dry run: would update users");
            return Ok(());
        }
        for (user_id, update) in updates {
            self.api.update_user(user_id, update).await?;
        }
        Ok(())
    }

    /// Replace group memberships for each listed user.
    pub async fn update_user_groups(
        &self,
        updates: &[(UserId, Vec<GroupId>)],
    ) -> ConnectorResult<()> {
        if self.options.dry_run {
            info!(org = %self.org, count = updates.len(), "dry run: would update user groups");
            return Ok(());
        }
        for (user_id, groups) in updates {
            self.api.update_user_groups(user_id, groups).await?;
        }
        Ok(())
    }

    /// Deactivate a remote user.
    pub async fn deactivate_user(&self, user_id: &UserId) -> ConnectorResult<()> {
        if self.options.dry_run {
            info!(org = %self.org, user_id = %user_id, "dry run: would deactivate user");
            return Ok(());
        }
        self.api.deactivate_user(user_id).await?;
        Ok(())
    }
}
