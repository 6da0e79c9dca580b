//! Local snapshot cache of remote org state.
//!
//! A [`CacheSnapshot`] is a point-in-time copy of the org's users,
//! groups, and membership edges. [`EsignCache`] keeps the live snapshot
//! behind a lock, tracks when it goes stale, and swaps in replacements
//! wholesale so readers never observe a half-refreshed mix.

use chrono::{DateTime, Utc};
use inksync_client::models::{EsignUser, GroupId, GroupInfo, UserId};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::RwLock;

/// Point-in-time copy of remote state.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CacheSnapshot {
    /// Remote users keyed by id.
    #[serde(default)]
    pub users: HashMap<UserId, EsignUser>,
    /// Remote groups keyed by id.
    #[serde(default)]
    pub groups: HashMap<GroupId, GroupInfo>,
    /// Membership edges keyed by user id.
    #[serde(default)]
    pub user_groups: HashMap<UserId, Vec<GroupId>>,
    /// When the snapshot goes stale. `None` means never refreshed.
    #[serde(default)]
    pub next_refresh_at: Option<DateTime<Utc>>,
}

impl CacheSnapshot {
    /// Upsert a user record, keyed by user id.
    pub fn cache_user(&mut self, user: EsignUser) {
        self.users.insert(user.user_id.clone(), user);
    }

    /// Upsert a group record, keyed by group id.
    pub fn cache_group(&mut self, group: GroupInfo) {
        self.groups.insert(group.group_id.clone(), group);
    }

    /// Record one membership edge, idempotent on (user, group).
    pub fn cache_user_group(&mut self, user_id: UserId, group_id: GroupId) {
        let memberships = self.user_groups.entry(user_id).or_default();
        if !memberships.contains(&group_id) {
            memberships.push(group_id);
        }
    }
}

/// In-memory cache with time-boxed invalidation.
///
/// Reads never touch the network; the connector consults
/// [`should_refresh`](Self::should_refresh) to decide when to rebuild
/// the snapshot.
#[derive(Debug)]
pub struct EsignCache {
    snapshot: RwLock<CacheSnapshot>,
    /// Set by [`invalidate`](Self::invalidate), cleared by a successful
    /// refresh.
    invalidated: AtomicBool,
    refresh_interval: Duration,
}

impl EsignCache {
    /// Create an empty cache with the given refresh interval.
    #[must_use]
    pub fn new(refresh_interval: Duration) -> Self {
        Self::with_snapshot(CacheSnapshot::default(), refresh_interval)
    }

    /// Create a cache seeded from a persisted snapshot.
    #[must_use]
    pub fn with_snapshot(snapshot: CacheSnapshot, refresh_interval: Duration) -> Self {
        Self {
            snapshot: RwLock::new(snapshot),
            invalidated: AtomicBool::new(false),
            refresh_interval,
        }
    }

    /// Current user records.
    pub async fn get_users(&self) -> Vec<EsignUser> {
        self.snapshot.read().await.users.values().cloned().collect()
    }

    /// Current group records.
    pub async fn get_groups(&self) -> Vec<GroupInfo> {
        self.snapshot.read().await.groups.values().cloned().collect()
    }

    /// Current membership edges.
    pub async fn get_user_groups(&self) -> HashMap<UserId, Vec<GroupId>> {
        self.snapshot.read().await.user_groups.clone()
    }

    /// Upsert one user into the live snapshot.
    pub async fn cache_user(&self, user: EsignUser) {
        self.snapshot.write().await.cache_user(user);
    }

    /// Upsert one group into the live snapshot.
    pub async fn cache_group(&self, group: GroupInfo) {
        self.snapshot.write().await.cache_group(group);
    }

    /// Record one membership edge in the live snapshot.
    pub async fn cache_user_group(&self, user_id: UserId, group_id: GroupId) {
        self.snapshot.write().await.cache_user_group(user_id, group_id);
    }

    /// Whether the snapshot is absent, past its deadline, or explicitly
    /// invalidated.
    pub async fn should_refresh(&self) -> bool {
        if self.invalidated.load(Ordering::Acquire) {
            return true;
        }
        match self.snapshot.read().await.next_refresh_at {
            Some(deadline) => Utc::now() >= deadline,
            None => true,
        }
    }

    /// Force a refresh on the next read-through access.
    pub fn invalidate(&self) {
        self.invalidated.store(true, Ordering::Release);
    }

    /// Advance the refresh deadline and clear explicit invalidation.
    ///
    /// Called only after a refresh completed successfully.
    pub async fn update_next_refresh(&self) {
        let deadline = Utc::now() + self.refresh_interval;
        self.snapshot.write().await.next_refresh_at = Some(deadline);
        self.invalidated.store(false, Ordering::Release);
    }

    /// Swap in a freshly built snapshot.
    pub async fn replace(&self, snapshot: CacheSnapshot) {
        *self.snapshot.write().await = snapshot;
    }

    /// Copy of the current snapshot, for persistence.
    pub async fn snapshot(&self) -> CacheSnapshot {
        self.snapshot.read().await.clone()
    }
}
