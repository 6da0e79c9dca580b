//! One reconciliation pass over directory and remote state.

use crate::directory::DirectoryUser;
use crate::error::EngineResult;
use crate::resolver::{GroupMapping, ResolvedAssignment, resolve, roles_match};
use inksync_client::EsignApi;
use inksync_client::models::{DEFAULT_GROUP_NAME, EsignUser, GroupId, NewUser, UserId, UserUpdate};
use inksync_connector::{ConnectorError, EsignConnector};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::slice;
use tracing::{debug, info, warn};

/// Counters for one reconciliation pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncSummary {
    /// Directory users considered.
    pub processed: u32,
    /// Users created remotely.
    pub created: u32,
    /// Users whose profile, roles, or group changed.
    pub updated: u32,
    /// Remote users deactivated for having no directory counterpart.
    pub deactivated: u32,
    /// Users already in the desired state.
    pub unchanged: u32,
    /// Users skipped by scope or disabled feature flags.
    pub skipped: u32,
    /// Users whose mutation failed; never aborts the pass.
    pub failed: u32,
}

impl SyncSummary {
    /// Whether the pass issued any mutation.
    #[must_use]
    pub fn mutated(&self) -> bool {
        self.created + self.updated + self.deactivated > 0
    }
}

/// What one user's scan step decided.
enum UserAction {
    Created,
    Queued,
    Unchanged,
    Skipped,
}

/// Mutations collected during the scan, applied afterwards.
#[derive(Default)]
struct SyncQueues {
    profile: Vec<(UserId, UserUpdate)>,
    groups: Vec<(UserId, Vec<GroupId>)>,
    users: BTreeSet<UserId>,
}

/// Drives reconciliation passes for one org scope.
pub struct SyncEngine {
    mapping: GroupMapping,
    org_scope: Option<String>,
    default_group: String,
}

impl SyncEngine {
    /// An engine for the primary org with the standard default group.
    #[must_use]
    pub fn new(mapping: GroupMapping) -> Self {
        Self {
            mapping,
            org_scope: None,
            default_group: DEFAULT_GROUP_NAME.to_string(),
        }
    }

    /// Scope this engine to a named secondary org.
    #[must_use]
    pub fn with_org_scope(mut self, org: impl Into<String>) -> Self {
        self.org_scope = Some(org.into());
        self
    }

    /// Override the group users land in when no mapping entry binds one.
    #[must_use]
    pub fn with_default_group(mut self, name: impl Into<String>) -> Self {
        self.default_group = name.into();
        self
    }

    /// Run one pass: ensure target groups exist, diff every directory
    /// user against remote state, then deactivate remote users the
    /// directory no longer knows.
    ///
    /// Per-user failures are counted in the summary; only failures to
    /// read remote state abort the pass.
    pub async fn run<A: EsignApi>(
        &self,
        connector: &EsignConnector<A>,
        directory_users: &[DirectoryUser],
    ) -> EngineResult<SyncSummary> {
        info!(
            org = connector.org(),
            users = directory_users.len(),
            dry_run = connector.dry_run(),
            "starting reconciliation pass"
        );

        let mut keyed: BTreeMap<String, &DirectoryUser> = BTreeMap::new();
        for user in directory_users {
            if user.email.is_empty() {
                warn!("directory user with no email, skipping");
                continue;
            }
            keyed.insert(user.user_key(), user);
        }

        self.ensure_groups(connector).await?;

        let remote_users = connector.users().await?;
        let remote_by_email: HashMap<String, &EsignUser> = remote_users
            .values()
            .map(|user| (user.email.to_lowercase(), user))
            .collect();

        let mut summary = SyncSummary::default();
        let mut queues = SyncQueues::default();

        for (user_key, dir_user) in &keyed {
            summary.processed += 1;
            let assignment = resolve(&dir_user.groups, &self.mapping);
            if !assignment.should_sync(self.org_scope.as_deref()) {
                debug!(user = %user_key, "assignment out of scope, skipping");
                summary.skipped += 1;
                continue;
            }
            let remote = remote_by_email.get(user_key).copied();
            match self
                .sync_user(connector, dir_user, &assignment, remote, &mut queues)
                .await
            {
                Ok(UserAction::Created) => summary.created += 1,
                Ok(UserAction::Queued) => {}
                Ok(UserAction::Unchanged) => summary.unchanged += 1,
                Ok(UserAction::Skipped) => summary.skipped += 1,
                Err(error) => {
                    warn!(user = %user_key, error = %error, "user sync failed");
                    summary.failed += 1;
                }
            }
        }

        let apply_failed = Self::apply_updates(connector, &queues).await;
        summary.updated = (queues.users.len() - apply_failed.len()) as u32;
        summary.failed += apply_failed.len() as u32;

        if connector.deactivate_users() && self.org_scope.is_none() {
            Self::deactivate_missing(connector, &keyed, &remote_users, &mut summary).await;
        }

        info!(
            org = connector.org(),
            processed = summary.processed,
            created = summary.created,
            updated = summary.updated,
            deactivated = summary.deactivated,
            unchanged = summary.unchanged,
            skipped = summary.skipped,
            failed = summary.failed,
            "reconciliation pass complete"
        );

        if summary.mutated() && !connector.dry_run() {
            connector.invalidate_cache();
        }
        Ok(summary)
    }

    /// Create any in-scope mapped group, plus the default group, that
    /// the remote listing is missing. Creation failures are logged per
    /// group; users bound to a missing group fail individually later.
    async fn ensure_groups<A: EsignApi>(
        &self,
        connector: &EsignConnector<A>,
    ) -> EngineResult<()> {
        let existing = connector.groups().await?;

        let mut wanted: BTreeSet<&str> = BTreeSet::new();
        wanted.insert(self.default_group.as_str());
        for entry in self.mapping.values() {
            for binding in &entry.groups {
                if binding.scope().matches(self.org_scope.as_deref()) {
                    wanted.insert(binding.name());
                }
            }
        }

        for name in wanted {
            if existing.contains_key(&name.to_lowercase()) {
                continue;
            }
            match connector.create_group(name).await {
                Ok(()) => {
                    if !connector.dry_run() {
                        info!(group = name, "created group");
                    }
                }
                Err(error) => warn!(group = name, error = %error, "group creation failed"),
            }
        }
        Ok(())
    }

    /// Diff one directory user against their remote record.
    async fn sync_user<A: EsignApi>(
        &self,
        connector: &EsignConnector<A>,
        dir_user: &DirectoryUser,
        assignment: &ResolvedAssignment,
        remote: Option<&EsignUser>,
        queues: &mut SyncQueues,
    ) -> Result<UserAction, ConnectorError> {
        let group_name = assignment.group_name().unwrap_or(&self.default_group);
        let group_id = match connector.group_id(group_name).await {
            Ok(id) => id,
            Err(ConnectorError::GroupNotFound { name }) if connector.dry_run() => {
                info!(
                    user = %dir_user.user_key(),
                    group = %name,
                    "dry run: target group does not exist yet, skipping user"
                );
                return Ok(UserAction::Skipped);
            }
            Err(error) => return Err(error),
        };
        let roles = assignment.sorted_roles();

        let Some(remote) = remote else {
            if !connector.create_users() {
                debug!(
                    user = %dir_user.user_key(),
                    "not present remotely and creation is disabled, skipping"
                );
                return Ok(UserAction::Skipped);
            }
            let new_user = NewUser {
                email: dir_user.email.clone(),
                first_name: dir_user.first_name.clone(),
                group_id,
                last_name: dir_user.last_name.clone(),
                roles,
            };
            connector.insert_user(&new_user).await?;
            info!(user = %dir_user.user_key(), group = %group_name, "created user");
            return Ok(UserAction::Created);
        };

        let profile_drift = remote.first_name != dir_user.first_name
            || remote.last_name != dir_user.last_name
            || !roles_match(&remote.roles, &roles);
        let group_drift = remote.group_id.as_ref() != Some(&group_id);

        if !profile_drift && !group_drift {
            return Ok(UserAction::Unchanged);
        }

        if profile_drift {
            queues.profile.push((
                remote.user_id.clone(),
                UserUpdate {
                    email: remote.email.clone(),
                    first_name: dir_user.first_name.clone(),
                    last_name: dir_user.last_name.clone(),
                    group_id: group_id.clone(),
                    roles,
                },
            ));
        }
        if group_drift {
            queues.groups.push((remote.user_id.clone(), vec![group_id]));
        }
        queues.users.insert(remote.user_id.clone());
        Ok(UserAction::Queued)
    }

    /// Apply queued mutations one user at a time, so a rejected update
    /// never blocks the rest. Returns the ids whose update failed.
    async fn apply_updates<A: EsignApi>(
        connector: &EsignConnector<A>,
        queues: &SyncQueues,
    ) -> BTreeSet<UserId> {
        let mut failed = BTreeSet::new();
        for entry in &queues.profile {
            if let Err(error) = connector.update_users(slice::from_ref(entry)).await {
                warn!(user_id = %entry.0, error = %error, "user update failed");
                failed.insert(entry.0.clone());
            }
        }
        for entry in &queues.groups {
            if let Err(error) = connector.update_user_groups(slice::from_ref(entry)).await {
                warn!(user_id = %entry.0, error = %error, "user group update failed");
                failed.insert(entry.0.clone());
            }
        }
        failed
    }

    /// Deactivate remote users whose email has no directory
    /// counterpart.
    async fn deactivate_missing<A: EsignApi>(
        connector: &EsignConnector<A>,
        keyed: &BTreeMap<String, &DirectoryUser>,
        remote_users: &HashMap<UserId, EsignUser>,
        summary: &mut SyncSummary,
    ) {
        let mut remote: Vec<&EsignUser> = remote_users.values().collect();
        remote.sort_by(|a, b| a.email.cmp(&b.email));

        for user in remote {
            if keyed.contains_key(&user.email.to_lowercase()) {
                continue;
            }
            match connector.deactivate_user(&user.user_id).await {
                Ok(()) => {
                    info!(email = %user.email, "deactivated user absent from the directory");
                    summary.deactivated += 1;
                }
                Err(error) => {
                    warn!(email = %user.email, error = %error, "deactivation failed");
                    summary.failed += 1;
                }
            }
        }
    }
}
