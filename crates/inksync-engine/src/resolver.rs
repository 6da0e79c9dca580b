//! Priority-based reduction of directory group memberships.
//!
//! A user can belong to many mapped directory groups; the remote
//! service files them under at most one group. [`resolve`] merges the
//! role grants of every matched mapping entry and picks the target
//! group from the highest-precedence entry that binds one.

use inksync_client::models::Role;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::hash::{Hash, Hasher};

/// Mapping table from directory-group name to its entry. Built once
/// from configuration and immutable for the process lifetime.
pub type GroupMapping = HashMap<String, GroupMappingEntry>;

/// Which org a target group belongs to.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrgScope {
    /// The caller's own org.
    #[default]
    Primary,
    /// A named secondary org.
    Secondary(String),
}

impl OrgScope {
    /// Whether this scope addresses the org identified by `org_scope`
    /// (`None` means the primary org).
    #[must_use]
    pub fn matches(&self, org_scope: Option<&str>) -> bool {
        match (self, org_scope) {
            (Self::Primary, None) => true,
            (Self::Secondary(org), Some(scope)) => org == scope,
            _ => false,
        }
    }
}

/// A remote group a mapping entry binds users to.
///
/// Compares case-insensitively on the group name and exactly on the
/// scope, mirroring how the remote service treats group names.
#[derive(Debug, Clone, Eq, Serialize, Deserialize)]
pub struct GroupBinding {
    name: String,
    #[serde(default)]
    scope: OrgScope,
}

impl GroupBinding {
    /// Bind a group in the primary org.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            scope: OrgScope::Primary,
        }
    }

    /// Bind a group in a named secondary org.
    pub fn secondary(name: impl Into<String>, org: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            scope: OrgScope::Secondary(org.into()),
        }
    }

    /// The group name, original casing.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The org scope of the binding.
    #[must_use]
    pub fn scope(&self) -> &OrgScope {
        &self.scope
    }
}

impl PartialEq for GroupBinding {
    fn eq(&self, other: &Self) -> bool {
        self.name.to_lowercase() == other.name.to_lowercase() && self.scope == other.scope
    }
}

impl Hash for GroupBinding {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.to_lowercase().hash(state);
        self.scope.hash(state);
    }
}

/// One mapping entry: precedence, role grants, and group bindings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GroupMappingEntry {
    /// Precedence for group selection; lower wins.
    #[serde(default)]
    pub priority: i32,
    /// Roles granted by membership in this directory group.
    #[serde(default)]
    pub roles: BTreeSet<Role>,
    /// Candidate target groups, first element canonical.
    #[serde(default)]
    pub groups: Vec<GroupBinding>,
}

/// The resolver's verdict for one user.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedAssignment {
    /// Target group, or `None` when no matched entry binds one.
    pub group: Option<GroupBinding>,
    /// Merged role set; never empty.
    pub roles: BTreeSet<Role>,
}

impl ResolvedAssignment {
    /// Whether this assignment belongs to the org identified by
    /// `org_scope`. An unbound assignment counts as primary-scoped: it
    /// lands in the primary org's default group.
    #[must_use]
    pub fn should_sync(&self, org_scope: Option<&str>) -> bool {
        match &self.group {
            Some(binding) => binding.scope().matches(org_scope),
            None => org_scope.is_none(),
        }
    }

    /// The merged roles as a sorted list, the shape mutation bodies
    /// want.
    #[must_use]
    pub fn sorted_roles(&self) -> Vec<Role> {
        self.roles.iter().cloned().collect()
    }

    /// The bound group's name, if any.
    #[must_use]
    pub fn group_name(&self) -> Option<&str> {
        self.group.as_ref().map(GroupBinding::name)
    }
}

/// Reduce a user's directory group memberships to one assignment.
///
/// Role merge and group selection are independent passes: the role set
/// is the union over every matched entry, while the target group comes
/// from `groups[0]` of the group-bearing entry with the minimum
/// `(priority, directory-group-name)` key. No match at all yields no
/// group and the baseline role.
#[must_use]
pub fn resolve(member_groups: &BTreeSet<String>, mapping: &GroupMapping) -> ResolvedAssignment {
    let matched: Vec<(&str, &GroupMappingEntry)> = member_groups
        .iter()
        .filter_map(|name| mapping.get(name).map(|entry| (name.as_str(), entry)))
        .collect();

    let mut roles: BTreeSet<Role> = matched
        .iter()
        .flat_map(|(_, entry)| entry.roles.iter().cloned())
        .collect();
    if roles.is_empty() {
        roles.insert(Role::normal_user());
    }

    let group = matched
        .iter()
        .filter(|(_, entry)| !entry.groups.is_empty())
        .min_by_key(|(name, entry)| (entry.priority, *name))
        .and_then(|(_, entry)| entry.groups.first().cloned());

    ResolvedAssignment { group, roles }
}

/// Set equality over two role collections, ignoring order. False for
/// any asymmetric difference, including one side empty.
#[must_use]
pub fn roles_match(a: &[Role], b: &[Role]) -> bool {
    let a: BTreeSet<&Role> = a.iter().collect();
    let b: BTreeSet<&Role> = b.iter().collect();
    a == b
}
