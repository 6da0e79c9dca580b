//! Wire models for the e-signature REST API.
//!
//! Payload field names follow the service's camelCase JSON; identifiers
//! are opaque strings wrapped in transparent newtypes so user, group, and
//! role values cannot be mixed up in signatures.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Name of the group the service files users under when no mapping
/// applies.
pub const DEFAULT_GROUP_NAME: &str = "default group";

/// Status value the service reports for active users.
pub const ACTIVE_STATUS: &str = "ACTIVE";

/// Opaque identifier of a remote user.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    /// Wrap a raw identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for UserId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for UserId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// Opaque identifier of a remote group.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GroupId(String);

impl GroupId {
    /// Wrap a raw identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for GroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for GroupId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for GroupId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// A role token granted to a user within the service.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Role(String);

impl Role {
    /// Wrap a raw role token.
    pub fn new(role: impl Into<String>) -> Self {
        Self(role.into())
    }

    /// The baseline role every user holds when no mapping grants more.
    #[must_use]
    pub fn normal_user() -> Self {
        Self("NORMAL_USER".to_string())
    }

    /// The role token as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Role {
    fn from(role: &str) -> Self {
        Self(role.to_string())
    }
}

// ── Listings ──

/// `GET users` response: the stubs to expand via per-id detail fetches.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserListing {
    /// One stub per known user.
    #[serde(default)]
    pub user_info_list: Vec<UserStub>,
}

/// A single entry of the user listing.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserStub {
    /// Identifier to expand with `GET users/{id}`.
    pub user_id: UserId,
}

/// `GET groups` response.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupListing {
    /// Every group in the org.
    #[serde(default)]
    pub group_info_list: Vec<GroupInfo>,
}

/// One remote group record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupInfo {
    /// Group identifier.
    pub group_id: GroupId,
    /// Group display name, original casing.
    pub group_name: String,
}

// ── Users ──

/// Raw `GET users/{id}` payload. The client folds it together with the
/// id from the listing into an [`EsignUser`].
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct UserDetailPayload {
    pub email: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    pub user_status: String,
    #[serde(default)]
    pub group_id: Option<GroupId>,
    #[serde(default)]
    pub roles: Option<Vec<Role>>,
}

/// A fully expanded remote user record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EsignUser {
    /// Remote identifier.
    pub user_id: UserId,
    /// Email address as the service reports it.
    pub email: String,
    /// Given name.
    #[serde(default)]
    pub first_name: String,
    /// Family name.
    #[serde(default)]
    pub last_name: String,
    /// Service status string, `ACTIVE` for live accounts.
    pub user_status: String,
    /// Group the user currently belongs to, when reported.
    #[serde(default)]
    pub group_id: Option<GroupId>,
    /// Granted roles; the client defaults this to `NORMAL_USER` when the
    /// service omits it.
    #[serde(default)]
    pub roles: Vec<Role>,
}

impl EsignUser {
    /// Whether the service considers this account active.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.user_status == ACTIVE_STATUS
    }
}

/// `POST users` body for creating a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUser {
    /// Email address, the user's identity.
    pub email: String,
    /// Given name.
    pub first_name: String,
    /// Group to file the user under.
    pub group_id: GroupId,
    /// Family name.
    pub last_name: String,
    /// Roles to grant, sorted.
    pub roles: Vec<Role>,
}

/// `POST users` response.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedUser {
    /// Identifier assigned to the new user.
    pub user_id: UserId,
}

/// `PUT users/{id}` body: a full replacement of the mutable profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserUpdate {
    /// Email address (unchanged, but the endpoint requires it).
    pub email: String,
    /// Given name.
    pub first_name: String,
    /// Family name.
    pub last_name: String,
    /// Target group.
    pub group_id: GroupId,
    /// Replacement role set, sorted.
    pub roles: Vec<Role>,
}

/// `PUT users/{id}/state` body.
#[derive(Debug, Clone, Serialize)]
pub struct StateChange {
    /// Requested account state.
    pub state: String,
}

impl StateChange {
    /// The deactivation request body.
    #[must_use]
    pub fn inactive() -> Self {
        Self {
            state: "INACTIVE".to_string(),
        }
    }
}

// ── Group membership ──

/// `GET`/`PUT users/{id}/groups` payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserGroups {
    /// Memberships for one user.
    #[serde(default)]
    pub group_info_list: Vec<GroupMembership>,
}

/// One membership edge. The name is present in responses and omitted
/// from update requests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupMembership {
    /// Group identifier.
    pub group_id: GroupId,
    /// Group display name, when the service sent one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_name: Option<String>,
}

/// `POST groups` body.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateGroupRequest {
    /// Display name of the group to create.
    pub group_name: String,
}

/// `POST groups` response.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateGroupResponse {
    /// Identifier assigned to the new group.
    pub group_id: GroupId,
}
