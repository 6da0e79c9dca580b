//! Directory-side user records.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// One user as the directory source reports them.
///
/// An immutable snapshot per reconciliation pass; the engine never
/// writes back to the directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryUser {
    /// Email address, the user's identity.
    pub email: String,
    /// Given name.
    #[serde(default)]
    pub first_name: String,
    /// Family name.
    #[serde(default)]
    pub last_name: String,
    /// Directory identity type, when the source distinguishes them.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identity_type: Option<String>,
    /// Claimed domain, when the source reports one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    /// Directory-group names the user belongs to.
    #[serde(default)]
    pub groups: BTreeSet<String>,
}

impl DirectoryUser {
    /// A user with the given profile and no group memberships.
    pub fn new(
        email: impl Into<String>,
        first_name: impl Into<String>,
        last_name: impl Into<String>,
    ) -> Self {
        Self {
            email: email.into(),
            first_name: first_name.into(),
            last_name: last_name.into(),
            identity_type: None,
            domain: None,
            groups: BTreeSet::new(),
        }
    }

    /// Replace the group memberships.
    #[must_use]
    pub fn with_groups<I, S>(mut self, groups: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.groups = groups.into_iter().map(Into::into).collect();
        self
    }

    /// Identity key: the lowercased email.
    #[must_use]
    pub fn user_key(&self) -> String {
        self.email.to_lowercase()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_key_lowercases_email() {
        let user = DirectoryUser::new("Ada.Lovelace@Example.COM", "Ada", "Lovelace");
        assert_eq!(user.user_key(), "ada.lovelace@example.com");
    }

    #[test]
    fn test_with_groups_replaces_memberships() {
        let user = DirectoryUser::new("a@example.com", "Ada", "Lovelace")
            .with_groups(["Sign Group 1", "Sign Group 1", "Admins"]);
        assert_eq!(user.groups.len(), 2);
        assert!(user.groups.contains("Admins"));
    }

    #[test]
    fn test_minimal_record_parses() {
        let user: DirectoryUser =
            serde_json::from_str(r#"{"email": "a@example.com"}"#).unwrap();
        assert_eq!(user.email, "a@example.com");
        assert!(user.first_name.is_empty());
        assert!(user.groups.is_empty());
    }
}
