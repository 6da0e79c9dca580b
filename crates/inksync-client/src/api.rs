//! Capability trait over the e-signature service operations.

use crate::client::EsignClient;
use crate::error::EsignResult;
use crate::models::{EsignUser, GroupId, GroupInfo, GroupMembership, NewUser, UserId, UserUpdate};
use async_trait::async_trait;
use std::collections::HashMap;

/// The operations the sync pipeline needs from the e-signature service.
///
/// [`EsignClient`] is the production implementation; tests substitute
/// in-memory doubles so connector and engine behavior can be exercised
/// without a live target.
#[async_trait]
pub trait EsignApi: Send + Sync {
    /// Every active non-admin user, fully expanded, keyed by lowercased
    /// email.
    async fn get_users(&self) -> EsignResult<HashMap<String, EsignUser>>;

    /// Every group in the org.
    async fn get_groups(&self) -> EsignResult<Vec<GroupInfo>>;

    /// Group memberships for the given users.
    async fn get_user_groups(
        &self,
        user_ids: &[UserId],
    ) -> EsignResult<HashMap<UserId, Vec<GroupMembership>>>;

    /// Create a group, returning its id.
    async fn create_group(&self, name: &str) -> EsignResult<GroupId>;

    /// Create a user, returning the assigned id.
    async fn insert_user(&self, user: &NewUser) -> EsignResult<UserId>;

    /// Replace a user's profile and roles.
    async fn update_user(&self, user_id: &UserId, update: &UserUpdate) -> EsignResult<()>;

    /// Replace a user's group memberships.
    async fn update_user_groups(&self, user_id: &UserId, groups: &[GroupId]) -> EsignResult<()>;

    /// Deactivate a user.
    async fn deactivate_user(&self, user_id: &UserId) -> EsignResult<()>;
}

#[async_trait]
impl EsignApi for EsignClient {
    async fn get_users(&self) -> EsignResult<HashMap<String, EsignUser>> {
        EsignClient::get_users(self).await
    }

    async fn get_groups(&self) -> EsignResult<Vec<GroupInfo>> {
        EsignClient::get_groups(self).await
    }

    async fn get_user_groups(
        &self,
        user_ids: &[UserId],
    ) -> EsignResult<HashMap<UserId, Vec<GroupMembership>>> {
        EsignClient::get_user_groups(self, user_ids).await
    }

    async fn create_group(&self, name: &str) -> EsignResult<GroupId> {
        EsignClient::create_group(self, name).await
    }

    async fn insert_user(&self, user: &NewUser) -> EsignResult<UserId> {
        EsignClient::insert_user(self, user).await
    }

    async fn update_user(&self, user_id: &UserId, update: &UserUpdate) -> EsignResult<()> {
        EsignClient::update_user(self, user_id, update).await
    }

    async fn update_user_groups(&self, user_id: &UserId, groups: &[GroupId]) -> EsignResult<()> {
        EsignClient::update_user_groups(self, user_id, groups).await
    }

    async fn deactivate_user(&self, user_id: &UserId) -> EsignResult<()> {
        EsignClient::deactivate_user(self, user_id).await
    }
}
