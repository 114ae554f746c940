use async_trait::async_trait;

use crate::errors::StoreResult;
use crate::models::{RoleSet, RoleSync, UserId};
use crate::services::{RoleAssigner, UserWrites};

/// Computes the additions and removals that turn `current` into `desired`.
#[must_use]
pub fn diff_roles(current: &RoleSet, desired: &RoleSet) -> RoleSync {
    RoleSync {
        added: desired.difference(current).copied().collect(),
        removed: current.difference(desired).copied().collect(),
    }
}

/// Role assigner that touches only the rows that differ.
#[derive(Debug, Clone, Copy, Default)]
pub struct MembershipSync;

#[async_trait]
impl RoleAssigner for MembershipSync {
    async fn sync<W>(&self, writes: &mut W, user_id: UserId, roles: &RoleSet) -> StoreResult<RoleSync>
    where
        W: UserWrites + ?Sized,
    {
        let current = writes.role_ids(user_id).await?;
        let delta = diff_roles(&current, roles);
        if delta.is_noop() {
            return Ok(delta);
        }
        if !delta.removed.is_empty() {
            writes.detach_roles(user_id, &delta.removed).await?;
        }
        if !delta.added.is_empty() {
            writes.attach_roles(user_id, &delta.added).await?;
        }
        tracing::debug!(
            event = "roles_synced",
            user_id,
            added = ?delta.added,
            removed = ?delta.removed,
            "Role membership synced"
        );
        Ok(delta)
    }
}
