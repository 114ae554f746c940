use serde::{Deserialize, Serialize};

use crate::errors::OperationFailed;
use crate::models::UserId;
use crate::services::AuthContext;

/// Authenticated actor, resolved by the caller before invoking a service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub user_id: UserId,
}

impl Identity {
    #[must_use]
    pub const fn new(user_id: UserId) -> Self {
        Self { user_id }
    }
}

impl AuthContext for Identity {
    fn current_user_id(&self) -> Result<UserId, OperationFailed> {
        Ok(self.user_id)
    }
}

/// No authenticated actor.
#[derive(Debug, Clone, Copy, Default)]
pub struct Anonymous;

impl AuthContext for Anonymous {
    fn current_user_id(&self) -> Result<UserId, OperationFailed> {
        Err(OperationFailed::new(
            "unauthenticated",
            "no authenticated user",
        ))
    }
}
