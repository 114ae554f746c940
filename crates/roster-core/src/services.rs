use async_trait::async_trait;

use crate::errors::{HashError, ImageError, OperationFailed, StoreResult};
use crate::models::{
    ImageRef, Password, PhotoUpload, ResizeOptions, RoleSet, RoleSync, StoredCredential, User,
    UserChanges, UserId,
};

/// Row-level writes, either autocommitted or scoped to a transaction.
#[async_trait]
pub trait UserWrites: Send {
    /// Reads a user through this writer, so a transaction sees its own snapshot.
    async fn find_user(&mut self, id: UserId) -> StoreResult<User>;
    async fn insert_user(&mut self, changes: &UserChanges) -> StoreResult<User>;
    /// Partial update: only the `Some` columns are written.
    async fn update_user(&mut self, id: UserId, changes: &UserChanges) -> StoreResult<User>;
    /// Full-record save of every mutable column.
    async fn save_user(&mut self, user: &User) -> StoreResult<User>;
    async fn role_ids(&mut self, user_id: UserId) -> StoreResult<RoleSet>;
    async fn attach_roles(&mut self, user_id: UserId, roles: &RoleSet) -> StoreResult<()>;
    async fn detach_roles(&mut self, user_id: UserId, roles: &RoleSet) -> StoreResult<()>;
}

#[async_trait]
pub trait UserTransaction: UserWrites {
    async fn commit(self: Box<Self>) -> StoreResult<()>;
    async fn rollback(self: Box<Self>) -> StoreResult<()>;
}

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_id(&self, id: UserId) -> StoreResult<User>;
    async fn writer(&self) -> StoreResult<Box<dyn UserWrites + '_>>;
    async fn begin(&self) -> StoreResult<Box<dyn UserTransaction + '_>>;
}

#[async_trait]
pub trait ImageService: Send + Sync {
    async fn store(
        &self,
        photo: &PhotoUpload,
        prefix: &str,
        resize: Option<ResizeOptions>,
    ) -> Result<ImageRef, ImageError>;
    /// Releases a stored image. Deleting an image that is already gone succeeds.
    async fn delete(&self, image: &ImageRef) -> Result<(), ImageError>;
}

#[async_trait]
pub trait CredentialHasher: Send + Sync {
    async fn hash(&self, plaintext: &Password) -> Result<StoredCredential, HashError>;
}

/// Makes a user's role membership exactly equal to `roles`.
#[async_trait]
pub trait RoleAssigner: Send + Sync {
    async fn sync<W>(&self, writes: &mut W, user_id: UserId, roles: &RoleSet) -> StoreResult<RoleSync>
    where
        W: UserWrites + ?Sized;
}

pub trait AuthContext: Send + Sync {
    fn current_user_id(&self) -> Result<UserId, OperationFailed>;
}

/// Outcome of a self-service profile update. Failures are data, not errors.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use]
pub enum ProfileUpdate {
    Updated(User),
    Failed(OperationFailed),
}

impl ProfileUpdate {
    pub fn into_result(self) -> Result<User, OperationFailed> {
        match self {
            Self::Updated(user) => Ok(user),
            Self::Failed(failed) => Err(failed),
        }
    }
}
