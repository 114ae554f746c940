use std::sync::Arc;

use roster_core::MembershipSync;
use roster_db::{SqlitePool, SqliteUserStore};

use crate::domains::auth::Argon2CredentialHasher;
use crate::domains::users::UserWriteService;
use crate::infra::DiskImageStore;

pub type UserService =
    UserWriteService<SqliteUserStore, DiskImageStore, Argon2CredentialHasher, MembershipSync>;

#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    pub users: Arc<UserService>,
}
