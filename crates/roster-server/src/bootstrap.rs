use std::sync::Arc;

use roster_core::MembershipSync;
use roster_db::{connect_sqlite_with_max, SqlitePool, SqliteUserStore};

use crate::app::AppState;
use crate::domains::auth::Argon2CredentialHasher;
use crate::domains::users::{ImagePolicy, UserWriteService};
use crate::infra::DiskImageStore;
use crate::settings::Settings;

pub async fn connect_db(settings: &Settings) -> Result<SqlitePool, sqlx_core::Error> {
    connect_sqlite_with_max(
        &settings.config.database.url,
        settings.config.database.pool_max,
    )
    .await
}

pub fn build_state(settings: &Settings, db: SqlitePool) -> AppState {
    let images = &settings.config.images;
    let auth = &settings.config.auth;
    let users = UserWriteService::new(
        SqliteUserStore::new(db.clone()),
        DiskImageStore::new(&images.root),
        Argon2CredentialHasher::new(&settings.password_pepper, auth.kdf, auth.kdf_max_concurrency),
        MembershipSync,
    )
    .with_image_policy(ImagePolicy {
        default_size: images.default_size,
        profile_size: images.profile_size,
    });

    AppState {
        db,
        users: Arc::new(users),
    }
}

pub fn log_startup(settings: &Settings) {
    if settings.password_pepper.is_empty() {
        tracing::warn!(
            event = "password_pepper_missing",
            "ROSTER_PASSWORD_PEPPER not set; hashing passwords without a pepper"
        );
    }
    tracing::info!(
        event = "roster_startup",
        db_url = %settings.config.database.url,
        db_pool_max = settings.config.database.pool_max,
        image_root = %settings.config.images.root,
        default_size = ?settings.config.images.default_size,
        profile_size = %settings.config.images.profile_size,
        kdf_memory_kb = settings.config.auth.kdf.memory_kb,
        kdf_max_concurrency = settings.config.auth.kdf_max_concurrency,
        "Roster starting"
    );
}
