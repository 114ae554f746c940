#![allow(clippy::pedantic)]
#![allow(clippy::nursery)]
#![deny(clippy::unwrap_used)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::needless_raw_string_hashes)]

extern crate sqlx_core as sqlx;

use sqlx_core::pool::{Pool, PoolOptions};
use sqlx_sqlite::{Sqlite, SqliteConnectOptions, SqliteJournalMode, SqliteSynchronous};
use std::str::FromStr;
use std::time::Duration;

pub mod repo;
mod store;

pub use store::SqliteUserStore;

pub type SqlitePool = Pool<Sqlite>;

pub async fn connect_sqlite_with_max(
    path: &str,
    max_connections: u32,
) -> Result<SqlitePool, sqlx_core::Error> {
    let options = SqliteConnectOptions::from_str(path)?
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .synchronous(SqliteSynchronous::Normal)
        .busy_timeout(Duration::from_secs(5))
        .foreign_keys(true);

    let pool: SqlitePool = PoolOptions::new()
        .max_connections(max_connections)
        .connect_with(options)
        .await?;
    tracing::debug!(event = "db_pool_ready", max_connections, "SQLite pool ready");
    Ok(pool)
}

pub async fn migrate(pool: &SqlitePool) -> Result<(), sqlx_core::migrate::MigrateError> {
    sqlx_macros::migrate!("./migrations").run(pool).await?;
    tracing::debug!(event = "db_migrated", "SQLite migrations applied");
    Ok(())
}
