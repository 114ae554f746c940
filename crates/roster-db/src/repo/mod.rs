macro_rules! query {
    ($sql:expr $(, $arg:expr)* $(,)?) => {{
        #[allow(unused_mut)]
        let mut q = sqlx_core::query::query::<sqlx_sqlite::Sqlite>($sql);
        $(q = q.bind($arg);)*
        q
    }};
}

macro_rules! query_as {
    ($ty:ty, $sql:expr $(, $arg:expr)* $(,)?) => {{
        #[allow(unused_mut)]
        let mut q = sqlx_core::query_as::query_as::<sqlx_sqlite::Sqlite, $ty>($sql);
        $(q = q.bind($arg);)*
        q
    }};
}

pub(crate) mod prelude {
    pub(crate) use chrono::{DateTime, Utc};
    pub(crate) use roster_core::{Role, RoleId, RoleSet, User, UserChanges, UserId};
    pub(crate) use sqlx_core::row::Row;
    pub(crate) use sqlx_sqlite::SqliteConnection;
}

mod roles;
mod users;

pub use roles::{RoleRepo, RoleUserRepo};
pub use users::UserRepo;
