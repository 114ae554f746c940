use std::ops::DerefMut;

use async_trait::async_trait;
use chrono::Utc;
use roster_core::{
    RoleSet, StoreError, StoreResult, User, UserChanges, UserId, UserStore, UserTransaction,
    UserWrites,
};
use sqlx_core::transaction::Transaction;
use sqlx_sqlite::{Sqlite, SqliteConnection};

use crate::repo::{RoleUserRepo, UserRepo};
use crate::SqlitePool;

fn db_error(err: sqlx_core::Error) -> StoreError {
    StoreError::Db(err.to_string())
}

/// [`UserStore`] backed by a SQLite pool.
#[derive(Debug, Clone)]
pub struct SqliteUserStore {
    pool: SqlitePool,
}

impl SqliteUserStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for SqliteUserStore {
    async fn find_by_id(&self, id: UserId) -> StoreResult<User> {
        let mut conn = self.pool.acquire().await.map_err(db_error)?;
        UserRepo::new(&mut *conn)
            .get_by_id(id)
            .await
            .map_err(db_error)?
            .ok_or(StoreError::NotFound(id))
    }

    async fn writer(&self) -> StoreResult<Box<dyn UserWrites + '_>> {
        let conn = self.pool.acquire().await.map_err(db_error)?;
        Ok(Box::new(SqliteWrites { conn }))
    }

    async fn begin(&self) -> StoreResult<Box<dyn UserTransaction + '_>> {
        let tx = self.pool.begin().await.map_err(db_error)?;
        Ok(Box::new(SqliteWrites { conn: tx }))
    }
}

struct SqliteWrites<C> {
    conn: C,
}

#[async_trait]
impl<C> UserWrites for SqliteWrites<C>
where
    C: DerefMut<Target = SqliteConnection> + Send,
{
    async fn find_user(&mut self, id: UserId) -> StoreResult<User> {
        UserRepo::new(&mut *self.conn)
            .get_by_id(id)
            .await
            .map_err(db_error)?
            .ok_or(StoreError::NotFound(id))
    }

    async fn insert_user(&mut self, changes: &UserChanges) -> StoreResult<User> {
        UserRepo::new(&mut *self.conn)
            .create(changes, Utc::now())
            .await
            .map_err(db_error)
    }

    async fn update_user(&mut self, id: UserId, changes: &UserChanges) -> StoreResult<User> {
        UserRepo::new(&mut *self.conn)
            .update_fields(id, changes, Utc::now())
            .await
            .map_err(db_error)?
            .ok_or(StoreError::NotFound(id))
    }

    async fn save_user(&mut self, user: &User) -> StoreResult<User> {
        UserRepo::new(&mut *self.conn)
            .save(user, Utc::now())
            .await
            .map_err(db_error)?
            .ok_or(StoreError::NotFound(user.id))
    }

    async fn role_ids(&mut self, user_id: UserId) -> StoreResult<RoleSet> {
        RoleUserRepo::new(&mut *self.conn)
            .role_ids(user_id)
            .await
            .map_err(db_error)
    }

    async fn attach_roles(&mut self, user_id: UserId, roles: &RoleSet) -> StoreResult<()> {
        let now = Utc::now();
        let mut repo = RoleUserRepo::new(&mut *self.conn);
        for role_id in roles {
            repo.attach(user_id, *role_id, now).await.map_err(db_error)?;
        }
        Ok(())
    }

    async fn detach_roles(&mut self, user_id: UserId, roles: &RoleSet) -> StoreResult<()> {
        let mut repo = RoleUserRepo::new(&mut *self.conn);
        for role_id in roles {
            repo.detach(user_id, *role_id).await.map_err(db_error)?;
        }
        Ok(())
    }
}

#[async_trait]
impl UserTransaction for SqliteWrites<Transaction<'static, Sqlite>> {
    async fn commit(self: Box<Self>) -> StoreResult<()> {
        self.conn.commit().await.map_err(db_error)
    }

    async fn rollback(self: Box<Self>) -> StoreResult<()> {
        self.conn.rollback().await.map_err(db_error)
    }
}
