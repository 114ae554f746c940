use super::prelude::*;

pub struct RoleRepo<'c> {
    conn: &'c mut SqliteConnection,
}

impl<'c> RoleRepo<'c> {
    pub fn new(conn: &'c mut SqliteConnection) -> Self {
        Self { conn }
    }

    pub async fn list(&mut self) -> Result<Vec<Role>, sqlx_core::Error> {
        query_as!(
            Role,
            r#"
            SELECT id, name, created_at
            FROM roles
            ORDER BY id ASC
            "#
        )
        .fetch_all(&mut *self.conn)
        .await
    }
}

pub struct RoleUserRepo<'c> {
    conn: &'c mut SqliteConnection,
}

impl<'c> RoleUserRepo<'c> {
    pub fn new(conn: &'c mut SqliteConnection) -> Self {
        Self { conn }
    }

    pub async fn role_ids(&mut self, user_id: UserId) -> Result<RoleSet, sqlx_core::Error> {
        let rows = query!(
            r#"
            SELECT role_id
            FROM role_user
            WHERE user_id = ?1
            "#,
            user_id
        )
        .fetch_all(&mut *self.conn)
        .await?;
        rows.iter()
            .map(|row| row.try_get::<RoleId, _>("role_id"))
            .collect()
    }

    pub async fn attach(
        &mut self,
        user_id: UserId,
        role_id: RoleId,
        now: DateTime<Utc>,
    ) -> Result<(), sqlx_core::Error> {
        query!(
            r#"
            INSERT INTO role_user (user_id, role_id, created_at)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(user_id, role_id) DO NOTHING
            "#,
            user_id,
            role_id,
            now
        )
        .execute(&mut *self.conn)
        .await
        .map(|_| ())
    }

    pub async fn detach(&mut self, user_id: UserId, role_id: RoleId) -> Result<u64, sqlx_core::Error> {
        query!(
            r#"
            DELETE FROM role_user
            WHERE user_id = ?1 AND role_id = ?2
            "#,
            user_id,
            role_id
        )
        .execute(&mut *self.conn)
        .await
        .map(|result| result.rows_affected())
    }
}
