use super::prelude::*;

const USER_COLUMNS: &str = "id, name, email, phone, password, image_path, created_at, updated_at";

pub struct UserRepo<'c> {
    conn: &'c mut SqliteConnection,
}

impl<'c> UserRepo<'c> {
    pub fn new(conn: &'c mut SqliteConnection) -> Self {
        Self { conn }
    }

    pub async fn create(
        &mut self,
        changes: &UserChanges,
        now: DateTime<Utc>,
    ) -> Result<User, sqlx_core::Error> {
        let sql = format!(
            r#"
            INSERT INTO users (name, email, phone, password, image_path, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)
            RETURNING {USER_COLUMNS}
            "#
        );
        query_as!(
            User,
            &sql,
            changes.name.as_deref(),
            changes.email.as_deref(),
            changes.phone.as_deref(),
            changes.password.as_ref().map(|value| value.as_str()),
            changes.image_path.as_ref().map(|value| value.as_str()),
            now
        )
        .fetch_one(&mut *self.conn)
        .await
    }

    pub async fn get_by_id(&mut self, id: UserId) -> Result<Option<User>, sqlx_core::Error> {
        let sql = format!(
            r#"
            SELECT {USER_COLUMNS}
            FROM users
            WHERE id = ?1
            "#
        );
        query_as!(User, &sql, id)
            .fetch_optional(&mut *self.conn)
            .await
    }

    /// Writes only the columns present in `changes`.
    pub async fn update_fields(
        &mut self,
        id: UserId,
        changes: &UserChanges,
        now: DateTime<Utc>,
    ) -> Result<Option<User>, sqlx_core::Error> {
        let sql = format!(
            r#"
            UPDATE users
            SET name = COALESCE(?2, name),
                email = COALESCE(?3, email),
                phone = COALESCE(?4, phone),
                password = COALESCE(?5, password),
                image_path = COALESCE(?6, image_path),
                updated_at = ?7
            WHERE id = ?1
            RETURNING {USER_COLUMNS}
            "#
        );
        query_as!(
            User,
            &sql,
            id,
            changes.name.as_deref(),
            changes.email.as_deref(),
            changes.phone.as_deref(),
            changes.password.as_ref().map(|value| value.as_str()),
            changes.image_path.as_ref().map(|value| value.as_str()),
            now
        )
        .fetch_optional(&mut *self.conn)
        .await
    }

    /// Overwrites every mutable column with the values held by `user`.
    pub async fn save(
        &mut self,
        user: &User,
        now: DateTime<Utc>,
    ) -> Result<Option<User>, sqlx_core::Error> {
        let sql = format!(
            r#"
            UPDATE users
            SET name = ?2,
                email = ?3,
                phone = ?4,
                password = ?5,
                image_path = ?6,
                updated_at = ?7
            WHERE id = ?1
            RETURNING {USER_COLUMNS}
            "#
        );
        query_as!(
            User,
            &sql,
            user.id,
            user.name.as_str(),
            user.email.as_deref(),
            user.phone.as_deref(),
            user.password.as_ref().map(|value| value.as_str()),
            user.image_path.as_ref().map(|value| value.as_str()),
            now
        )
        .fetch_optional(&mut *self.conn)
        .await
    }
}
