#[cfg(feature = "sqlite")]
use sqlx_core::from_row::FromRow;
#[cfg(feature = "sqlite")]
use sqlx_core::row::Row;
#[cfg(feature = "sqlite")]
use sqlx_sqlite::SqliteRow;

#[cfg(feature = "sqlite")]
use super::*;

macro_rules! impl_from_row {
    ($ty:ty, $row:ident => $body:block) => {
        #[cfg(feature = "sqlite")]
        impl FromRow<'_, SqliteRow> for $ty {
            fn from_row($row: &SqliteRow) -> Result<Self, sqlx_core::Error> {
                $body
            }
        }
    };
}

impl_from_row!(User, row => {
        let password: Option<String> = row.try_get("password")?;
        let image_path: Option<String> = row.try_get("image_path")?;
        Ok(Self {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            email: row.try_get("email")?,
            phone: row.try_get("phone")?,
            password: password.map(StoredCredential::new),
            image_path: image_path.map(ImageRef::new),
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
);

impl_from_row!(Role, row => {
        Ok(Self {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            created_at: row.try_get("created_at")?,
        })
    }
);
