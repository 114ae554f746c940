use std::collections::BTreeSet;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use zeroize::{Zeroize, ZeroizeOnDrop};

pub type UserId = i64;
pub type RoleId = i64;
pub type RoleSet = BTreeSet<RoleId>;

/// Path prefix under which user photos are stored.
pub const USER_IMAGE_PREFIX: &str = "users";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    #[serde(skip)]
    pub password: Option<StoredCredential>,
    pub image_path: Option<ImageRef>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    pub id: RoleId,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

/// One-way derived form of a password. Never printed.
#[derive(Clone, PartialEq, Eq)]
pub struct StoredCredential(String);

impl StoredCredential {
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for StoredCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("StoredCredential([redacted])")
    }
}

/// Plaintext password as received from a caller. Wiped on drop.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct Password(String);

impl Password {
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for Password {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Password([redacted])")
    }
}

impl From<&str> for Password {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for Password {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Opaque pointer to a stored image blob, owned by the user that references it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ImageRef(String);

impl ImageRef {
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ImageRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResizeOptions {
    pub width: u32,
    pub height: u32,
}

impl ResizeOptions {
    pub const PROFILE_THUMBNAIL: Self = Self {
        width: 150,
        height: 150,
    };

    #[must_use]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

impl fmt::Display for ResizeOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

#[derive(Clone, Default, PartialEq, Eq)]
pub struct PhotoUpload {
    pub bytes: Vec<u8>,
}

impl PhotoUpload {
    #[must_use]
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            bytes: bytes.into(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl fmt::Debug for PhotoUpload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PhotoUpload")
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// Fields accepted by the admin create and update paths.
#[derive(Debug, Clone, Default)]
pub struct UserInput {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub password: Option<Password>,
    pub role_ids: Option<Vec<RoleId>>,
    pub photo: Option<PhotoUpload>,
}

impl UserInput {
    /// Requested role membership; an absent list means "no roles".
    #[must_use]
    pub fn role_set(&self) -> RoleSet {
        self.role_ids
            .as_deref()
            .unwrap_or_default()
            .iter()
            .copied()
            .collect()
    }

    #[must_use]
    pub fn photo_upload(&self) -> Option<&PhotoUpload> {
        non_empty_photo(self.photo.as_ref())
    }

    #[must_use]
    pub fn new_password(&self) -> Option<&Password> {
        non_empty_password(self.password.as_ref())
    }
}

/// Fields a user may change on their own profile.
#[derive(Debug, Clone, Default)]
pub struct ProfileInput {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub password: Option<Password>,
    pub photo: Option<PhotoUpload>,
}

impl ProfileInput {
    #[must_use]
    pub fn photo_upload(&self) -> Option<&PhotoUpload> {
        non_empty_photo(self.photo.as_ref())
    }

    #[must_use]
    pub fn new_password(&self) -> Option<&Password> {
        non_empty_password(self.password.as_ref())
    }
}

fn non_empty_photo(photo: Option<&PhotoUpload>) -> Option<&PhotoUpload> {
    photo.filter(|photo| !photo.is_empty())
}

fn non_empty_password(password: Option<&Password>) -> Option<&Password> {
    password.filter(|password| !password.is_empty())
}

/// Transformed column values ready to be written. `None` leaves a column untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserChanges {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub password: Option<StoredCredential>,
    pub image_path: Option<ImageRef>,
}

impl UserChanges {
    /// Copies the plain profile columns; credential and image are set by the caller.
    #[must_use]
    pub fn with_fields(name: Option<&str>, email: Option<&str>, phone: Option<&str>) -> Self {
        Self {
            name: name.map(str::to_string),
            email: email.map(str::to_string),
            phone: phone.map(str::to_string),
            password: None,
            image_path: None,
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.email.is_none()
            && self.phone.is_none()
            && self.password.is_none()
            && self.image_path.is_none()
    }

    pub fn apply_to(&self, user: &mut User) {
        if let Some(name) = &self.name {
            user.name = name.clone();
        }
        if let Some(email) = &self.email {
            user.email = Some(email.clone());
        }
        if let Some(phone) = &self.phone {
            user.phone = Some(phone.clone());
        }
        if let Some(password) = &self.password {
            user.password = Some(password.clone());
        }
        if let Some(image_path) = &self.image_path {
            user.image_path = Some(image_path.clone());
        }
    }
}

/// Membership delta produced by a role sync.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoleSync {
    pub added: RoleSet,
    pub removed: RoleSet,
}

impl RoleSync {
    #[must_use]
    pub fn is_noop(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}
