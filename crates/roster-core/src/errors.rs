use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::UserId;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("user {0} not found")]
    NotFound(UserId),
    #[error("{0}")]
    Db(String),
}

impl StoreError {
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "not_found",
            Self::Db(_) => "db_error",
        }
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ImageError {
    #[error("{0}")]
    Store(String),
    #[error("{0}")]
    Delete(String),
}

impl ImageError {
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::Store(_) => "image_store_failed",
            Self::Delete(_) => "image_delete_failed",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct HashError(pub String);

impl HashError {
    #[must_use]
    pub fn code(&self) -> &'static str {
        "kdf_error"
    }
}

/// A failed write, carrying the code and message of whatever caused it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationFailed {
    pub code: String,
    pub message: String,
}

impl OperationFailed {
    #[must_use]
    pub fn new(code: &str, message: impl Into<String>) -> Self {
        Self {
            code: code.to_string(),
            message: message.into(),
        }
    }

    /// Prefixes the message, keeping the original code.
    #[must_use]
    pub fn context(self, prefix: &str) -> Self {
        Self {
            code: self.code,
            message: format!("{prefix}: {}", self.message),
        }
    }
}

impl std::fmt::Display for OperationFailed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for OperationFailed {}

impl From<StoreError> for OperationFailed {
    fn from(err: StoreError) -> Self {
        Self::new(err.code(), err.to_string())
    }
}

impl From<ImageError> for OperationFailed {
    fn from(err: ImageError) -> Self {
        Self::new(err.code(), err.to_string())
    }
}

impl From<HashError> for OperationFailed {
    fn from(err: HashError) -> Self {
        Self::new(err.code(), err.to_string())
    }
}

/// Failure of the admin create/update paths.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UserWriteError {
    #[error("user {0} not found")]
    NotFound(UserId),
    #[error(transparent)]
    OperationFailed(#[from] OperationFailed),
}

impl UserWriteError {
    #[must_use]
    pub fn code(&self) -> &str {
        match self {
            Self::NotFound(_) => "not_found",
            Self::OperationFailed(failed) => &failed.code,
        }
    }
}
