use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::{Algorithm, Argon2, Params, Version};
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};
use tracing::instrument;

/// Argon2id cost parameters used for new hashes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KdfParams {
    #[serde(default = "default_memory_kb")]
    pub memory_kb: u32,
    #[serde(default = "default_iterations")]
    pub iterations: u32,
    #[serde(default = "default_parallelism")]
    pub parallelism: u32,
}

fn default_memory_kb() -> u32 {
    19 * 1024
}

fn default_iterations() -> u32 {
    2
}

fn default_parallelism() -> u32 {
    1
}

impl Default for KdfParams {
    fn default() -> Self {
        Self {
            memory_kb: default_memory_kb(),
            iterations: default_iterations(),
            parallelism: default_parallelism(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PasswordError {
    InvalidParams(String),
    Hash(String),
    InvalidHash(String),
}

impl std::fmt::Display for PasswordError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidParams(msg) => write!(f, "invalid kdf params: {msg}"),
            Self::Hash(msg) => write!(f, "password hashing failed: {msg}"),
            Self::InvalidHash(msg) => write!(f, "stored hash is malformed: {msg}"),
        }
    }
}

impl std::error::Error for PasswordError {}

fn argon2<'a>(pepper: &'a str, params: Params) -> Result<Argon2<'a>, PasswordError> {
    if pepper.is_empty() {
        return Ok(Argon2::new(Algorithm::Argon2id, Version::V0x13, params));
    }
    Argon2::new_with_secret(pepper.as_bytes(), Algorithm::Argon2id, Version::V0x13, params)
        .map_err(|err| PasswordError::InvalidParams(err.to_string()))
}

/// Hashes `password` into a PHC string with a fresh random salt.
#[instrument(level = "debug", skip_all)]
pub fn hash_password(
    password: &str,
    pepper: &str,
    params: &KdfParams,
) -> Result<String, PasswordError> {
    let argon_params = Params::new(params.memory_kb, params.iterations, params.parallelism, None)
        .map_err(|err| PasswordError::InvalidParams(err.to_string()))?;
    let salt = SaltString::generate(&mut OsRng);
    let hash = argon2(pepper, argon_params)?
        .hash_password(password.as_bytes(), &salt)
        .map_err(|err| PasswordError::Hash(err.to_string()))?;
    Ok(hash.to_string())
}

/// Checks `password` against a PHC string produced by [`hash_password`].
#[instrument(level = "debug", skip_all)]
pub fn verify_password(stored: &str, password: &str, pepper: &str) -> Result<bool, PasswordError> {
    let parsed =
        PasswordHash::new(stored).map_err(|err| PasswordError::InvalidHash(err.to_string()))?;
    match argon2(pepper, Params::default())?.verify_password(password.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(err) => Err(PasswordError::Hash(err.to_string())),
    }
}
