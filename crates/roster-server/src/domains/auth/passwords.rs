use std::sync::Arc;

use async_trait::async_trait;
use roster_core::{CredentialHasher, HashError, Password, StoredCredential};
use roster_crypto::{hash_password, KdfParams};
use tokio::sync::Semaphore;

/// [`CredentialHasher`] producing peppered argon2id PHC strings.
///
/// Hashing runs on the blocking pool; the semaphore caps how many derivations
/// run at once.
#[derive(Clone)]
pub struct Argon2CredentialHasher {
    pepper: Arc<str>,
    params: KdfParams,
    permits: Arc<Semaphore>,
}

impl Argon2CredentialHasher {
    pub fn new(pepper: &str, params: KdfParams, max_concurrency: usize) -> Self {
        Self {
            pepper: Arc::from(pepper),
            params,
            permits: Arc::new(Semaphore::new(max_concurrency.max(1))),
        }
    }
}

impl std::fmt::Debug for Argon2CredentialHasher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Argon2CredentialHasher")
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl CredentialHasher for Argon2CredentialHasher {
    async fn hash(&self, plaintext: &Password) -> Result<StoredCredential, HashError> {
        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|_| HashError("kdf limiter closed".to_string()))?;

        let password = plaintext.clone();
        let pepper = Arc::clone(&self.pepper);
        let params = self.params;
        let hashed =
            tokio::task::spawn_blocking(move || hash_password(password.as_str(), &pepper, &params))
                .await
                .map_err(|err| HashError(format!("kdf task failed: {err}")))?
                .map_err(|err| {
                    tracing::error!(event = "password_hash_failed", error = %err);
                    HashError(err.to_string())
                })?;
        Ok(StoredCredential::new(hashed))
    }
}
