//! Password hashing using Argon2id.

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, SaltString};
use argon2::{Algorithm, Argon2, Params, PasswordHasher as _, PasswordVerifier, Version};
use std::sync::Arc;
use thiserror::Error;

use crate::config::PasswordConfig;

#[derive(Debug, Error)]
pub enum HashError {
    #[error("invalid hashing parameters: {0}")]
    InvalidParams(String),

    #[error("invalid hash format: {0}")]
    MalformedHash(String),

    #[error("hashing failed: {0}")]
    Hashing(String),
}

/// One-way salted password transform.
///
/// Implementations must never allow the plaintext to be recovered, and
/// `hash` must produce a different output on every call for the same input.
pub trait PasswordHasher: Send + Sync {
    fn hash(&self, plaintext: &str) -> Result<String, HashError>;

    /// `Ok(false)` on mismatch; `Err` only when `hash` cannot be parsed.
    fn verify(&self, plaintext: &str, hash: &str) -> Result<bool, HashError>;
}

/// Hash on the blocking pool so Argon2 does not stall the async workers.
pub async fn hash_blocking(
    hasher: Arc<dyn PasswordHasher>,
    plaintext: String,
) -> Result<String, HashError> {
    tokio::task::spawn_blocking(move || hasher.hash(&plaintext))
        .await
        .map_err(|e| HashError::Hashing(e.to_string()))?
}

pub async fn verify_blocking(
    hasher: Arc<dyn PasswordHasher>,
    plaintext: String,
    hash: String,
) -> Result<bool, HashError> {
    tokio::task::spawn_blocking(move || hasher.verify(&plaintext, &hash))
        .await
        .map_err(|e| HashError::Hashing(e.to_string()))?
}

/// Argon2id with a fresh random salt per hash, stored as a PHC string.
///
/// If a pepper is configured it is prepended to the password on both hash
/// and verify, so changing it invalidates every stored hash.
#[derive(Clone)]
pub struct Argon2Hasher {
    params: Params,
    pepper: Option<String>,
}

impl Argon2Hasher {
    pub fn new(config: &PasswordConfig) -> Result<Self, HashError> {
        let params = Params::new(
            config.memory_kib,
            config.iterations,
            config.parallelism,
            None,
        )
        .map_err(|e| HashError::InvalidParams(e.to_string()))?;

        Ok(Self {
            params,
            pepper: config.pepper.clone(),
        })
    }

    fn argon2(&self) -> Argon2<'static> {
        Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone())
    }

    fn peppered(&self, plaintext: &str) -> String {
        match &self.pepper {
            Some(p) => format!("{p}{plaintext}"),
            None => plaintext.to_string(),
        }
    }
}

impl std::fmt::Debug for Argon2Hasher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Argon2Hasher")
            .field("params", &self.params)
            .field("pepper", &self.pepper.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl PasswordHasher for Argon2Hasher {
    fn hash(&self, plaintext: &str) -> Result<String, HashError> {
        let salt = SaltString::generate(&mut OsRng);
        let input = self.peppered(plaintext);
        self.argon2()
            .hash_password(input.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| HashError::Hashing(e.to_string()))
    }

    fn verify(&self, plaintext: &str, hash: &str) -> Result<bool, HashError> {
        let parsed = PasswordHash::new(hash).map_err(|e| HashError::MalformedHash(e.to_string()))?;
        let input = self.peppered(plaintext);

        // Cost parameters are read from the PHC string, so hashes written
        // under older settings still verify.
        match self.argon2().verify_password(input.as_bytes(), &parsed) {
            Ok(()) => Ok(true),
            Err(argon2::password_hash::Error::Password) => Ok(false),
            Err(e) => Err(HashError::Hashing(e.to_string())),
        }
    }
}
