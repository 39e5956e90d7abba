//! Password hashing using argon2
//!
//! Digests are PHC strings (`$argon2id$v=19$m=...,t=...,p=...$salt$hash`)
//! carrying their own salt and cost parameters, so verification works
//! across changes to the configured work factor.
//!
//! # Performance Considerations
//!
//! Argon2 is intentionally CPU-intensive. Request handlers use the
//! `*_async` variants, which run on the blocking thread pool.

use crate::config::PasswordConfig;
use argon2::{
    password_hash::{
        rand_core::OsRng, Error as PhcError, PasswordHash, PasswordHasher, PasswordVerifier,
        SaltString,
    },
    Algorithm, Argon2, Params, Version,
};
use std::str::FromStr;
use thiserror::Error;

/// Password hashing failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PasswordError {
    /// Internal failure while hashing (entropy source, task join)
    #[error("failed to hash password: {0}")]
    Hashing(String),

    /// The password does not match the stored digest
    #[error("password does not match")]
    Mismatch,

    /// The stored digest was not produced by this hasher
    #[error("stored password digest is malformed")]
    MalformedDigest,

    /// The configured cost parameters are out of range
    #[error("invalid argon2 parameters: {0}")]
    InvalidParams(String),
}

/// Password hashing service
///
/// Uses Argon2id, which is the recommended variant for password hashing.
/// Cheap to clone; holds only the cost parameters.
#[derive(Debug, Clone)]
pub struct PasswordService {
    params: Params,
}

impl PasswordService {
    /// Build a hasher with the configured work factor
    pub fn new(config: &PasswordConfig) -> Result<Self, PasswordError> {
        let params = Params::new(config.memory_kib, config.iterations, config.parallelism, None)
            .map_err(|e| PasswordError::InvalidParams(e.to_string()))?;
        Ok(Self { params })
    }

    fn argon2(&self) -> Argon2<'static> {
        Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone())
    }

    /// Hash a password using argon2 (blocking operation)
    ///
    /// A fresh salt is drawn for every call, so hashing the same password
    /// twice yields two different digests.
    pub fn hash(&self, password: &str) -> Result<String, PasswordError> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = self
            .argon2()
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| PasswordError::Hashing(e.to_string()))?;
        Ok(hash.to_string())
    }

    /// Verify a password against a stored digest (blocking operation)
    pub fn verify(&self, password: &str, digest: &str) -> Result<(), PasswordError> {
        let parsed = PasswordHash::new(digest).map_err(|_| PasswordError::MalformedDigest)?;

        // The verifier reports a digest without salt or output as a plain
        // mismatch; such a digest can never have come from `hash`.
        if parsed.salt.is_none() || parsed.hash.is_none() {
            return Err(PasswordError::MalformedDigest);
        }
        if Algorithm::from_str(parsed.algorithm.as_str()).is_err() {
            return Err(PasswordError::MalformedDigest);
        }

        match self.argon2().verify_password(password.as_bytes(), &parsed) {
            Ok(()) => Ok(()),
            Err(PhcError::Password) => Err(PasswordError::Mismatch),
            Err(_) => Err(PasswordError::MalformedDigest),
        }
    }

    /// Hash a password asynchronously (non-blocking)
    pub async fn hash_async(&self, password: String) -> Result<String, PasswordError> {
        let service = self.clone();
        tokio::task::spawn_blocking(move || service.hash(&password))
            .await
            .map_err(|e| PasswordError::Hashing(format!("task join error: {}", e)))?
    }

    /// Verify a password asynchronously (non-blocking)
    pub async fn verify_async(&self, password: String, digest: String) -> Result<(), PasswordError> {
        let service = self.clone();
        tokio::task::spawn_blocking(move || service.verify(&password, &digest))
            .await
            .map_err(|e| PasswordError::Hashing(format!("task join error: {}", e)))?
    }
}
