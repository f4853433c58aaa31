use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};
use thiserror::Error;

/// Minimum accepted secret length.
pub const MIN_SECRET_LEN: usize = 5;

/// Number of SHA-256 iterations for secret stretching.
const HASH_ITERATIONS: u32 = 100_000;

/// Persisted credential record for one registered user.
///
/// Immutable after registration except for the secret, which only the owner
/// may rotate. Records are never deleted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRecord {
    pub secret_hash: String,
    pub salt: String,
    pub registered_at: DateTime<Utc>,
}

impl UserRecord {
    /// Build a record by hashing `secret` with the given salt.
    #[must_use]
    pub fn new(secret: &str, salt: &str, registered_at: DateTime<Utc>) -> Self {
        Self {
            secret_hash: hash_secret(secret, salt),
            salt: salt.to_string(),
            registered_at,
        }
    }

    /// Check a supplied secret against the stored hash.
    #[must_use]
    pub fn verify_secret(&self, secret: &str) -> bool {
        hash_secret(secret, &self.salt) == self.secret_hash
    }
}

/// Salted, iterated SHA-256, hex-encoded.
#[must_use]
pub fn hash_secret(secret: &str, salt: &str) -> String {
    let mut digest = Sha256::new()
        .chain_update(salt.as_bytes())
        .chain_update(secret.as_bytes())
        .finalize();
    for _ in 1..HASH_ITERATIONS {
        digest = Sha256::digest(digest);
    }
    hex::encode(digest)
}

/// Local, synchronous registration checks. None of these touch the network.
///
/// # Errors
///
/// Returns `CredentialError` if the secret is too short or the confirmation
/// does not match.
pub fn validate_registration(secret: &str, confirmation: &str) -> Result<(), CredentialError> {
    if secret.len() < MIN_SECRET_LEN {
        return Err(CredentialError::SecretTooShort {
            min: MIN_SECRET_LEN,
        });
    }
    if secret != confirmation {
        return Err(CredentialError::ConfirmationMismatch);
    }
    Ok(())
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum CredentialError {
    #[error("secret must be at least {min} characters")]
    SecretTooShort { min: usize },

    #[error("secret confirmation does not match")]
    ConfirmationMismatch,
}
