use rand::RngCore;
use std::sync::Arc;
use tracing::{debug, warn};

use revise_core::Clock;
use revise_core::model::{UserId, UserRecord, validate_registration};
use storage::mapping;
use storage::paths::StorePaths;
use storage::store::DocumentStore;

use crate::error::AuthError;

/// Salt byte length for secret hashing.
const SALT_BYTES: usize = 16;

/// One-time setup gate for the reserved administrative identifier.
///
/// When present, a login attempt for exactly this identifier with exactly
/// this secret is auto-provisioned if no credential record exists yet.
/// Deployments that have completed setup run without a gate, which
/// disables the path entirely.
#[derive(Debug, Clone)]
pub struct BootstrapAdmin {
    pub identifier: UserId,
    pub secret: String,
}

/// Credential registration and verification against the remote store.
pub struct AuthService {
    store: Arc<dyn DocumentStore>,
    paths: StorePaths,
    clock: Clock,
    bootstrap: Option<BootstrapAdmin>,
}

impl AuthService {
    #[must_use]
    pub fn new(store: Arc<dyn DocumentStore>, paths: StorePaths, clock: Clock) -> Self {
        Self {
            store,
            paths,
            clock,
            bootstrap: None,
        }
    }

    /// Enable the setup-mode bootstrap gate.
    #[must_use]
    pub fn with_bootstrap(mut self, gate: BootstrapAdmin) -> Self {
        self.bootstrap = Some(gate);
        self
    }

    /// Register a new user.
    ///
    /// Local validation runs before any network call. The duplicate check
    /// precedes the write, and the global counter is only incremented after
    /// a successful credential write, so a rejected registration never
    /// moves the counter.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Validation` for local policy failures,
    /// `AuthError::DuplicateIdentifier` if the id is taken, or a store
    /// error from the underlying writes.
    pub async fn register(
        &self,
        user: &UserId,
        secret: &str,
        confirmation: &str,
    ) -> Result<(), AuthError> {
        validate_registration(secret, confirmation)?;

        let path = self.paths.credentials_document(user);
        if self.store.get_document(&path).await?.is_some() {
            return Err(AuthError::DuplicateIdentifier);
        }

        self.provision(secret, &path).await?;
        debug!(user = %user, "registered new user");
        Ok(())
    }

    /// Verify a login attempt.
    ///
    /// Unknown identifier and wrong secret collapse into the same
    /// authorization error. A missing record may instead take the
    /// bootstrap path when the gate is configured.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` on verification failure, or
    /// a store error from the lookup.
    pub async fn verify(&self, user: &UserId, secret: &str) -> Result<(), AuthError> {
        let path = self.paths.credentials_document(user);
        match self.store.get_document(&path).await? {
            Some(fields) => {
                let record = mapping::user_record_from_fields(&fields)?;
                if record.verify_secret(secret) {
                    Ok(())
                } else {
                    Err(AuthError::InvalidCredentials)
                }
            }
            None => self.try_bootstrap(user, secret, &path).await,
        }
    }

    async fn try_bootstrap(
        &self,
        user: &UserId,
        secret: &str,
        path: &str,
    ) -> Result<(), AuthError> {
        let Some(gate) = &self.bootstrap else {
            return Err(AuthError::InvalidCredentials);
        };
        if gate.identifier != *user || gate.secret != secret {
            return Err(AuthError::InvalidCredentials);
        }

        warn!(user = %user, "auto-provisioning bootstrap administrator");
        self.provision(secret, path).await?;
        Ok(())
    }

    async fn provision(&self, secret: &str, path: &str) -> Result<(), AuthError> {
        let record = UserRecord::new(secret, &generate_salt(), self.clock.now());
        self.store
            .set_document(path, mapping::user_record_fields(&record), false)
            .await?;
        self.store
            .atomic_increment(
                &self.paths.global_stats_document(),
                mapping::FIELD_USER_COUNT,
                1,
            )
            .await?;
        Ok(())
    }
}

fn generate_salt() -> String {
    let mut salt = [0_u8; SALT_BYTES];
    rand::rng().fill_bytes(&mut salt);
    hex::encode(salt)
}
