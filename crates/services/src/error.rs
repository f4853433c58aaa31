//! Shared error types for the services crate.

use thiserror::Error;

use revise_core::model::{CredentialError, SessionStateError, StudyItemError};
use storage::config::ConfigError;
use storage::content::ContentError;
use storage::mapping::MappingError;
use storage::store::StoreError;

/// Errors emitted by `ProgressSyncService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SyncError {
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl SyncError {
    /// True when a retry of the whole operation could still succeed.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            SyncError::Store(err) => err.is_transient(),
        }
    }
}

/// Errors emitted by `AuthService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AuthError {
    #[error(transparent)]
    Validation(#[from] CredentialError),

    #[error("identifier is already registered")]
    DuplicateIdentifier,

    #[error("unknown identifier or wrong secret")]
    InvalidCredentials,

    #[error("stored credential record is malformed: {0}")]
    MalformedRecord(#[from] MappingError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Errors emitted by `SessionManager`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SessionError {
    #[error("no user is logged in")]
    NotLoggedIn,

    #[error("session is not in the active phase")]
    NotActive,

    #[error(transparent)]
    State(#[from] SessionStateError),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Sync(#[from] SyncError),
}

/// Errors emitted by `StatsService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StatsError {
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Errors emitted by `ContentService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ContentServiceError {
    #[error(transparent)]
    Item(#[from] StudyItemError),

    #[error(transparent)]
    Content(#[from] ContentError),
}

/// Errors emitted while bootstrapping app services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error(transparent)]
    Config(#[from] ConfigError),
}
