use thiserror::Error;

use crate::model::{CredentialError, IdError, SessionStateError, StudyItemError};

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Id(#[from] IdError),
    #[error(transparent)]
    Credential(#[from] CredentialError),
    #[error(transparent)]
    SessionState(#[from] SessionStateError),
    #[error(transparent)]
    StudyItem(#[from] StudyItemError),
}
