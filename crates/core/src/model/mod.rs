mod ids;
mod progress;
mod session;
mod study_item;
mod user;

pub use ids::{IdError, SubjectId, UserId};
pub use progress::{PointKey, ProgressPoint, ProgressSnapshot};
pub use session::{SessionContext, SessionPhase, SessionStateError};
pub use study_item::{DEFAULT_CHAPTER, StudyItem, StudyItemError};
pub use user::{
    CredentialError, MIN_SECRET_LEN, UserRecord, hash_secret, validate_registration,
};
