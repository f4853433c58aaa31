use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Characters that would corrupt a store path if they appeared in an id.
const FORBIDDEN: &[char] = &['/', '\u{0}'];

fn validate_segment(kind: &'static str, raw: &str) -> Result<(), IdError> {
    if raw.trim().is_empty() {
        return Err(IdError::Empty { kind });
    }
    if raw.chars().any(|c| FORBIDDEN.contains(&c)) {
        return Err(IdError::ForbiddenCharacter { kind });
    }
    Ok(())
}

/// Unique, case-sensitive identifier for a registered user.
///
/// User ids are embedded verbatim in remote store paths, so they must be
/// non-empty and free of path separators. No other normalization is applied:
/// `Alice` and `alice` are distinct users.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    /// Create a validated `UserId`.
    ///
    /// # Errors
    ///
    /// Returns `IdError` if the value is empty or contains a path separator.
    pub fn new(value: impl Into<String>) -> Result<Self, IdError> {
        let raw = value.into();
        validate_segment("UserId", &raw)?;
        Ok(Self(raw))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Identifier for a subject (e.g. `math`, `physics`).
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubjectId(String);

impl SubjectId {
    /// Create a validated `SubjectId`.
    ///
    /// # Errors
    ///
    /// Returns `IdError` if the value is empty or contains a path separator.
    pub fn new(value: impl Into<String>) -> Result<Self, IdError> {
        let raw = value.into();
        validate_segment("SubjectId", &raw)?;
        Ok(Self(raw))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum IdError {
    #[error("{kind} cannot be empty")]
    Empty { kind: &'static str },

    #[error("{kind} contains a forbidden character")]
    ForbiddenCharacter { kind: &'static str },
}

impl fmt::Debug for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "UserId({})", self.0)
    }
}

impl fmt::Debug for SubjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SubjectId({})", self.0)
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for SubjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for UserId {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        UserId::new(s)
    }
}

impl FromStr for SubjectId {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SubjectId::new(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_id_is_case_sensitive() {
        let upper = UserId::new("Alice").unwrap();
        let lower = UserId::new("alice").unwrap();
        assert_ne!(upper, lower);
    }

    #[test]
    fn rejects_empty_and_blank() {
        assert!(matches!(UserId::new(""), Err(IdError::Empty { .. })));
        assert!(matches!(SubjectId::new("   "), Err(IdError::Empty { .. })));
    }

    #[test]
    fn rejects_path_separator() {
        let result = UserId::new("alice/progress");
        assert!(matches!(result, Err(IdError::ForbiddenCharacter { .. })));
    }

    #[test]
    fn subject_id_round_trips_through_str() {
        let id: SubjectId = "math".parse().unwrap();
        assert_eq!(id.as_str(), "math");
        assert_eq!(id.to_string(), "math");
    }
}
