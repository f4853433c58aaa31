use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};
use std::collections::HashSet;

use crate::model::SubjectId;

/// Composite key for a study point: one subject + one item title.
///
/// The key string and the document id derived from it are pure functions of
/// `(subject, title)`. Every toggle of the same point addresses the same
/// remote record, so repeated pushes upsert instead of accumulating
/// duplicates.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PointKey {
    subject: SubjectId,
    title: String,
}

impl PointKey {
    #[must_use]
    pub fn new(subject: SubjectId, title: impl Into<String>) -> Self {
        Self {
            subject,
            title: title.into(),
        }
    }

    #[must_use]
    pub fn subject(&self) -> &SubjectId {
        &self.subject
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// The session-local set key, `{subject}_{title}`.
    #[must_use]
    pub fn key(&self) -> String {
        format!("{}_{}", self.subject.as_str(), self.title)
    }

    /// Stable remote document id: lowercase hex SHA-256 of `key()`.
    #[must_use]
    pub fn doc_id(&self) -> String {
        let digest = Sha256::digest(self.key().as_bytes());
        hex::encode(digest)
    }
}

/// One user's remembered state for a single study point.
///
/// Both flags are tri-state: `None` means the flag was never written for
/// this record. The 0/1 wire encoding lives in the storage layer, not here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressPoint {
    pub key: PointKey,
    pub mastered: Option<bool>,
    pub difficult: Option<bool>,
    pub updated_at: DateTime<Utc>,
}

impl ProgressPoint {
    #[must_use]
    pub fn new(key: PointKey, updated_at: DateTime<Utc>) -> Self {
        Self {
            key,
            mastered: None,
            difficult: None,
            updated_at,
        }
    }
}

/// The two key sets a full pull rebuilds.
///
/// A snapshot always replaces prior session state wholesale. Folding is
/// strict: only an explicit `mastered == true` lands in the mastered set, so
/// a record whose flag was toggled off drops out on the next pull.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProgressSnapshot {
    pub mastered: HashSet<String>,
    pub difficult: HashSet<String>,
}

impl ProgressSnapshot {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one remote record into the snapshot.
    pub fn absorb(&mut self, point: &ProgressPoint) {
        let key = point.key.key();
        if point.mastered == Some(true) {
            self.mastered.insert(key.clone());
        }
        if point.difficult == Some(true) {
            self.difficult.insert(key);
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.mastered.is_empty() && self.difficult.is_empty()
    }
}
