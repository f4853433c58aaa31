use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use thiserror::Error;

use revise_core::model::{StudyItem, SubjectId};

/// Errors surfaced by content stores.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ContentError {
    #[error("content i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("content serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("concurrent access error: {0}")]
    Poisoned(String),
}

/// Read/write access to the per-subject study content.
///
/// Content is an ordered flat sequence per subject; there is no schema
/// versioning. This is an external collaborator to the sync core, kept
/// behind a trait so services and tests can swap backends.
pub trait ContentStore: Send + Sync {
    /// Load all items for a subject. A subject with no content yet loads
    /// as an empty sequence, not an error.
    ///
    /// # Errors
    ///
    /// Returns `ContentError` if the backing data cannot be read or parsed.
    fn load(&self, subject: &SubjectId) -> Result<Vec<StudyItem>, ContentError>;

    /// Replace the full sequence for a subject.
    ///
    /// # Errors
    ///
    /// Returns `ContentError` if the backing data cannot be written.
    fn save(&self, subject: &SubjectId, items: &[StudyItem]) -> Result<(), ContentError>;
}

/// Flat-file backend: one `{subject}.json` per subject under a data
/// directory.
#[derive(Debug, Clone)]
pub struct JsonContentStore {
    dir: PathBuf,
}

impl JsonContentStore {
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn file_for(&self, subject: &SubjectId) -> PathBuf {
        self.dir.join(format!("{}.json", subject.as_str()))
    }
}

impl ContentStore for JsonContentStore {
    fn load(&self, subject: &SubjectId) -> Result<Vec<StudyItem>, ContentError> {
        let path = self.file_for(subject);
        if !path.exists() {
            return Ok(Vec::new());
        }
        let raw = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    fn save(&self, subject: &SubjectId, items: &[StudyItem]) -> Result<(), ContentError> {
        std::fs::create_dir_all(&self.dir)?;
        let raw = serde_json::to_string_pretty(items)?;
        std::fs::write(self.file_for(subject), raw)?;
        Ok(())
    }
}

/// In-memory backend for tests and prototyping.
#[derive(Clone, Default)]
pub struct MemoryContentStore {
    subjects: Arc<Mutex<HashMap<String, Vec<StudyItem>>>>,
}

impl MemoryContentStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl ContentStore for MemoryContentStore {
    fn load(&self, subject: &SubjectId) -> Result<Vec<StudyItem>, ContentError> {
        let guard = self
            .subjects
            .lock()
            .map_err(|e| ContentError::Poisoned(e.to_string()))?;
        Ok(guard.get(subject.as_str()).cloned().unwrap_or_default())
    }

    fn save(&self, subject: &SubjectId, items: &[StudyItem]) -> Result<(), ContentError> {
        let mut guard = self
            .subjects
            .lock()
            .map_err(|e| ContentError::Poisoned(e.to_string()))?;
        guard.insert(subject.as_str().to_string(), items.to_vec());
        Ok(())
    }
}
