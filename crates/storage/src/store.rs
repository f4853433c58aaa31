use async_trait::async_trait;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Field map of one remote document.
pub type FieldMap = serde_json::Map<String, Value>;

/// A document returned by a collection scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub id: String,
    pub fields: FieldMap,
}

/// Errors surfaced by document-store implementations.
///
/// `is_transient` is the single retry predicate: transient classifications
/// may be retried by the adapter, everything else is terminal and must
/// surface immediately.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("deadline exceeded")]
    DeadlineExceeded,

    #[error("retry budget exhausted after {attempts} attempts")]
    RetryExhausted {
        attempts: u32,
        #[source]
        source: Box<StoreError>,
    },

    #[error("permission denied: {0}")]
    PermissionDenied(String),

    #[error("not found")]
    NotFound,

    #[error("malformed document: {0}")]
    Malformed(String),
}

impl StoreError {
    /// True for the failures the retry loop is allowed to absorb.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            StoreError::Unavailable(_)
                | StoreError::DeadlineExceeded
                | StoreError::RetryExhausted { .. }
        )
    }
}

/// Contract for the remote document store.
///
/// Paths are hierarchical (`a/b/c/d`); documents live at even depth inside
/// collections at odd depth, mirroring the remote layout. `merge = true`
/// performs a field-level upsert: supplied fields overwrite, absent fields
/// on the existing record survive.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Fetch a single document, `None` if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` on transport or authorization failure.
    async fn get_document(&self, path: &str) -> Result<Option<FieldMap>, StoreError>;

    /// Write a document. With `merge`, only the supplied fields change.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` on transport or authorization failure.
    async fn set_document(
        &self,
        path: &str,
        fields: FieldMap,
        merge: bool,
    ) -> Result<(), StoreError>;

    /// One-shot scan of a collection's direct documents. Not restartable;
    /// re-issue the call to scan again.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` on transport or authorization failure.
    async fn stream_collection(&self, path: &str) -> Result<Vec<Document>, StoreError>;

    /// Atomically add `by` to an integer field, creating the document and
    /// the field as needed. Returns the new value. Never read-modify-write
    /// from the caller's side.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` on transport or authorization failure.
    async fn atomic_increment(&self, path: &str, field: &str, by: i64)
    -> Result<i64, StoreError>;
}

/// In-memory store for tests and prototyping.
///
/// Documents are keyed by full path in a `BTreeMap` so collection scans are
/// deterministic. All operations, including the increment, run under one
/// mutex, which gives the same atomicity the remote primitive guarantees.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    documents: Arc<Mutex<BTreeMap<String, FieldMap>>>,
}

impl InMemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, BTreeMap<String, FieldMap>>, StoreError> {
        self.documents
            .lock()
            .map_err(|e| StoreError::Unavailable(e.to_string()))
    }
}

#[async_trait]
impl DocumentStore for InMemoryStore {
    async fn get_document(&self, path: &str) -> Result<Option<FieldMap>, StoreError> {
        let guard = self.lock()?;
        Ok(guard.get(path).cloned())
    }

    async fn set_document(
        &self,
        path: &str,
        fields: FieldMap,
        merge: bool,
    ) -> Result<(), StoreError> {
        let mut guard = self.lock()?;
        match guard.get_mut(path) {
            Some(existing) if merge => {
                for (name, value) in fields {
                    existing.insert(name, value);
                }
            }
            _ => {
                guard.insert(path.to_string(), fields);
            }
        }
        Ok(())
    }

    async fn stream_collection(&self, path: &str) -> Result<Vec<Document>, StoreError> {
        let prefix = format!("{path}/");
        let guard = self.lock()?;
        let documents = guard
            .range(prefix.clone()..)
            .take_while(|(key, _)| key.starts_with(&prefix))
            .filter(|(key, _)| !key[prefix.len()..].contains('/'))
            .map(|(key, fields)| Document {
                id: key[prefix.len()..].to_string(),
                fields: fields.clone(),
            })
            .collect();
        Ok(documents)
    }

    async fn atomic_increment(
        &self,
        path: &str,
        field: &str,
        by: i64,
    ) -> Result<i64, StoreError> {
        let mut guard = self.lock()?;
        let fields = guard.entry(path.to_string()).or_default();
        let current = fields.get(field).and_then(Value::as_i64).unwrap_or(0);
        let next = current + by;
        fields.insert(field.to_string(), Value::from(next));
        Ok(next)
    }
}
