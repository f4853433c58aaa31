use std::sync::Arc;
use tracing::{debug, warn};

use revise_core::Clock;
use revise_core::model::{PointKey, ProgressSnapshot, UserId};
use storage::mapping;
use storage::paths::StorePaths;
use storage::store::DocumentStore;

use crate::error::SyncError;

/// Reconciles session-local mastery/difficulty sets with the remote
/// per-user progress collection.
///
/// `pull` is a full replace: the snapshot it returns is built from nothing
/// but the scanned records, so flags toggled off elsewhere drop out of the
/// sets. `push` is a field-level merge against a deterministic document id,
/// so repeated and concurrent pushes for the same point upsert the same
/// record and never clobber the flag they did not carry.
pub struct ProgressSyncService {
    store: Arc<dyn DocumentStore>,
    paths: StorePaths,
    clock: Clock,
}

impl ProgressSyncService {
    #[must_use]
    pub fn new(store: Arc<dyn DocumentStore>, paths: StorePaths, clock: Clock) -> Self {
        Self {
            store,
            paths,
            clock,
        }
    }

    /// Scan the user's whole progress collection into a fresh snapshot.
    ///
    /// Records that no longer decode are skipped with a warning: the cost
    /// of dropping one is a single re-toggle, not corruption. There is no
    /// isolation against writers racing the scan; the next pull observes
    /// whatever they wrote.
    ///
    /// # Errors
    ///
    /// Returns `SyncError` if the scan itself fails after the adapter's
    /// retry budget.
    pub async fn pull(&self, user: &UserId) -> Result<ProgressSnapshot, SyncError> {
        let collection = self.paths.progress_collection(user);
        let documents = self.store.stream_collection(&collection).await?;

        let mut snapshot = ProgressSnapshot::new();
        let mut skipped = 0_usize;
        for document in &documents {
            match mapping::progress_from_document(document) {
                Ok(point) => snapshot.absorb(&point),
                Err(err) => {
                    skipped += 1;
                    warn!(doc = %document.id, error = %err, "skipping malformed progress record");
                }
            }
        }
        debug!(
            user = %user,
            records = documents.len(),
            skipped,
            mastered = snapshot.mastered.len(),
            difficult = snapshot.difficult.len(),
            "pulled progress collection"
        );
        Ok(snapshot)
    }

    /// Merge-write one progress point, carrying only the supplied flags.
    ///
    /// # Errors
    ///
    /// Returns `SyncError` if the write fails after the adapter's retry
    /// budget. Callers on the review path log and continue; the next pull
    /// closes the gap.
    pub async fn push(
        &self,
        user: &UserId,
        key: &PointKey,
        mastered: Option<bool>,
        difficult: Option<bool>,
    ) -> Result<(), SyncError> {
        let fields = mapping::progress_update_fields(key, mastered, difficult, self.clock.now());
        let path = self.paths.progress_document(user, key);
        self.store.set_document(&path, fields, true).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use revise_core::model::SubjectId;
    use revise_core::time::fixed_clock;
    use serde_json::json;
    use storage::store::InMemoryStore;

    fn service(store: &InMemoryStore) -> ProgressSyncService {
        ProgressSyncService::new(
            Arc::new(store.clone()),
            StorePaths::new("revise-test"),
            fixed_clock(),
        )
    }

    fn alice() -> UserId {
        UserId::new("alice").unwrap()
    }

    fn point(title: &str) -> PointKey {
        PointKey::new(SubjectId::new("math").unwrap(), title)
    }

    #[tokio::test]
    async fn push_then_pull_round_trips() {
        let store = InMemoryStore::new();
        let sync = service(&store);

        sync.push(&alice(), &point("Derivatives"), Some(true), None)
            .await
            .unwrap();

        let snapshot = sync.pull(&alice()).await.unwrap();
        assert!(snapshot.mastered.contains("math_Derivatives"));
        assert!(snapshot.difficult.is_empty());
    }

    #[tokio::test]
    async fn repeated_pushes_address_one_record() {
        let store = InMemoryStore::new();
        let sync = service(&store);

        for _ in 0..3 {
            sync.push(&alice(), &point("Derivatives"), Some(true), None)
                .await
                .unwrap();
        }

        let paths = StorePaths::new("revise-test");
        let docs = store
            .stream_collection(&paths.progress_collection(&alice()))
            .await
            .unwrap();
        assert_eq!(docs.len(), 1);
    }

    #[tokio::test]
    async fn partial_push_preserves_the_other_flag() {
        let store = InMemoryStore::new();
        let sync = service(&store);

        sync.push(&alice(), &point("X"), None, Some(true))
            .await
            .unwrap();
        sync.push(&alice(), &point("X"), Some(true), None)
            .await
            .unwrap();

        let snapshot = sync.pull(&alice()).await.unwrap();
        assert!(snapshot.mastered.contains("math_X"));
        assert!(snapshot.difficult.contains("math_X"));
    }

    #[tokio::test]
    async fn pull_excludes_flags_toggled_off() {
        let store = InMemoryStore::new();
        let sync = service(&store);

        sync.push(&alice(), &point("X"), Some(true), None)
            .await
            .unwrap();
        sync.push(&alice(), &point("X"), Some(false), None)
            .await
            .unwrap();

        let snapshot = sync.pull(&alice()).await.unwrap();
        assert!(!snapshot.mastered.contains("math_X"));
    }

    #[tokio::test]
    async fn pull_skips_malformed_records() {
        let store = InMemoryStore::new();
        let sync = service(&store);
        let paths = StorePaths::new("revise-test");

        sync.push(&alice(), &point("Good"), Some(true), None)
            .await
            .unwrap();
        let mut broken = storage::store::FieldMap::new();
        broken.insert("is_mastered".into(), json!(1));
        store
            .set_document(
                &format!("{}/broken", paths.progress_collection(&alice())),
                broken,
                false,
            )
            .await
            .unwrap();

        let snapshot = sync.pull(&alice()).await.unwrap();
        assert_eq!(snapshot.mastered.len(), 1);
        assert!(snapshot.mastered.contains("math_Good"));
    }
}
