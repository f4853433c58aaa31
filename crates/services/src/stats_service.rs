use std::sync::Arc;

use storage::mapping;
use storage::paths::StorePaths;
use storage::store::DocumentStore;

use crate::error::StatsError;

/// Read side of the global counter.
///
/// The counter is only ever mutated through the store's atomic increment
/// during registration; this service never writes.
pub struct StatsService {
    store: Arc<dyn DocumentStore>,
    paths: StorePaths,
}

impl StatsService {
    #[must_use]
    pub fn new(store: Arc<dyn DocumentStore>, paths: StorePaths) -> Self {
        Self { store, paths }
    }

    /// Total registered users across the deployment; zero before the first
    /// registration ever writes the stats document.
    ///
    /// # Errors
    ///
    /// Returns `StatsError` if the stats document cannot be read.
    pub async fn user_count(&self) -> Result<i64, StatsError> {
        let fields = self
            .store
            .get_document(&self.paths.global_stats_document())
            .await?;
        Ok(fields
            .map(|fields| mapping::user_count_from_fields(&fields))
            .unwrap_or(0))
    }
}
