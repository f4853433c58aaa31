use std::path::PathBuf;
use std::sync::Arc;

use revise_core::Clock;
use storage::adapter::{RetryPolicy, RetryingStore};
use storage::config::ServiceAccount;
use storage::content::{ContentStore, JsonContentStore, MemoryContentStore};
use storage::http::HttpStore;
use storage::paths::StorePaths;
use storage::store::{DocumentStore, InMemoryStore};

use crate::auth_service::{AuthService, BootstrapAdmin};
use crate::content_service::ContentService;
use crate::error::AppServicesError;
use crate::session_service::SessionManager;
use crate::stats_service::StatsService;
use crate::sync_service::ProgressSyncService;

/// Assembles the app-facing services over one document store.
///
/// The raw store is wrapped in the retrying adapter exactly once here, so
/// every service call shares the same timeout/retry budget and no call
/// site grows its own retry loop.
#[derive(Clone)]
pub struct AppServices {
    session: Arc<SessionManager>,
    auth: Arc<AuthService>,
    sync: Arc<ProgressSyncService>,
    stats: Arc<StatsService>,
    content: Arc<ContentService>,
}

impl AppServices {
    #[must_use]
    pub fn new(
        store: Arc<dyn DocumentStore>,
        content: Arc<dyn ContentStore>,
        clock: Clock,
        app_id: impl Into<String>,
        policy: RetryPolicy,
        bootstrap: Option<BootstrapAdmin>,
    ) -> Self {
        let store: Arc<dyn DocumentStore> = Arc::new(RetryingStore::new(store, policy));
        let paths = StorePaths::new(app_id);

        let mut auth = AuthService::new(Arc::clone(&store), paths.clone(), clock);
        if let Some(gate) = bootstrap {
            auth = auth.with_bootstrap(gate);
        }
        let auth = Arc::new(auth);
        let sync = Arc::new(ProgressSyncService::new(
            Arc::clone(&store),
            paths.clone(),
            clock,
        ));
        let session = Arc::new(SessionManager::new(Arc::clone(&auth), Arc::clone(&sync)));
        let stats = Arc::new(StatsService::new(Arc::clone(&store), paths));
        let content = Arc::new(ContentService::new(content));

        Self {
            session,
            auth,
            sync,
            stats,
            content,
        }
    }

    /// Build services backed by the HTTP document gateway and flat-file
    /// content.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if the credential bundle fails validation.
    pub fn new_http(
        account: &ServiceAccount,
        content_dir: impl Into<PathBuf>,
        clock: Clock,
        app_id: impl Into<String>,
        policy: RetryPolicy,
        bootstrap: Option<BootstrapAdmin>,
    ) -> Result<Self, AppServicesError> {
        let store = Arc::new(HttpStore::new(account)?);
        let content = Arc::new(JsonContentStore::new(content_dir));
        Ok(Self::new(store, content, clock, app_id, policy, bootstrap))
    }

    /// Fully in-memory wiring for tests and prototyping.
    #[must_use]
    pub fn in_memory(app_id: impl Into<String>) -> Self {
        Self::new(
            Arc::new(InMemoryStore::new()),
            Arc::new(MemoryContentStore::new()),
            Clock::default_clock(),
            app_id,
            RetryPolicy::default(),
            None,
        )
    }

    #[must_use]
    pub fn session(&self) -> Arc<SessionManager> {
        Arc::clone(&self.session)
    }

    #[must_use]
    pub fn auth(&self) -> Arc<AuthService> {
        Arc::clone(&self.auth)
    }

    #[must_use]
    pub fn sync(&self) -> Arc<ProgressSyncService> {
        Arc::clone(&self.sync)
    }

    #[must_use]
    pub fn stats(&self) -> Arc<StatsService> {
        Arc::clone(&self.stats)
    }

    #[must_use]
    pub fn content(&self) -> Arc<ContentService> {
        Arc::clone(&self.content)
    }
}
