use async_trait::async_trait;
use serde_json::json;
use std::sync::Arc;

use revise_core::model::{PointKey, SessionContext, SubjectId, UserId};
use revise_core::time::fixed_clock;
use services::{AppServices, AuthService, ProgressSyncService, SessionManager};
use storage::paths::StorePaths;
use storage::store::{Document, DocumentStore, FieldMap, InMemoryStore, StoreError};

fn user(id: &str) -> UserId {
    UserId::new(id).unwrap()
}

fn math() -> SubjectId {
    SubjectId::new("math").unwrap()
}

async fn active_session(app: &AppServices, id: &str) -> SessionContext {
    app.auth()
        .register(&user(id), "secret99", "secret99")
        .await
        .unwrap();
    let mut ctx = SessionContext::new();
    app.session()
        .login(&mut ctx, user(id), "secret99")
        .await
        .unwrap();
    app.session().acknowledge(&mut ctx).unwrap();
    ctx
}

#[tokio::test]
async fn toggling_off_survives_a_fresh_session() {
    let app = AppServices::in_memory("revise-test");
    let mut ctx = active_session(&app, "alice").await;

    app.session()
        .set_mastered(&mut ctx, math(), "Derivatives", true)
        .await
        .unwrap();
    app.session()
        .set_mastered(&mut ctx, math(), "Derivatives", false)
        .await
        .unwrap();
    app.session().logout(&mut ctx);

    // A fresh session for the same user pulls from the store.
    let mut fresh = SessionContext::new();
    app.session()
        .login(&mut fresh, user("alice"), "secret99")
        .await
        .unwrap();
    assert!(!fresh.mastered().contains("math_Derivatives"));
}

#[tokio::test]
async fn flags_from_different_devices_do_not_clobber_each_other() {
    let store = InMemoryStore::new();
    let content = Arc::new(storage::content::MemoryContentStore::new());
    // Two app instances over one store stand in for two devices.
    let device_a = AppServices::new(
        Arc::new(store.clone()),
        content.clone(),
        fixed_clock(),
        "revise-test",
        storage::adapter::RetryPolicy::default(),
        None,
    );
    let device_b = AppServices::new(
        Arc::new(store),
        content,
        fixed_clock(),
        "revise-test",
        storage::adapter::RetryPolicy::default(),
        None,
    );

    let mut ctx_a = active_session(&device_a, "alice").await;
    let mut ctx_b = SessionContext::new();
    device_b
        .session()
        .login(&mut ctx_b, user("alice"), "secret99")
        .await
        .unwrap();
    device_b.session().acknowledge(&mut ctx_b).unwrap();

    device_a
        .session()
        .set_mastered(&mut ctx_a, math(), "X", true)
        .await
        .unwrap();
    device_b
        .session()
        .set_difficult(&mut ctx_b, math(), "X", true)
        .await
        .unwrap();

    device_a.session().refresh(&mut ctx_a).await.unwrap();
    assert!(ctx_a.mastered().contains("math_X"));
    assert!(ctx_a.difficult().contains("math_X"));
}

#[tokio::test]
async fn refresh_replaces_instead_of_unioning() {
    let store = InMemoryStore::new();
    let app = AppServices::new(
        Arc::new(store.clone()),
        Arc::new(storage::content::MemoryContentStore::new()),
        fixed_clock(),
        "revise-test",
        storage::adapter::RetryPolicy::default(),
        None,
    );
    let mut ctx = active_session(&app, "alice").await;

    app.session()
        .set_mastered(&mut ctx, math(), "X", true)
        .await
        .unwrap();

    // Another device toggles the same flag off, writing straight to the
    // shared store.
    let key = PointKey::new(math(), "X");
    let path = StorePaths::new("revise-test").progress_document(&user("alice"), &key);
    let mut fields = FieldMap::new();
    fields.insert("is_mastered".into(), json!(0));
    store.set_document(&path, fields, true).await.unwrap();

    app.session().refresh(&mut ctx).await.unwrap();
    assert!(!ctx.mastered().contains("math_X"));
}

/// Store double whose writes always fail while reads keep working.
#[derive(Clone)]
struct ReadOnlyStore {
    inner: InMemoryStore,
}

#[async_trait]
impl DocumentStore for ReadOnlyStore {
    async fn get_document(&self, path: &str) -> Result<Option<FieldMap>, StoreError> {
        self.inner.get_document(path).await
    }

    async fn set_document(
        &self,
        _path: &str,
        _fields: FieldMap,
        _merge: bool,
    ) -> Result<(), StoreError> {
        Err(StoreError::Unavailable("write path down".into()))
    }

    async fn stream_collection(&self, path: &str) -> Result<Vec<Document>, StoreError> {
        self.inner.stream_collection(path).await
    }

    async fn atomic_increment(
        &self,
        _path: &str,
        _field: &str,
        _by: i64,
    ) -> Result<i64, StoreError> {
        Err(StoreError::Unavailable("write path down".into()))
    }
}

#[tokio::test]
async fn a_failed_push_is_swallowed_and_marks_the_session_unsynced() {
    let healthy = InMemoryStore::new();
    let paths = StorePaths::new("revise-test");

    // Credentials live on the healthy store; the progress write path is down.
    let auth = Arc::new(AuthService::new(
        Arc::new(healthy.clone()) as Arc<dyn DocumentStore>,
        paths.clone(),
        fixed_clock(),
    ));
    auth.register(&user("alice"), "secret99", "secret99")
        .await
        .unwrap();

    let flaky = ReadOnlyStore { inner: healthy };
    let sync = Arc::new(ProgressSyncService::new(
        Arc::new(flaky) as Arc<dyn DocumentStore>,
        paths,
        fixed_clock(),
    ));
    let manager = SessionManager::new(auth, sync);

    let mut ctx = SessionContext::new();
    manager
        .login(&mut ctx, user("alice"), "secret99")
        .await
        .unwrap();
    manager.acknowledge(&mut ctx).unwrap();
    assert!(ctx.is_synced());

    // The toggle itself must succeed even though the push cannot land.
    let applied = manager
        .set_mastered(&mut ctx, math(), "Derivatives", true)
        .await
        .unwrap();
    assert!(applied);
    assert!(ctx.mastered().contains("math_Derivatives"));
    assert!(!ctx.is_synced());
}

#[tokio::test]
async fn toggles_require_an_active_session() {
    let app = AppServices::in_memory("revise-test");
    app.auth()
        .register(&user("alice"), "secret99", "secret99")
        .await
        .unwrap();

    let mut ctx = SessionContext::new();
    app.session()
        .login(&mut ctx, user("alice"), "secret99")
        .await
        .unwrap();

    // Still link-pending: the review surface is gated.
    let err = app
        .session()
        .set_mastered(&mut ctx, math(), "X", true)
        .await
        .unwrap_err();
    assert!(matches!(err, services::SessionError::NotActive));
}

#[tokio::test]
async fn logout_clears_session_state() {
    let app = AppServices::in_memory("revise-test");
    let mut ctx = active_session(&app, "alice").await;

    app.session()
        .set_mastered(&mut ctx, math(), "X", true)
        .await
        .unwrap();
    app.session().logout(&mut ctx);

    assert!(ctx.mastered().is_empty());
    assert!(ctx.user().is_none());
}
