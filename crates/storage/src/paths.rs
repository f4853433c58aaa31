use revise_core::model::{PointKey, UserId};

/// The fixed hierarchical path scheme of the remote store.
///
/// Per-user progress lives under the user's own subtree; credentials and
/// the global counter live under the public data area. Everything is rooted
/// at `artifacts/{app_id}` so several deployments can share one store.
#[derive(Debug, Clone)]
pub struct StorePaths {
    app_id: String,
}

impl StorePaths {
    #[must_use]
    pub fn new(app_id: impl Into<String>) -> Self {
        Self {
            app_id: app_id.into(),
        }
    }

    #[must_use]
    pub fn app_id(&self) -> &str {
        &self.app_id
    }

    /// `artifacts/{app}/users/{user}/progress`
    #[must_use]
    pub fn progress_collection(&self, user: &UserId) -> String {
        format!("artifacts/{}/users/{}/progress", self.app_id, user)
    }

    /// `artifacts/{app}/users/{user}/progress/{doc_id}`
    #[must_use]
    pub fn progress_document(&self, user: &UserId, key: &PointKey) -> String {
        format!("{}/{}", self.progress_collection(user), key.doc_id())
    }

    /// `artifacts/{app}/public/data/users/{user}`
    #[must_use]
    pub fn credentials_document(&self, user: &UserId) -> String {
        format!("artifacts/{}/public/data/users/{}", self.app_id, user)
    }

    /// `artifacts/{app}/public/data/stats/global`
    #[must_use]
    pub fn global_stats_document(&self) -> String {
        format!("artifacts/{}/public/data/stats/global", self.app_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use revise_core::model::SubjectId;

    #[test]
    fn paths_follow_the_store_scheme() {
        let paths = StorePaths::new("revise-prod");
        let alice = UserId::new("alice").unwrap();

        assert_eq!(
            paths.progress_collection(&alice),
            "artifacts/revise-prod/users/alice/progress"
        );
        assert_eq!(
            paths.credentials_document(&alice),
            "artifacts/revise-prod/public/data/users/alice"
        );
        assert_eq!(
            paths.global_stats_document(),
            "artifacts/revise-prod/public/data/stats/global"
        );
    }

    #[test]
    fn progress_document_embeds_the_stable_id() {
        let paths = StorePaths::new("revise-prod");
        let alice = UserId::new("alice").unwrap();
        let key = PointKey::new(SubjectId::new("math").unwrap(), "Derivatives");

        let path = paths.progress_document(&alice, &key);
        assert!(path.ends_with(&key.doc_id()));
        assert_eq!(path, paths.progress_document(&alice, &key));
    }
}
