use std::sync::Arc;
use tracing::warn;

use revise_core::model::{PointKey, SessionContext, SubjectId, UserId};

use crate::auth_service::AuthService;
use crate::error::SessionError;
use crate::sync_service::ProgressSyncService;

/// Drives the session lifecycle and routes mutations into the synchronizer.
///
/// All session state lives in the caller-owned [`SessionContext`]; the
/// manager itself is stateless and shareable. Every method that touches the
/// network is a blocking point bounded by the adapter's retry budget;
/// schedule them behind a loading indicator, not on a latency-sensitive
/// path.
pub struct SessionManager {
    auth: Arc<AuthService>,
    sync: Arc<ProgressSyncService>,
}

/// One flag mutation; exactly one flag travels per push.
#[derive(Debug, Clone, Copy)]
enum Toggle {
    Mastered(bool),
    Difficult(bool),
}

impl SessionManager {
    #[must_use]
    pub fn new(auth: Arc<AuthService>, sync: Arc<ProgressSyncService>) -> Self {
        Self { auth, sync }
    }

    /// Authenticate and run the covering pull.
    ///
    /// On verification failure the context returns to `LoggedOut` and the
    /// error surfaces. On success the context reaches `LinkPending`; a
    /// failed covering pull is only a warning, and the session starts with
    /// empty, unsynced sets until the next successful pull closes the gap.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Auth` on verification failure, or a state
    /// error if the context is not logged out.
    pub async fn login(
        &self,
        ctx: &mut SessionContext,
        user: UserId,
        secret: &str,
    ) -> Result<(), SessionError> {
        ctx.begin_authentication(user.clone())?;

        if let Err(err) = self.auth.verify(&user, secret).await {
            ctx.authentication_failed();
            return Err(SessionError::Auth(err));
        }
        ctx.mark_authenticated()?;

        match self.sync.pull(&user).await {
            Ok(snapshot) => ctx.replace_progress(snapshot),
            Err(err) => {
                ctx.mark_unsynced();
                warn!(user = %user, error = %err, "covering pull failed; session starts unsynced");
            }
        }
        Ok(())
    }

    /// Explicit user acknowledgement: `LinkPending → Active`.
    ///
    /// # Errors
    ///
    /// Returns a state error unless the session is link-pending.
    pub fn acknowledge(&self, ctx: &mut SessionContext) -> Result<(), SessionError> {
        ctx.acknowledge()?;
        Ok(())
    }

    /// Set the mastery flag for one point. Returns the applied flag.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NotActive` outside the active phase. Push
    /// failures never surface here.
    pub async fn set_mastered(
        &self,
        ctx: &mut SessionContext,
        subject: SubjectId,
        title: &str,
        mastered: bool,
    ) -> Result<bool, SessionError> {
        self.apply_toggle(ctx, subject, title, Toggle::Mastered(mastered))
            .await
    }

    /// Set the difficulty flag for one point. Returns the applied flag.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NotActive` outside the active phase. Push
    /// failures never surface here.
    pub async fn set_difficult(
        &self,
        ctx: &mut SessionContext,
        subject: SubjectId,
        title: &str,
        difficult: bool,
    ) -> Result<bool, SessionError> {
        self.apply_toggle(ctx, subject, title, Toggle::Difficult(difficult))
            .await
    }

    async fn apply_toggle(
        &self,
        ctx: &mut SessionContext,
        subject: SubjectId,
        title: &str,
        toggle: Toggle,
    ) -> Result<bool, SessionError> {
        if !ctx.phase().is_active() {
            return Err(SessionError::NotActive);
        }
        let user = ctx.user().cloned().ok_or(SessionError::NotLoggedIn)?;

        let key = PointKey::new(subject, title);
        let set_key = key.key();
        let (applied, mastered, difficult) = match toggle {
            Toggle::Mastered(flag) => (ctx.set_mastered(&set_key, flag), Some(flag), None),
            Toggle::Difficult(flag) => (ctx.set_difficult(&set_key, flag), None, Some(flag)),
        };

        // Local state is already updated; a failed push widens the
        // eventual-consistency gap until the next pull, nothing more.
        if let Err(err) = self.sync.push(&user, &key, mastered, difficult).await {
            ctx.mark_unsynced();
            warn!(user = %user, key = %set_key, error = %err,
                "progress push failed; keeping optimistic local state");
        }
        Ok(applied)
    }

    /// Re-pull and replace the session's sets.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Sync` if the pull fails; the caller keeps the
    /// stale sets in that case.
    pub async fn refresh(&self, ctx: &mut SessionContext) -> Result<(), SessionError> {
        let user = ctx.user().cloned().ok_or(SessionError::NotLoggedIn)?;
        let snapshot = self.sync.pull(&user).await.map_err(SessionError::Sync)?;
        ctx.replace_progress(snapshot);
        Ok(())
    }

    /// Destroy all session-local state. Legal from any phase.
    pub fn logout(&self, ctx: &mut SessionContext) {
        ctx.reset();
    }
}
