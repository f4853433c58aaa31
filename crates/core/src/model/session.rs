use std::collections::HashSet;
use thiserror::Error;

use crate::model::{ProgressSnapshot, UserId};

/// Lifecycle phase of one interactive session.
///
/// `LoggedOut → Authenticating → LinkPending → Active`, with logout legal
/// from every phase. `LinkPending` is the user-acknowledged gate between a
/// successful login and the review surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    LoggedOut,
    Authenticating,
    LinkPending,
    Active,
}

impl SessionPhase {
    #[must_use]
    pub fn is_active(&self) -> bool {
        matches!(self, SessionPhase::Active)
    }

    fn name(&self) -> &'static str {
        match self {
            SessionPhase::LoggedOut => "LoggedOut",
            SessionPhase::Authenticating => "Authenticating",
            SessionPhase::LinkPending => "LinkPending",
            SessionPhase::Active => "Active",
        }
    }
}

/// Process-local, ephemeral state for the active session.
///
/// Owned exclusively by one session and passed `&mut` through the session
/// manager; it is never shared across users or processes. The two key sets
/// are rebuilt wholesale from the remote store on login and cleared on
/// logout.
#[derive(Debug, Clone)]
pub struct SessionContext {
    phase: SessionPhase,
    user: Option<UserId>,
    mastered: HashSet<String>,
    difficult: HashSet<String>,
    synced: bool,
}

impl SessionContext {
    #[must_use]
    pub fn new() -> Self {
        Self {
            phase: SessionPhase::LoggedOut,
            user: None,
            mastered: HashSet::new(),
            difficult: HashSet::new(),
            synced: false,
        }
    }

    #[must_use]
    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    #[must_use]
    pub fn user(&self) -> Option<&UserId> {
        self.user.as_ref()
    }

    /// True when local state is known to match the last remote observation.
    /// Cleared whenever a push is swallowed, restored by a successful pull.
    #[must_use]
    pub fn is_synced(&self) -> bool {
        self.synced
    }

    #[must_use]
    pub fn mastered(&self) -> &HashSet<String> {
        &self.mastered
    }

    #[must_use]
    pub fn difficult(&self) -> &HashSet<String> {
        &self.difficult
    }

    /// `LoggedOut → Authenticating`, recording the candidate identity.
    ///
    /// # Errors
    ///
    /// Returns `SessionStateError` unless the session is logged out.
    pub fn begin_authentication(&mut self, user: UserId) -> Result<(), SessionStateError> {
        self.expect_phase(SessionPhase::LoggedOut, SessionPhase::Authenticating)?;
        self.phase = SessionPhase::Authenticating;
        self.user = Some(user);
        Ok(())
    }

    /// `Authenticating → LinkPending` after credential verification.
    ///
    /// # Errors
    ///
    /// Returns `SessionStateError` unless the session is authenticating.
    pub fn mark_authenticated(&mut self) -> Result<(), SessionStateError> {
        self.expect_phase(SessionPhase::Authenticating, SessionPhase::LinkPending)?;
        self.phase = SessionPhase::LinkPending;
        Ok(())
    }

    /// Failed verification: back to `LoggedOut`, identity discarded.
    pub fn authentication_failed(&mut self) {
        self.reset();
    }

    /// `LinkPending → Active` on explicit user acknowledgement.
    ///
    /// # Errors
    ///
    /// Returns `SessionStateError` unless the session is link-pending.
    pub fn acknowledge(&mut self) -> Result<(), SessionStateError> {
        self.expect_phase(SessionPhase::LinkPending, SessionPhase::Active)?;
        self.phase = SessionPhase::Active;
        Ok(())
    }

    /// Replace both key sets with a fresh pull result and mark the session
    /// synced. This is a full replace, never a union: keys absent from the
    /// snapshot are dropped even if present before.
    pub fn replace_progress(&mut self, snapshot: ProgressSnapshot) {
        self.mastered = snapshot.mastered;
        self.difficult = snapshot.difficult;
        self.synced = true;
    }

    /// Optimistic local mutation for a mastery toggle. Returns the new flag.
    pub fn set_mastered(&mut self, key: &str, mastered: bool) -> bool {
        if mastered {
            self.mastered.insert(key.to_string());
        } else {
            self.mastered.remove(key);
        }
        mastered
    }

    /// Optimistic local mutation for a difficulty toggle. Returns the new flag.
    pub fn set_difficult(&mut self, key: &str, difficult: bool) -> bool {
        if difficult {
            self.difficult.insert(key.to_string());
        } else {
            self.difficult.remove(key);
        }
        difficult
    }

    /// Record that a push was swallowed and local state may be ahead of the
    /// remote store until the next pull.
    pub fn mark_unsynced(&mut self) {
        self.synced = false;
    }

    /// Logout: destroy all session-local state. Legal from any phase.
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    fn expect_phase(
        &self,
        expected: SessionPhase,
        to: SessionPhase,
    ) -> Result<(), SessionStateError> {
        if self.phase == expected {
            Ok(())
        } else {
            Err(SessionStateError::InvalidTransition {
                from: self.phase.name(),
                to: to.name(),
            })
        }
    }
}

impl Default for SessionContext {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SessionStateError {
    #[error("invalid session transition from {from} to {to}")]
    InvalidTransition {
        from: &'static str,
        to: &'static str,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(id: &str) -> UserId {
        UserId::new(id).unwrap()
    }

    #[test]
    fn walks_the_full_lifecycle() {
        let mut ctx = SessionContext::new();
        ctx.begin_authentication(user("alice")).unwrap();
        ctx.mark_authenticated().unwrap();
        ctx.acknowledge().unwrap();
        assert!(ctx.phase().is_active());
        assert_eq!(ctx.user().unwrap().as_str(), "alice");
    }

    #[test]
    fn rejects_skipping_the_gate() {
        let mut ctx = SessionContext::new();
        ctx.begin_authentication(user("alice")).unwrap();
        let result = ctx.acknowledge();
        assert!(matches!(
            result,
            Err(SessionStateError::InvalidTransition { .. })
        ));
    }

    #[test]
    fn failed_authentication_returns_to_logged_out() {
        let mut ctx = SessionContext::new();
        ctx.begin_authentication(user("alice")).unwrap();
        ctx.authentication_failed();
        assert_eq!(ctx.phase(), SessionPhase::LoggedOut);
        assert!(ctx.user().is_none());
    }

    #[test]
    fn replace_progress_drops_stale_keys() {
        let mut ctx = SessionContext::new();
        ctx.set_mastered("math_Old", true);

        let mut snapshot = ProgressSnapshot::new();
        snapshot.mastered.insert("math_New".into());
        ctx.replace_progress(snapshot);

        assert!(ctx.mastered().contains("math_New"));
        assert!(!ctx.mastered().contains("math_Old"));
        assert!(ctx.is_synced());
    }

    #[test]
    fn toggles_add_and_discard_by_key() {
        let mut ctx = SessionContext::new();
        assert!(ctx.set_difficult("math_X", true));
        assert!(ctx.difficult().contains("math_X"));
        assert!(!ctx.set_difficult("math_X", false));
        assert!(!ctx.difficult().contains("math_X"));
    }

    #[test]
    fn reset_clears_everything_from_any_phase() {
        let mut ctx = SessionContext::new();
        ctx.begin_authentication(user("alice")).unwrap();
        ctx.mark_authenticated().unwrap();
        ctx.set_mastered("math_X", true);
        ctx.reset();
        assert_eq!(ctx.phase(), SessionPhase::LoggedOut);
        assert!(ctx.mastered().is_empty());
        assert!(!ctx.is_synced());
    }
}
