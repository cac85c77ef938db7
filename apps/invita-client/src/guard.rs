//! Deep-link authorization gate.
//!
//! Guards a protected view: a synchronous credential check on mount, and on
//! failure a recorded pending-navigation target plus a login affordance in
//! place of the view. The gate never performs a client-side redirect — a
//! full round trip to the identity provider must be able to come back to an
//! arbitrary deep path, and only a full navigation driven by the absorber
//! can do that reliably.

use std::sync::Arc;

use crate::store::SessionStore;

/// Gate state for one guarded view: `Checking → {Authorized, Unauthorized}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateState {
    /// The initial store read has not resolved yet.
    Checking,
    /// A live session exists; the wrapped view renders.
    Authorized,
    /// No session. The attempted path has been recorded and the caller
    /// should render a login affordance pointing at `login_url`.
    Unauthorized,
}

pub struct RouteGuard {
    store: Arc<dyn SessionStore>,
}

impl RouteGuard {
    pub fn new(store: Arc<dyn SessionStore>) -> Self {
        Self { store }
    }

    /// Run the gate for an attempted navigation to `path`.
    ///
    /// On failure the path overwrites any previously pending target — the
    /// last attempted protected path wins. Transitioning back to
    /// `Authorized` only ever happens through an external session write
    /// (login action or redirect absorption), after which the caller
    /// re-checks. `Checking` is never observable from here (the store read
    /// is synchronous); it exists for callers that render a placeholder
    /// before mounting the guard.
    pub fn check(&self, path: &str) -> GateState {
        if self.store.session().is_some() {
            return GateState::Authorized;
        }

        tracing::debug!(%path, "gate blocked unauthenticated access");
        self.store.set_pending_path(path.to_string());
        GateState::Unauthorized
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{MemoryStore, Session};

    fn signed_in_store() -> Arc<MemoryStore> {
        let store = Arc::new(MemoryStore::new());
        store.set_session(Session {
            access_token: "tok".to_string(),
            email: "user@example.com".to_string(),
            name: None,
            picture: None,
        });
        store
    }

    #[test]
    fn authorized_with_live_session() {
        let store = signed_in_store();
        let guard = RouteGuard::new(store.clone());
        assert_eq!(guard.check("/invitation/42"), GateState::Authorized);
        // An authorized pass records nothing.
        assert!(store.pending_path().is_none());
    }

    #[test]
    fn unauthorized_records_pending_path() {
        let store = Arc::new(MemoryStore::new());
        let guard = RouteGuard::new(store.clone());

        assert_eq!(guard.check("/invitation/99"), GateState::Unauthorized);
        assert_eq!(store.pending_path().as_deref(), Some("/invitation/99"));
    }

    #[test]
    fn last_attempted_path_wins() {
        let store = Arc::new(MemoryStore::new());
        let guard = RouteGuard::new(store.clone());

        guard.check("/invitation/1");
        guard.check("/my-invitations");
        assert_eq!(store.pending_path().as_deref(), Some("/my-invitations"));
    }
}
