//! OAuth redirect absorption.
//!
//! Runs once per page load, before anything else looks at the URL. After an
//! external login the provider redirects back with an identity bundle in
//! the query string; the absorber persists it and replays whatever
//! navigation the gate recorded before the round trip.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use url::Url;

use crate::nav::Navigator;
use crate::store::{Session, SessionStore};

/// Outcome of inspecting the current URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Absorption {
    /// No (or no usable) identity bundle in the URL. Nothing was persisted.
    NoBundle,
    /// A session was written and a full navigation performed.
    SignedIn { destination: String },
}

pub struct RedirectAbsorber {
    store: Arc<dyn SessionStore>,
    navigator: Arc<dyn Navigator>,
    landing_path: String,
    /// One-shot guard: a duplicate run with the same URL (the original's
    /// double effect invocation) must not re-apply the bundle or navigate
    /// twice.
    absorbed: AtomicBool,
}

impl RedirectAbsorber {
    pub fn new(
        store: Arc<dyn SessionStore>,
        navigator: Arc<dyn Navigator>,
        landing_path: impl Into<String>,
    ) -> Self {
        Self {
            store,
            navigator,
            landing_path: landing_path.into(),
            absorbed: AtomicBool::new(false),
        }
    }

    /// Inspect `url` for an identity bundle and absorb it.
    ///
    /// A malformed or partial bundle (credential without identity key, or
    /// the reverse) is a no-op — a half-formed session would look
    /// authorized and then fail the first real request, which is worse than
    /// staying signed out.
    pub fn absorb(&self, url: &Url) -> Absorption {
        let bundle = match parse_bundle(url) {
            Some(b) => b,
            None => return Absorption::NoBundle,
        };

        // swap() rather than load+store: only one caller wins even if the
        // effect runs twice concurrently.
        if self.absorbed.swap(true, Ordering::SeqCst) {
            tracing::debug!("redirect already absorbed this page load");
            return Absorption::NoBundle;
        }

        tracing::info!(email = %bundle.email, "absorbing login redirect");
        self.store.set_session(bundle);

        let destination = self
            .store
            .take_pending_path()
            .unwrap_or_else(|| self.landing_path.clone());
        // Replace, not assign: the redirect URL (with its credential in the
        // query string) must not stay in history.
        self.navigator.replace(&destination);

        Absorption::SignedIn { destination }
    }
}

/// Extract a complete identity bundle from the query string. `token` and
/// `email` are both required; `name` and `picture` are cosmetic.
fn parse_bundle(url: &Url) -> Option<Session> {
    let mut token = None;
    let mut name = None;
    let mut email = None;
    let mut picture = None;

    for (key, value) in url.query_pairs() {
        let value = value.into_owned();
        if value.is_empty() {
            continue;
        }
        match key.as_ref() {
            "token" => token = Some(value),
            "name" => name = Some(value),
            "email" => email = Some(value),
            "picture" => picture = Some(value),
            _ => {}
        }
    }

    match (token, email) {
        (Some(access_token), Some(email)) => Some(Session {
            access_token,
            email,
            name,
            picture,
        }),
        (Some(_), None) | (None, Some(_)) => {
            tracing::warn!(url = %url.path(), "partial identity bundle ignored");
            None
        }
        (None, None) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nav::RecordingNavigator;
    use crate::store::MemoryStore;

    fn absorber() -> (Arc<MemoryStore>, Arc<RecordingNavigator>, RedirectAbsorber) {
        let store = Arc::new(MemoryStore::new());
        let nav = Arc::new(RecordingNavigator::new());
        let absorber = RedirectAbsorber::new(store.clone(), nav.clone(), "/home");
        (store, nav, absorber)
    }

    fn redirect_url() -> Url {
        Url::parse(
            "https://app.example.com/?token=tok_fresh&name=Ada&email=ada%40example.com&picture=p.png",
        )
        .unwrap()
    }

    #[test]
    fn absorbs_full_bundle_to_landing_path() {
        let (store, nav, absorber) = absorber();

        let outcome = absorber.absorb(&redirect_url());
        assert_eq!(
            outcome,
            Absorption::SignedIn {
                destination: "/home".to_string()
            }
        );

        let session = store.session().unwrap();
        assert_eq!(session.access_token, "tok_fresh");
        assert_eq!(session.email, "ada@example.com");
        assert_eq!(session.name.as_deref(), Some("Ada"));
        assert_eq!(nav.visits(), vec!["/home".to_string()]);
    }

    #[test]
    fn replays_pending_navigation_and_consumes_it() {
        let (store, nav, absorber) = absorber();
        store.set_pending_path("/invitation/42".to_string());

        let outcome = absorber.absorb(&redirect_url());
        assert_eq!(
            outcome,
            Absorption::SignedIn {
                destination: "/invitation/42".to_string()
            }
        );
        assert_eq!(nav.last().as_deref(), Some("/invitation/42"));
        assert!(store.pending_path().is_none());
    }

    #[test]
    fn partial_bundle_is_never_persisted() {
        let (store, nav, absorber) = absorber();

        let url = Url::parse("https://app.example.com/?token=tok_only").unwrap();
        assert_eq!(absorber.absorb(&url), Absorption::NoBundle);
        assert!(store.session().is_none());

        let url = Url::parse("https://app.example.com/?email=a%40b.com").unwrap();
        assert_eq!(absorber.absorb(&url), Absorption::NoBundle);
        assert!(store.session().is_none());
        assert!(nav.visits().is_empty());
    }

    #[test]
    fn no_query_is_a_noop() {
        let (store, nav, absorber) = absorber();
        let url = Url::parse("https://app.example.com/home").unwrap();
        assert_eq!(absorber.absorb(&url), Absorption::NoBundle);
        assert!(store.session().is_none());
        assert!(nav.visits().is_empty());
    }

    #[test]
    fn double_absorption_navigates_once() {
        let (store, nav, absorber) = absorber();
        store.set_pending_path("/invitation/7".to_string());

        let first = absorber.absorb(&redirect_url());
        assert!(matches!(first, Absorption::SignedIn { .. }));

        // Same URL again (duplicate effect run).
        let second = absorber.absorb(&redirect_url());
        assert_eq!(second, Absorption::NoBundle);

        assert_eq!(nav.visits(), vec!["/invitation/7".to_string()]);
        assert_eq!(store.session().unwrap().access_token, "tok_fresh");
    }
}
