//! Persistent client-side session store.
//!
//! The single cross-component mutable resource: holds the current session
//! and at most one pending-navigation target. Backed by a JSON file in the
//! binary (survives restarts the way origin-scoped browser storage survives
//! reloads) and an in-memory map in tests. All reads go back to the store —
//! components never cache a credential across a suspension point.

use std::collections::HashMap;
use std::path::PathBuf;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

/// The authenticated identity, at most one per store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    /// Opaque bearer credential, short-lived, replaced on refresh.
    pub access_token: String,
    /// Identity key. Reactions and private-invitation lookups key off this.
    pub email: String,
    pub name: Option<String>,
    pub picture: Option<String>,
}

/// Synchronous key/value store for the session and pending navigation.
///
/// Single writer, many readers; every mutation happens under one lock so a
/// half-written session is never observable.
pub trait SessionStore: Send + Sync {
    fn session(&self) -> Option<Session>;
    fn set_session(&self, session: Session);
    /// Replace the bearer credential on the existing session. A refresh
    /// never conjures an identity: without a session this is a no-op.
    fn set_access_token(&self, token: String);
    fn clear_session(&self);

    fn pending_path(&self) -> Option<String>;
    /// Record a blocked navigation target. Last attempted path wins.
    fn set_pending_path(&self, path: String);
    /// Remove and return the pending target in one step, so it is consumed
    /// exactly once even if two replays race.
    fn take_pending_path(&self) -> Option<String>;
}

impl dyn SessionStore {
    /// Convenience: the bearer credential, if any.
    pub fn access_token(&self) -> Option<String> {
        self.session().map(|s| s.access_token)
    }
}

// ---------------------------------------------------------------------------
// Storage keys (the original client's localStorage layout)
// ---------------------------------------------------------------------------

const KEY_ACCESS_TOKEN: &str = "accessToken";
const KEY_USER_NAME: &str = "userName";
const KEY_USER_EMAIL: &str = "userEmail";
const KEY_USER_PICTURE: &str = "userPicture";
const KEY_PENDING_PATH: &str = "pendingInvitationPath";

#[derive(Debug, Default, Serialize, Deserialize)]
struct StoreData(HashMap<String, String>);

impl StoreData {
    fn session(&self) -> Option<Session> {
        let token = self.0.get(KEY_ACCESS_TOKEN)?;
        let email = self.0.get(KEY_USER_EMAIL)?;
        Some(Session {
            access_token: token.clone(),
            email: email.clone(),
            name: self.0.get(KEY_USER_NAME).cloned(),
            picture: self.0.get(KEY_USER_PICTURE).cloned(),
        })
    }

    fn set_session(&mut self, session: Session) {
        self.0
            .insert(KEY_ACCESS_TOKEN.to_string(), session.access_token);
        self.0.insert(KEY_USER_EMAIL.to_string(), session.email);
        match session.name {
            Some(name) => self.0.insert(KEY_USER_NAME.to_string(), name),
            None => self.0.remove(KEY_USER_NAME),
        };
        match session.picture {
            Some(picture) => self.0.insert(KEY_USER_PICTURE.to_string(), picture),
            None => self.0.remove(KEY_USER_PICTURE),
        };
    }

    fn clear_session(&mut self) {
        self.0.remove(KEY_ACCESS_TOKEN);
        self.0.remove(KEY_USER_NAME);
        self.0.remove(KEY_USER_EMAIL);
        self.0.remove(KEY_USER_PICTURE);
    }
}

// ---------------------------------------------------------------------------
// In-memory implementation (for tests)
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct MemoryStore {
    data: Mutex<StoreData>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for MemoryStore {
    fn session(&self) -> Option<Session> {
        self.data.lock().session()
    }

    fn set_session(&self, session: Session) {
        self.data.lock().set_session(session);
    }

    fn set_access_token(&self, token: String) {
        let mut data = self.data.lock();
        if data.0.contains_key(KEY_USER_EMAIL) {
            data.0.insert(KEY_ACCESS_TOKEN.to_string(), token);
        } else {
            tracing::warn!("refusing to store a credential without an identity");
        }
    }

    fn clear_session(&self) {
        self.data.lock().clear_session();
    }

    fn pending_path(&self) -> Option<String> {
        self.data.lock().0.get(KEY_PENDING_PATH).cloned()
    }

    fn set_pending_path(&self, path: String) {
        self.data.lock().0.insert(KEY_PENDING_PATH.to_string(), path);
    }

    fn take_pending_path(&self) -> Option<String> {
        self.data.lock().0.remove(KEY_PENDING_PATH)
    }
}

// ---------------------------------------------------------------------------
// File-backed implementation
// ---------------------------------------------------------------------------

/// JSON-file-backed store. Every mutation is written through immediately so
/// a crash between operations loses at most the in-flight write.
pub struct FileStore {
    path: PathBuf,
    data: Mutex<StoreData>,
}

impl FileStore {
    /// Open (or create) the store at `path`. An unreadable or corrupt file
    /// starts empty rather than failing — the worst case is a re-login.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let data = match std::fs::read_to_string(&path) {
            Ok(raw) => serde_json::from_str(&raw).unwrap_or_else(|e| {
                tracing::warn!(?e, path = %path.display(), "corrupt session store, starting empty");
                StoreData::default()
            }),
            Err(_) => StoreData::default(),
        };
        Self {
            path,
            data: Mutex::new(data),
        }
    }

    fn persist(&self, data: &StoreData) {
        match serde_json::to_string_pretty(data) {
            Ok(raw) => {
                if let Err(e) = std::fs::write(&self.path, raw) {
                    tracing::error!(?e, path = %self.path.display(), "failed to persist session store");
                }
            }
            Err(e) => tracing::error!(?e, "failed to serialize session store"),
        }
    }
}

impl SessionStore for FileStore {
    fn session(&self) -> Option<Session> {
        self.data.lock().session()
    }

    fn set_session(&self, session: Session) {
        let mut data = self.data.lock();
        data.set_session(session);
        self.persist(&data);
    }

    fn set_access_token(&self, token: String) {
        let mut data = self.data.lock();
        if data.0.contains_key(KEY_USER_EMAIL) {
            data.0.insert(KEY_ACCESS_TOKEN.to_string(), token);
            self.persist(&data);
        } else {
            tracing::warn!("refusing to store a credential without an identity");
        }
    }

    fn clear_session(&self) {
        let mut data = self.data.lock();
        data.clear_session();
        self.persist(&data);
    }

    fn pending_path(&self) -> Option<String> {
        self.data.lock().0.get(KEY_PENDING_PATH).cloned()
    }

    fn set_pending_path(&self, path: String) {
        let mut data = self.data.lock();
        data.0.insert(KEY_PENDING_PATH.to_string(), path);
        self.persist(&data);
    }

    fn take_pending_path(&self) -> Option<String> {
        let mut data = self.data.lock();
        let taken = data.0.remove(KEY_PENDING_PATH);
        if taken.is_some() {
            self.persist(&data);
        }
        taken
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(token: &str) -> Session {
        Session {
            access_token: token.to_string(),
            email: "user@example.com".to_string(),
            name: Some("User".to_string()),
            picture: None,
        }
    }

    #[test]
    fn memory_store_round_trips_session() {
        let store = MemoryStore::new();
        assert!(store.session().is_none());

        store.set_session(session("tok_1"));
        let got = store.session().unwrap();
        assert_eq!(got.access_token, "tok_1");
        assert_eq!(got.email, "user@example.com");

        store.clear_session();
        assert!(store.session().is_none());
    }

    #[test]
    fn set_access_token_requires_identity() {
        let store = MemoryStore::new();
        store.set_access_token("tok_orphan".to_string());
        assert!(store.session().is_none());

        store.set_session(session("tok_1"));
        store.set_access_token("tok_2".to_string());
        assert_eq!(store.session().unwrap().access_token, "tok_2");
        // Identity untouched by a credential rotation.
        assert_eq!(store.session().unwrap().email, "user@example.com");
    }

    #[test]
    fn pending_path_is_consumed_exactly_once() {
        let store = MemoryStore::new();
        assert!(store.take_pending_path().is_none());

        store.set_pending_path("/invitation/1".to_string());
        store.set_pending_path("/invitation/42".to_string()); // last wins
        assert_eq!(store.pending_path().as_deref(), Some("/invitation/42"));

        assert_eq!(store.take_pending_path().as_deref(), Some("/invitation/42"));
        assert!(store.take_pending_path().is_none());
        assert!(store.pending_path().is_none());
    }

    #[test]
    fn file_store_survives_reopen() {
        let path = std::env::temp_dir().join(format!(
            "invita-store-{}.json",
            invita_common::id::prefixed_ulid("test")
        ));

        {
            let store = FileStore::open(&path);
            store.set_session(session("tok_persisted"));
            store.set_pending_path("/invitation/7".to_string());
        }

        let reopened = FileStore::open(&path);
        assert_eq!(reopened.session().unwrap().access_token, "tok_persisted");
        assert_eq!(reopened.take_pending_path().as_deref(), Some("/invitation/7"));

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn file_store_tolerates_corrupt_file() {
        let path = std::env::temp_dir().join(format!(
            "invita-store-{}.json",
            invita_common::id::prefixed_ulid("test")
        ));
        std::fs::write(&path, "not json at all").unwrap();

        let store = FileStore::open(&path);
        assert!(store.session().is_none());

        let _ = std::fs::remove_file(&path);
    }
}
