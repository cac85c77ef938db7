//! Full-page navigation seam.
//!
//! The browser original assigns `window.location.href`; a headless client
//! has no window, so navigation is an injected effect. Tests record it, the
//! binary logs it.

use parking_lot::Mutex;

/// Performs full navigations (the kind that survive an OAuth round trip —
/// not client-side router transitions).
pub trait Navigator: Send + Sync {
    /// Navigate to `path`, pushing a history entry.
    fn assign(&self, path: &str);
    /// Navigate to `path`, replacing the current history entry.
    fn replace(&self, path: &str);
}

/// Navigator used by the headless binary: navigation becomes a log line.
#[derive(Default)]
pub struct LoggingNavigator;

impl Navigator for LoggingNavigator {
    fn assign(&self, path: &str) {
        tracing::info!(%path, "navigate (assign)");
    }

    fn replace(&self, path: &str) {
        tracing::info!(%path, "navigate (replace)");
    }
}

/// Navigator that records every navigation, for tests.
#[derive(Default)]
pub struct RecordingNavigator {
    visits: Mutex<Vec<String>>,
}

impl RecordingNavigator {
    pub fn new() -> Self {
        Self::default()
    }

    /// All navigations performed so far, in order.
    pub fn visits(&self) -> Vec<String> {
        self.visits.lock().clone()
    }

    pub fn last(&self) -> Option<String> {
        self.visits.lock().last().cloned()
    }
}

impl Navigator for RecordingNavigator {
    fn assign(&self, path: &str) {
        self.visits.lock().push(path.to_string());
    }

    fn replace(&self, path: &str) {
        self.visits.lock().push(path.to_string());
    }
}
