//! Merged view of reaction aggregates.
//!
//! Two writers feed the board: local optimistic mutations (applied before
//! the network round trip completes) and authoritative server state (feed
//! fetches and channel pushes). Server pushes always win for the exact
//! `(invitation, kind)` pair they name — a push already reflects the
//! post-update global state, so overwriting cannot double-count.
//!
//! Uses `DashMap` for shard-level concurrency and `parking_lot::Mutex` per
//! entry for non-poisoning, fast locking.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use dashmap::DashMap;
use parking_lot::Mutex;

use invita_common::feed::ReactionMap;
use invita_common::ReactionKind;

/// Aggregate for one `(invitation, kind)` pair.
#[derive(Debug, Clone, Default)]
pub struct ReactionAggregate {
    pub count: u64,
    /// Identity keys (emails) known to have reacted. Pushes carry no
    /// attribution, so this set lags the count until the next fetch
    /// reconciles it.
    pub reactors: HashSet<String>,
}

/// Per-invitation aggregates, created lazily on first observation.
type EntryReactions = HashMap<ReactionKind, ReactionAggregate>;

/// Shared reaction state for every invitation a view has observed.
#[derive(Default)]
pub struct ReactionBoard {
    entries: DashMap<String, Arc<Mutex<EntryReactions>>>,
}

impl ReactionBoard {
    pub fn new() -> Self {
        Self::default()
    }

    fn entry(&self, invitation_id: &str) -> Arc<Mutex<EntryReactions>> {
        self.entries
            .entry(invitation_id.to_string())
            .or_default()
            .clone()
    }

    /// Install an authoritative baseline from a fetch (or a reaction POST
    /// response). Replaces both counts and reactor sets for the invitation.
    pub fn seed(&self, invitation_id: &str, reactions: &ReactionMap) {
        let entry = self.entry(invitation_id);
        let mut e = entry.lock();
        e.clear();
        for (kind, agg) in reactions {
            e.insert(
                *kind,
                ReactionAggregate {
                    count: agg.count,
                    reactors: agg.users.iter().cloned().collect(),
                },
            );
        }
    }

    /// Apply a server push: overwrite the count for the exact pair. Always
    /// wins over any optimistic value.
    pub fn apply_push(&self, invitation_id: &str, kind: ReactionKind, count: u64) {
        let entry = self.entry(invitation_id);
        let mut e = entry.lock();
        e.entry(kind).or_default().count = count;
        tracing::debug!(%invitation_id, %kind, count, "applied reaction push");
    }

    /// Apply a local reaction optimistically, before the server confirms.
    ///
    /// Idempotent per identity: a user already in the reactor set does not
    /// bump the count again, so duplicate clicks cannot inflate the
    /// optimistic overlay. Returns the displayed count.
    pub fn react(&self, invitation_id: &str, kind: ReactionKind, identity: &str) -> u64 {
        let entry = self.entry(invitation_id);
        let mut e = entry.lock();
        let agg = e.entry(kind).or_default();
        if agg.reactors.insert(identity.to_string()) {
            agg.count += 1;
        }
        agg.count
    }

    /// Displayed count for a pair; zero if never observed.
    pub fn count(&self, invitation_id: &str, kind: ReactionKind) -> u64 {
        self.entries
            .get(invitation_id)
            .map(|entry| entry.lock().get(&kind).map(|a| a.count).unwrap_or(0))
            .unwrap_or(0)
    }

    /// Whether `identity` is known to have reacted with `kind`.
    pub fn has_reacted(&self, invitation_id: &str, kind: ReactionKind, identity: &str) -> bool {
        self.entries
            .get(invitation_id)
            .map(|entry| {
                entry
                    .lock()
                    .get(&kind)
                    .map(|a| a.reactors.contains(identity))
                    .unwrap_or(false)
            })
            .unwrap_or(false)
    }

    /// Snapshot of all aggregates for one invitation.
    pub fn snapshot(&self, invitation_id: &str) -> HashMap<ReactionKind, ReactionAggregate> {
        self.entries
            .get(invitation_id)
            .map(|entry| entry.lock().clone())
            .unwrap_or_default()
    }
}
