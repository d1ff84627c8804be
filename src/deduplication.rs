// 🔍 Dedup Ledger - memory of every death we already announced
//
// One entry per entity id. Entries leave the ledger only when the upstream
// source stops reporting the entity (reconcile) or, in streaming mode, once
// the day it was first announced has left the recency window (prune_before).
// A later edit to the death date never makes an entity new again.

use crate::types::{CandidateRecord, LedgerEntry};
use chrono::NaiveDate;
use std::collections::{BTreeMap, HashSet};

// ============================================================================
// DEDUP LEDGER
// ============================================================================

/// Owned by the single detection worker; observers only ever see `snapshot()`.
#[derive(Debug, Clone, Default)]
pub struct DedupLedger {
    entries: BTreeMap<String, LedgerEntry>,
}

impl DedupLedger {
    pub fn new() -> Self {
        DedupLedger {
            entries: BTreeMap::new(),
        }
    }

    pub fn contains(&self, entity_id: &str) -> bool {
        self.entries.contains_key(entity_id)
    }

    /// Adds or overwrites the entry for `entity_id`. Inserting the same entry
    /// twice leaves the ledger unchanged.
    pub fn insert(&mut self, entry: LedgerEntry) {
        self.entries.insert(entry.entity_id.clone(), entry);
    }

    /// Forget every entry whose id is absent from `current_ids`.
    ///
    /// Bulk mode recomputes a rolling lookback each cycle, so an entity that
    /// scrolls out of the window is forgotten here and would be announced again
    /// if the source ever reports it anew. That is accepted: it keeps the
    /// ledger bounded by the source's own window.
    ///
    /// Returns the evicted entries.
    pub fn reconcile(&mut self, current_ids: &HashSet<String>) -> Vec<LedgerEntry> {
        let stale: Vec<String> = self
            .entries
            .keys()
            .filter(|id| !current_ids.contains(*id))
            .cloned()
            .collect();

        stale
            .into_iter()
            .filter_map(|id| self.entries.remove(&id))
            .collect()
    }

    /// Streaming-mode counterpart of `reconcile`: drop entries first seen
    /// before `cutoff`. The stored death date plays no part, since a corrected
    /// date can move back into the window.
    pub fn prune_before(&mut self, cutoff: NaiveDate) -> usize {
        let before = self.entries.len();
        self.entries
            .retain(|_, entry| entry.first_seen_at.date_naive() >= cutoff);
        before - self.entries.len()
    }

    /// Read-only copy for observability
    pub fn snapshot(&self) -> BTreeMap<String, LedgerEntry> {
        self.entries.clone()
    }

    pub fn get(&self, entity_id: &str) -> Option<&LedgerEntry> {
        self.entries.get(entity_id)
    }

    pub fn record(&self, entity_id: &str) -> Option<&CandidateRecord> {
        self.entries.get(entity_id).map(|entry| &entry.record)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// ============================================================================
// TESTS
// ============================================================================
