// ☠️ Death Detector - decides which candidates are genuinely new deaths
//
// Bulk mode:   reconcile → filter (placeholder label, already known) → commit
// Stream mode: parse comment → recency window → ledger check → commit
//
// Both detectors own their ledger. Nothing else mutates it.

use crate::deduplication::DedupLedger;
use crate::parser::{is_placeholder_label, parse_death_timestamp, ChangeEvent};
use crate::temporal::RecencyWindow;
use crate::types::{CandidateRecord, DeathEvent, LedgerEntry};
use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use std::collections::HashSet;

// ============================================================================
// BULK DETECTOR
// ============================================================================

/// What one bulk pass did, for logging
#[derive(Debug, Clone, Default, Serialize)]
pub struct CycleReport {
    /// New deaths, in the order the source listed them
    pub events: Vec<DeathEvent>,

    /// Ids forgotten because the source no longer reports them
    pub evicted: Vec<String>,

    /// Candidates skipped for having no human-readable label yet
    pub placeholders: usize,

    /// Candidates skipped because they were already announced
    pub already_known: usize,
}

#[derive(Debug, Default)]
pub struct BulkDetector {
    ledger: DedupLedger,
}

impl BulkDetector {
    pub fn new() -> Self {
        BulkDetector {
            ledger: DedupLedger::new(),
        }
    }

    pub fn with_ledger(ledger: DedupLedger) -> Self {
        BulkDetector { ledger }
    }

    pub fn ledger(&self) -> &DedupLedger {
        &self.ledger
    }

    /// Process one complete result set ("all deaths since the cutoff").
    pub fn detect(&mut self, candidates: &[CandidateRecord], now: DateTime<Utc>) -> CycleReport {
        let mut report = CycleReport::default();

        // Step 1: forget whatever scrolled out of the lookback
        let current_ids: HashSet<String> =
            candidates.iter().map(|c| c.entity_id.clone()).collect();
        report.evicted = self
            .ledger
            .reconcile(&current_ids)
            .into_iter()
            .map(|entry| entry.entity_id)
            .collect();

        for candidate in candidates {
            // Step 2: filter
            let labelled = candidate
                .label()
                .map(|label| !is_placeholder_label(label))
                .unwrap_or(false);
            if !labelled {
                report.placeholders += 1;
                continue;
            }

            if self.ledger.contains(&candidate.entity_id) {
                report.already_known += 1;
                continue;
            }

            // Step 3: commit
            let event = DeathEvent {
                entity_id: candidate.entity_id.clone(),
                death_date: parse_death_timestamp(&candidate.raw_timestamp_text),
                first_seen_at: now,
            };
            self.ledger
                .insert(LedgerEntry::from_event(&event, candidate.clone()));
            report.events.push(event);
        }

        report
    }
}

// ============================================================================
// STREAM DETECTOR
// ============================================================================

/// Result of looking at one change event. Only `Accepted` leads anywhere;
/// the rest are routine and must not be logged as errors.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamOutcome {
    Accepted(DeathEvent),

    /// The comment does not describe a date-of-death edit
    NotDeathEdit,

    /// A death date, but not a recent one
    OutOfWindow(NaiveDate),

    /// Same entity already announced within the window (re-delivered or re-edited)
    AlreadyAnnounced(String),
}

impl StreamOutcome {
    pub fn accepted(self) -> Option<DeathEvent> {
        match self {
            StreamOutcome::Accepted(event) => Some(event),
            _ => None,
        }
    }
}

#[derive(Debug, Default)]
pub struct StreamDetector {
    ledger: DedupLedger,
    window: RecencyWindow,
}

impl StreamDetector {
    pub fn new() -> Self {
        StreamDetector {
            ledger: DedupLedger::new(),
            window: RecencyWindow::new(),
        }
    }

    pub fn with_window(window: RecencyWindow) -> Self {
        StreamDetector {
            ledger: DedupLedger::new(),
            window,
        }
    }

    pub fn ledger(&self) -> &DedupLedger {
        &self.ledger
    }

    pub fn observe(&mut self, event: &ChangeEvent, now: DateTime<Utc>) -> StreamOutcome {
        // Step 1: parse
        let (record, death_date) = match event.to_candidate() {
            Some(parsed) => parsed,
            None => return StreamOutcome::NotDeathEdit,
        };

        // Step 2: recency
        let today = now.date_naive();
        if !self.window.contains(death_date, today) {
            return StreamOutcome::OutOfWindow(death_date);
        }

        // Step 3: dedup. Only entities announced before the window opened are
        // forgotten; their deaths can no longer be reported as recent.
        self.ledger.prune_before(self.window.start(today));
        if self.ledger.contains(&record.entity_id) {
            return StreamOutcome::AlreadyAnnounced(record.entity_id);
        }

        let death = DeathEvent {
            entity_id: record.entity_id.clone(),
            death_date: Some(death_date),
            first_seen_at: now,
        };
        self.ledger.insert(LedgerEntry::from_event(&death, record));
        StreamOutcome::Accepted(death)
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn candidate(id: &str, label: &str) -> CandidateRecord {
        CandidateRecord::new(id, "2024-03-10T00:00:00Z").with_label(label)
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 10, 12, 0, 0).unwrap()
    }

    fn ids(events: &[DeathEvent]) -> Vec<&str> {
        events.iter().map(|e| e.entity_id.as_str()).collect()
    }

    fn death_edit(id: &str, date_text: &str) -> ChangeEvent {
        ChangeEvent {
            server_name: "www.wikidata.org".to_string(),
            title: id.to_string(),
            comment: format!("/* wbcreateclaim-create:1| */ [[Property:P570]]: {}", date_text),
            timestamp: None,
        }
    }

    #[test]
    fn test_bulk_emits_new_deaths_in_source_order() {
        let mut detector = BulkDetector::new();
        let batch = vec![candidate("Q3", "C"), candidate("Q1", "A"), candidate("Q2", "B")];

        let report = detector.detect(&batch, now());

        assert_eq!(ids(&report.events), vec!["Q3", "Q1", "Q2"]);
        assert_eq!(
            report.events[0].death_date,
            NaiveDate::from_ymd_opt(2024, 3, 10)
        );
        assert_eq!(report.events[0].first_seen_at, now());
        assert_eq!(detector.ledger().len(), 3);
    }

    #[test]
    fn test_bulk_same_batch_twice_is_idempotent() {
        let mut detector = BulkDetector::new();
        let batch = vec![candidate("Q1", "A"), candidate("Q2", "B")];

        let first = detector.detect(&batch, now());
        let second = detector.detect(&batch, now() + Duration::minutes(30));

        assert_eq!(first.events.len(), 2);
        assert!(second.events.is_empty());
        assert_eq!(second.already_known, 2);
        assert!(second.evicted.is_empty());
    }

    #[test]
    fn test_bulk_eviction_then_reappearance() {
        let mut detector = BulkDetector::new();
        let with_q1 = vec![candidate("Q1", "A"), candidate("Q2", "B")];
        let without_q1 = vec![candidate("Q2", "B")];

        let cycle1 = detector.detect(&with_q1, now());
        let cycle2 = detector.detect(&without_q1, now());
        let cycle3 = detector.detect(&with_q1, now());

        assert_eq!(ids(&cycle1.events), vec!["Q1", "Q2"]);
        assert!(cycle2.events.is_empty());
        assert_eq!(cycle2.evicted, vec!["Q1".to_string()]);
        assert_eq!(ids(&cycle3.events), vec!["Q1"]);
    }

    #[test]
    fn test_bulk_placeholder_never_emitted() {
        let mut detector = BulkDetector::new();
        let batch = vec![candidate("Q12345", "Q12345"), candidate("Q7", "Real Name")];

        let first = detector.detect(&batch, now());
        let second = detector.detect(&batch, now());

        assert_eq!(ids(&first.events), vec!["Q7"]);
        assert_eq!(first.placeholders, 1);
        assert!(second.events.is_empty());
        assert!(!detector.ledger().contains("Q12345"));
    }

    #[test]
    fn test_bulk_placeholder_announced_once_labelled() {
        let mut detector = BulkDetector::new();

        let unlabelled = detector.detect(&[candidate("Q5", "Q5")], now());
        let labelled = detector.detect(&[candidate("Q5", "Jane Doe")], now());

        assert!(unlabelled.events.is_empty());
        assert_eq!(ids(&labelled.events), vec!["Q5"]);
    }

    #[test]
    fn test_bulk_missing_label_is_skipped() {
        let mut detector = BulkDetector::new();
        let report = detector.detect(&[CandidateRecord::new("Q9", "")], now());

        assert!(report.events.is_empty());
        assert_eq!(report.placeholders, 1);
    }

    #[test]
    fn test_bulk_duplicate_rows_in_one_batch() {
        // An entity with two death dates shows up twice in the same result set
        let mut detector = BulkDetector::new();
        let batch = vec![candidate("Q1", "A"), candidate("Q1", "A")];

        let report = detector.detect(&batch, now());

        assert_eq!(ids(&report.events), vec!["Q1"]);
        assert_eq!(report.already_known, 1);
    }

    #[test]
    fn test_bulk_unparsable_timestamp_still_announced() {
        let mut detector = BulkDetector::new();
        let record = CandidateRecord::new("Q1", "sometime").with_label("A");

        let report = detector.detect(&[record], now());

        assert_eq!(report.events.len(), 1);
        assert_eq!(report.events[0].death_date, None);
    }

    #[test]
    fn test_bulk_empty_batch_clears_ledger() {
        let mut detector = BulkDetector::new();
        detector.detect(&[candidate("Q1", "A")], now());

        let report = detector.detect(&[], now());

        assert!(report.events.is_empty());
        assert!(detector.ledger().is_empty());
    }

    #[test]
    fn test_stream_window_examples() {
        let mut detector = StreamDetector::new();

        assert!(matches!(
            detector.observe(&death_edit("Q1", "10 March 2024"), now()),
            StreamOutcome::Accepted(_)
        ));
        assert!(matches!(
            detector.observe(&death_edit("Q2", "7 March 2024"), now()),
            StreamOutcome::Accepted(_)
        ));
        assert_eq!(
            detector.observe(&death_edit("Q3", "6 March 2024"), now()),
            StreamOutcome::OutOfWindow(NaiveDate::from_ymd_opt(2024, 3, 6).unwrap())
        );
        assert_eq!(
            detector.observe(&death_edit("Q4", "10 March 2023"), now()),
            StreamOutcome::OutOfWindow(NaiveDate::from_ymd_opt(2023, 3, 10).unwrap())
        );
    }

    #[test]
    fn test_stream_accepted_event_fields() {
        let mut detector = StreamDetector::new();

        let event = detector
            .observe(&death_edit("Q42", "9 March 2024"), now())
            .accepted()
            .unwrap();

        assert_eq!(event.entity_id, "Q42");
        assert_eq!(event.death_date, NaiveDate::from_ymd_opt(2024, 3, 9));
        assert_eq!(event.first_seen_at, now());
    }

    #[test]
    fn test_stream_non_death_edit() {
        let mut detector = StreamDetector::new();
        let edit = ChangeEvent {
            server_name: "www.wikidata.org".to_string(),
            title: "Q1".to_string(),
            comment: "/* wbsetdescription-add:1|en */ painter".to_string(),
            timestamp: None,
        };

        assert_eq!(detector.observe(&edit, now()), StreamOutcome::NotDeathEdit);
        assert!(detector.ledger().is_empty());
    }

    #[test]
    fn test_stream_redelivery_is_deduplicated() {
        let mut detector = StreamDetector::new();
        let edit = death_edit("Q1", "10 March 2024");

        assert!(detector.observe(&edit, now()).accepted().is_some());
        assert_eq!(
            detector.observe(&edit, now()),
            StreamOutcome::AlreadyAnnounced("Q1".to_string())
        );
        // A corrected date for the same person is still the same death
        assert_eq!(
            detector.observe(&death_edit("Q1", "9 March 2024"), now()),
            StreamOutcome::AlreadyAnnounced("Q1".to_string())
        );
    }

    #[test]
    fn test_stream_corrected_date_next_day_not_reannounced() {
        let mut detector = StreamDetector::new();
        assert!(detector
            .observe(&death_edit("Q1", "7 March 2024"), now())
            .accepted()
            .is_some());

        // 7 March has left the window by the 11th; Q1 must still be known
        let next_day = now() + Duration::days(1);
        assert_eq!(
            detector.observe(&death_edit("Q1", "10 March 2024"), next_day),
            StreamOutcome::AlreadyAnnounced("Q1".to_string())
        );
    }

    #[test]
    fn test_stream_ledger_pruned_as_window_moves() {
        let mut detector = StreamDetector::new();
        detector.observe(&death_edit("Q1", "7 March 2024"), now());
        assert!(detector.ledger().contains("Q1"));

        // Window on the 14th starts at the 11th, after Q1 was announced
        let later = now() + Duration::days(4);
        detector.observe(&death_edit("Q2", "14 March 2024"), later);

        assert!(!detector.ledger().contains("Q1"));
        assert!(detector.ledger().contains("Q2"));
    }
}
