// 🔁 Pipeline - the single worker that drives detection end to end
//
// Source → Detector (owns the ledger) → Resolver → Announcer
//
// One cycle (bulk) or one event (stream) is processed completely, including
// every resolve and post, before the next one starts. New deaths within a
// cycle are handled one after another. A failure for one entity is logged and
// that entity is dropped; it never touches the ledger or the rest of the batch.

use crate::announcer::Announcer;
use crate::detector::{BulkDetector, CycleReport, StreamDetector, StreamOutcome};
use crate::error::FetchError;
use crate::parser::ChangeEvent;
use crate::resolver::EntityLookup;
use crate::source::{CandidateSource, RecentChangeStream};
use crate::status::{StatusBoard, StatusSnapshot};
use crate::temporal::lookback_cutoff;
use crate::templates::TemplatePicker;
use crate::types::{DeathEvent, DetectionMode};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, trace, warn};

/// Pause before reopening the recent-change feed
pub const RECONNECT_DELAY: Duration = Duration::from_secs(5);

// ============================================================================
// HERALD (resolve → compose → post)
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum Delivery {
    Posted(String),
    ResolveFailed,
    PostFailed(String),
}

pub struct Herald {
    resolver: Arc<dyn EntityLookup>,
    announcer: Arc<dyn Announcer>,
    picker: TemplatePicker,
}

impl Herald {
    pub fn new(
        resolver: Arc<dyn EntityLookup>,
        announcer: Arc<dyn Announcer>,
        picker: TemplatePicker,
    ) -> Self {
        Herald {
            resolver,
            announcer,
            picker,
        }
    }

    pub async fn deliver(&mut self, event: &DeathEvent) -> Delivery {
        let entity = match self.resolver.resolve(&event.entity_id).await {
            Ok(entity) => entity,
            Err(e) => {
                warn!(entity_id = %event.entity_id, error = %e, "Could not resolve entity, dropping");
                return Delivery::ResolveFailed;
            }
        };

        let status = self.picker.compose(&entity);
        match self.announcer.announce(&status).await {
            Ok(()) => {
                info!(entity_id = %event.entity_id, %status, "Announced");
                Delivery::Posted(status)
            }
            Err(e) => {
                warn!(entity_id = %event.entity_id, error = %e, %status, "Posting failed");
                Delivery::PostFailed(status)
            }
        }
    }
}

// ============================================================================
// BULK MODE
// ============================================================================

#[derive(Debug, Default)]
pub struct CycleSummary {
    pub report: CycleReport,

    /// First successful cycle: ledger filled, nothing announced
    pub primed: bool,

    pub deliveries: Vec<Delivery>,
}

pub struct BulkPipeline<S: CandidateSource> {
    source: S,
    detector: BulkDetector,
    herald: Herald,
    board: StatusBoard,
    announce_first_cycle: bool,
    cycles: u64,
}

impl<S: CandidateSource> BulkPipeline<S> {
    pub fn new(source: S, herald: Herald, board: StatusBoard, announce_first_cycle: bool) -> Self {
        BulkPipeline {
            source,
            detector: BulkDetector::new(),
            herald,
            board,
            announce_first_cycle,
            cycles: 0,
        }
    }

    pub fn detector(&self) -> &BulkDetector {
        &self.detector
    }

    pub async fn run_cycle(&mut self, now: DateTime<Utc>) -> Result<CycleSummary, FetchError> {
        let candidates = self.source.fetch_candidates(lookback_cutoff(now)).await?;

        let report = self.detector.detect(&candidates, now);
        self.board.publish(StatusSnapshot {
            mode: DetectionMode::Bulk,
            ledger: self.detector.ledger().snapshot(),
            last_event: report.events.last().cloned(),
            updated_at: Some(now),
        });

        let primed = self.cycles == 0 && !self.announce_first_cycle;
        self.cycles += 1;

        info!(
            cycle = self.cycles,
            fetched = candidates.len(),
            new = report.events.len(),
            evicted = report.evicted.len(),
            placeholders = report.placeholders,
            "Bulk cycle complete"
        );

        let mut summary = CycleSummary {
            report,
            primed,
            deliveries: Vec::new(),
        };

        if primed {
            info!(known = self.detector.ledger().len(), "First cycle primes the ledger, not announcing");
            return Ok(summary);
        }

        for event in &summary.report.events {
            summary.deliveries.push(self.herald.deliver(event).await);
        }
        Ok(summary)
    }
}

/// Poll forever: one cycle, then wait `interval`, regardless of how the cycle went
pub async fn run_bulk<S: CandidateSource>(mut pipeline: BulkPipeline<S>, interval: Duration) {
    loop {
        if let Err(e) = pipeline.run_cycle(Utc::now()).await {
            warn!(error = %e, "Bulk cycle failed, will retry next interval");
        }
        tokio::time::sleep(interval).await;
    }
}

// ============================================================================
// STREAM MODE
// ============================================================================

pub struct StreamPipeline {
    detector: StreamDetector,
    herald: Herald,
    board: StatusBoard,
}

impl StreamPipeline {
    pub fn new(herald: Herald, board: StatusBoard) -> Self {
        StreamPipeline {
            detector: StreamDetector::new(),
            herald,
            board,
        }
    }

    pub fn detector(&self) -> &StreamDetector {
        &self.detector
    }

    pub async fn handle(&mut self, change: &ChangeEvent, now: DateTime<Utc>) -> Option<Delivery> {
        let event = match self.detector.observe(change, now) {
            StreamOutcome::Accepted(event) => event,
            StreamOutcome::NotDeathEdit => {
                trace!(title = %change.title, "Not a date-of-death edit");
                return None;
            }
            StreamOutcome::OutOfWindow(date) => {
                debug!(title = %change.title, %date, "Death date outside recency window");
                return None;
            }
            StreamOutcome::AlreadyAnnounced(id) => {
                debug!(entity_id = %id, "Already announced, skipping");
                return None;
            }
        };

        info!(entity_id = %event.entity_id, death_date = ?event.death_date, "New death from change feed");
        self.board.publish(StatusSnapshot {
            mode: DetectionMode::Stream,
            ledger: self.detector.ledger().snapshot(),
            last_event: Some(event.clone()),
            updated_at: Some(now),
        });

        Some(self.herald.deliver(&event).await)
    }
}

/// Follow the feed forever, reopening it whenever it drops
pub async fn run_stream(mut stream: RecentChangeStream, mut pipeline: StreamPipeline) {
    loop {
        match stream.open().await {
            Ok(mut subscription) => {
                while let Some(item) = subscription.next_event().await {
                    match item {
                        Ok(change) => {
                            pipeline.handle(&change, Utc::now()).await;
                        }
                        Err(e) => warn!(error = %e, "Undecodable change event"),
                    }
                }
            }
            Err(e) => warn!(error = %e, "Could not open recent-change feed"),
        }
        tokio::time::sleep(RECONNECT_DELAY).await;
    }
}

// ============================================================================
// TESTS
// ============================================================================
