// 🪦 Core Types - what flows between source, detector, ledger and announcer

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

// ============================================================================
// DETECTION MODE
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DetectionMode {
    /// Periodically re-fetch the full "deaths since cutoff" result set
    Bulk,

    /// Follow the recent-changes event feed one edit at a time
    Stream,
}

impl DetectionMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            DetectionMode::Bulk => "bulk",
            DetectionMode::Stream => "stream",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "bulk" => Some(DetectionMode::Bulk),
            "stream" | "streaming" => Some(DetectionMode::Stream),
            _ => None,
        }
    }
}

// ============================================================================
// CANDIDATE RECORD (transient, one detection pass)
// ============================================================================

/// Whatever the source told us about a candidate besides its id
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SourceMetadata {
    /// Human-readable label; a bare "Q123" means the source has none yet
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Entity URI as reported by the source
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateRecord {
    /// Bare entity id, e.g. "Q42"
    pub entity_id: String,

    /// Date of death exactly as the source spelled it (may be empty)
    pub raw_timestamp_text: String,

    pub metadata: SourceMetadata,
}

impl CandidateRecord {
    pub fn new(entity_id: impl Into<String>, raw_timestamp_text: impl Into<String>) -> Self {
        CandidateRecord {
            entity_id: entity_id.into(),
            raw_timestamp_text: raw_timestamp_text.into(),
            metadata: SourceMetadata::default(),
        }
    }

    /// Builder pattern: attach a label
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.metadata.label = Some(label.into());
        self
    }

    /// Builder pattern: attach a description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.metadata.description = Some(description.into());
        self
    }

    /// Builder pattern: attach the source URI
    pub fn with_uri(mut self, uri: impl Into<String>) -> Self {
        self.metadata.uri = Some(uri.into());
        self
    }

    pub fn label(&self) -> Option<&str> {
        self.metadata.label.as_deref()
    }
}

// ============================================================================
// DEATH EVENT (immutable once created)
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeathEvent {
    pub entity_id: String,

    /// None when the bulk source gave a timestamp we could not read
    pub death_date: Option<NaiveDate>,

    pub first_seen_at: DateTime<Utc>,
}

// ============================================================================
// LEDGER ENTRY
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub entity_id: String,

    /// The candidate as first seen
    pub record: CandidateRecord,

    pub death_date: Option<NaiveDate>,

    pub first_seen_at: DateTime<Utc>,
}

impl LedgerEntry {
    pub fn from_event(event: &DeathEvent, record: CandidateRecord) -> Self {
        LedgerEntry {
            entity_id: event.entity_id.clone(),
            record,
            death_date: event.death_date,
            first_seen_at: event.first_seen_at,
        }
    }
}
