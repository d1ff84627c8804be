// Deathwatch - Core Library
// Detects newly recorded deaths of notable people and announces each one once

pub mod types;
pub mod parser;
pub mod temporal;
pub mod deduplication;
pub mod detector;
pub mod error;
pub mod http;
pub mod source;         // Bulk query + recent-change stream
pub mod resolver;       // Entity id → label, description, link
pub mod templates;
pub mod oauth;
pub mod announcer;
pub mod status;         // Read-only HTTP view of the ledger
pub mod config;
pub mod pipeline;

// Re-export commonly used types
pub use types::{CandidateRecord, DeathEvent, DetectionMode, LedgerEntry, SourceMetadata};
pub use parser::{ChangeEvent, is_placeholder_label, parse_death_comment};
pub use temporal::{lookback_cutoff, RecencyWindow};
pub use deduplication::DedupLedger;
pub use detector::{BulkDetector, CycleReport, StreamDetector, StreamOutcome};
pub use error::{FetchError, FetchResult};
pub use source::{CandidateSource, RecentChangeStream, SparqlSource};
pub use resolver::{EntityLookup, ResolvedEntity, WikidataResolver};
pub use templates::{Template, TemplatePicker};
pub use oauth::Credentials;
pub use announcer::{Announcer, LogAnnouncer, TwitterAnnouncer};
pub use status::{StatusBoard, StatusSnapshot};
pub use config::Config;
pub use pipeline::{BulkPipeline, Delivery, Herald, StreamPipeline};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
