// Source Fetchers - where candidate deaths come from
//
// - sparql: periodic bulk query ("every human who died since the cutoff")
// - stream: server-sent recent-change events, one edit at a time

pub mod sparql;
pub mod stream;

pub use sparql::{build_query, SparqlSource};
pub use stream::{ChangeSubscription, RecentChangeStream, SseDecoder, SseFrame};

use crate::error::FetchResult;
use crate::types::CandidateRecord;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Bulk-mode source: one complete result set per call, in source order
#[async_trait]
pub trait CandidateSource: Send + Sync {
    async fn fetch_candidates(&self, cutoff: DateTime<Utc>) -> FetchResult<Vec<CandidateRecord>>;
}
