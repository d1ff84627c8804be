// 🩺 Status Endpoint - read-only view of the detector for observability
//
// The worker publishes a complete snapshot after each cycle (bulk) or event
// (stream). Readers clone the current Arc and never see a ledger mid-update.

use crate::types::{DeathEvent, DetectionMode, LedgerEntry};
use anyhow::{Context, Result};
use axum::{extract::State, response::IntoResponse, Json, Router};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};
use tower_http::trace::TraceLayer;

// ============================================================================
// SNAPSHOT
// ============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct StatusSnapshot {
    pub mode: DetectionMode,
    pub ledger: BTreeMap<String, LedgerEntry>,
    pub last_event: Option<DeathEvent>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl StatusSnapshot {
    pub fn empty(mode: DetectionMode) -> Self {
        StatusSnapshot {
            mode,
            ledger: BTreeMap::new(),
            last_event: None,
            updated_at: None,
        }
    }

    /// What the endpoint returns: the ledger in bulk mode, the last
    /// processed event in streaming mode.
    pub fn body(&self) -> serde_json::Value {
        let value = match self.mode {
            DetectionMode::Bulk => serde_json::to_value(&self.ledger),
            DetectionMode::Stream => serde_json::to_value(&self.last_event),
        };
        value.unwrap_or(serde_json::Value::Null)
    }
}

// ============================================================================
// STATUS BOARD
// ============================================================================

/// Single writer (the worker), any number of readers
#[derive(Debug, Clone)]
pub struct StatusBoard {
    current: Arc<RwLock<Arc<StatusSnapshot>>>,
}

impl StatusBoard {
    pub fn new(mode: DetectionMode) -> Self {
        StatusBoard {
            current: Arc::new(RwLock::new(Arc::new(StatusSnapshot::empty(mode)))),
        }
    }

    pub fn publish(&self, snapshot: StatusSnapshot) {
        let next = Arc::new(snapshot);
        let mut guard = self.current.write().unwrap_or_else(|e| e.into_inner());
        *guard = next;
    }

    pub fn current(&self) -> Arc<StatusSnapshot> {
        let guard = self.current.read().unwrap_or_else(|e| e.into_inner());
        Arc::clone(&*guard)
    }
}

// ============================================================================
// HTTP
// ============================================================================

async fn show_status(State(board): State<StatusBoard>) -> impl IntoResponse {
    Json(board.current().body())
}

/// Every path and method answers with the current snapshot
pub fn router(board: StatusBoard) -> Router {
    Router::new()
        .fallback(show_status)
        .with_state(board)
        .layer(TraceLayer::new_for_http())
}

pub async fn serve(port: u16, board: StatusBoard) -> Result<()> {
    let addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind status endpoint to {}", addr))?;

    tracing::info!(%addr, "Status endpoint listening");

    axum::serve(listener, router(board))
        .await
        .context("Status endpoint stopped")
}

// ============================================================================
// TESTS
// ============================================================================
