// 📡 Recent-change feed (server-sent events)
//
// The feed never ends on its own; a subscription yields events until the
// connection drops or goes quiet for longer than the idle timeout. Reopening
// is the caller's job. The last seen event id is kept so a reopened
// subscription resumes where the previous one stopped.

use crate::error::{FetchError, FetchResult};
use crate::parser::ChangeEvent;
use futures::stream::BoxStream;
use futures::StreamExt;
use reqwest::StatusCode;
use std::collections::VecDeque;
use std::time::Duration;

pub const RECENT_CHANGE_URL: &str = "https://stream.wikimedia.org/v2/stream/recentchange";

/// Only edits made on this site are considered
pub const ORIGIN_SERVER: &str = "www.wikidata.org";

/// The feed is busy; this long without a byte means the connection is dead
pub const IDLE_TIMEOUT: Duration = Duration::from_secs(60);

// ============================================================================
// SSE DECODER
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SseFrame {
    pub event: Option<String>,
    pub id: Option<String>,
    pub data: String,
}

/// Incremental text/event-stream decoder. Chunks may split lines (or UTF-8
/// sequences) anywhere; frames come out once their blank line arrives.
#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: Vec<u8>,
    current: SseFrame,
    has_data: bool,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, chunk: &[u8]) -> Vec<SseFrame> {
        self.buffer.extend_from_slice(chunk);
        let mut frames = Vec::new();

        while let Some(pos) = self.buffer.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=pos).collect();
            let line = String::from_utf8_lossy(&line);
            let line = line.trim_end_matches(&['\n', '\r'][..]);

            if line.is_empty() {
                // An id-only frame dispatches nothing but still moves the resume point
                if self.has_data || self.current.id.is_some() {
                    frames.push(std::mem::take(&mut self.current));
                }
                self.current = SseFrame::default();
                self.has_data = false;
                continue;
            }

            if line.starts_with(':') {
                continue;
            }

            let (field, value) = match line.split_once(':') {
                Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
                None => (line, ""),
            };

            match field {
                "data" => {
                    if self.has_data {
                        self.current.data.push('\n');
                    }
                    self.current.data.push_str(value);
                    self.has_data = true;
                }
                "event" => self.current.event = Some(value.to_string()),
                "id" => self.current.id = Some(value.to_string()),
                _ => {}
            }
        }

        frames
    }
}

// ============================================================================
// SUBSCRIPTION
// ============================================================================

pub struct RecentChangeStream {
    client: reqwest::Client,
    url: String,
    server_name: String,
    idle_timeout: Duration,
    last_event_id: Option<String>,
}

impl RecentChangeStream {
    /// `client` must not carry a total-request timeout; the feed is long-lived.
    pub fn new(client: reqwest::Client, idle_timeout: Duration) -> Self {
        RecentChangeStream {
            client,
            url: RECENT_CHANGE_URL.to_string(),
            server_name: ORIGIN_SERVER.to_string(),
            idle_timeout,
            last_event_id: None,
        }
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    pub async fn open(&mut self) -> FetchResult<ChangeSubscription<'_>> {
        let mut request = self
            .client
            .get(&self.url)
            .header("Accept", "text/event-stream");
        if let Some(id) = &self.last_event_id {
            request = request.header("Last-Event-ID", id.as_str());
        }

        let resp = tokio::time::timeout(self.idle_timeout, request.send())
            .await
            .map_err(|_| FetchError::Timeout(self.idle_timeout.as_secs()))??;

        if resp.status() != StatusCode::OK {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            return Err(FetchError::Status { status, body });
        }

        tracing::info!(url = %self.url, "Subscribed to recent changes");

        Ok(ChangeSubscription {
            bytes: resp.bytes_stream().map(|r| r.map(|b| b.to_vec())).boxed(),
            decoder: SseDecoder::new(),
            pending: VecDeque::new(),
            owner: self,
        })
    }
}

pub struct ChangeSubscription<'a> {
    bytes: BoxStream<'static, reqwest::Result<Vec<u8>>>,
    decoder: SseDecoder,
    pending: VecDeque<SseFrame>,
    owner: &'a mut RecentChangeStream,
}

impl ChangeSubscription<'_> {
    /// Next edit from the origin site.
    ///
    /// `None` means the subscription is over (closed, failed, or idle too long).
    /// `Some(Err(_))` is a single undecodable message; the subscription goes on.
    pub async fn next_event(&mut self) -> Option<FetchResult<ChangeEvent>> {
        loop {
            while let Some(frame) = self.pending.pop_front() {
                if let Some(id) = &frame.id {
                    self.owner.last_event_id = Some(id.clone());
                }
                let dispatched = frame.event.as_deref().map_or(true, |e| e == "message");
                if frame.data.is_empty() || !dispatched {
                    continue;
                }

                match serde_json::from_str::<ChangeEvent>(&frame.data) {
                    Ok(event) if event.server_name == self.owner.server_name => {
                        return Some(Ok(event))
                    }
                    Ok(_) => continue,
                    Err(e) => return Some(Err(FetchError::from(e))),
                }
            }

            let chunk = match tokio::time::timeout(self.owner.idle_timeout, self.bytes.next()).await
            {
                Ok(Some(Ok(chunk))) => chunk,
                Ok(Some(Err(e))) => {
                    tracing::warn!(error = %e, "Recent-change stream failed");
                    return None;
                }
                Ok(None) => {
                    tracing::info!("Recent-change stream closed");
                    return None;
                }
                Err(_) => {
                    tracing::warn!(
                        idle_secs = self.owner.idle_timeout.as_secs(),
                        "Recent-change stream went quiet"
                    );
                    return None;
                }
            };

            self.pending.extend(self.decoder.push(&chunk));
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
