//! Change notifications from the content store's listen endpoint.
//!
//! The endpoint streams server-sent events. A background task decodes them
//! and forwards `mutation` events into a channel; [`Subscription`] owns both
//! ends and aborts the task when cancelled or dropped.

use serde::Deserialize;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Buffer size of the event channel between the reader task and the consumer.
pub(crate) const EVENT_BUFFER: usize = 64;

// ---------------------------------------------------------------------------
// ChangeEvent
// ---------------------------------------------------------------------------

/// A mutation of a document matching the listen filter.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeEvent {
    /// ID of the mutated document.
    pub document_id: String,
    /// `update`, `appear` or `disappear`.
    #[serde(default)]
    pub transition: String,
    #[serde(default)]
    pub timestamp: Option<String>,
}

// ---------------------------------------------------------------------------
// Subscription
// ---------------------------------------------------------------------------

/// A live, cancellable stream of [`ChangeEvent`]s.
pub struct Subscription {
    events: mpsc::Receiver<ChangeEvent>,
    task: Option<JoinHandle<()>>,
}

impl Subscription {
    pub(crate) fn spawned(events: mpsc::Receiver<ChangeEvent>, task: JoinHandle<()>) -> Self {
        Self {
            events,
            task: Some(task),
        }
    }

    /// Wrap a plain channel, e.g. to drive a watcher from another event source.
    pub fn from_receiver(events: mpsc::Receiver<ChangeEvent>) -> Self {
        Self { events, task: None }
    }

    /// Wait for the next change. `None` once the stream has ended.
    pub async fn next(&mut self) -> Option<ChangeEvent> {
        self.events.recv().await
    }

    /// Stop listening.
    pub fn cancel(mut self) {
        self.abort();
    }

    fn abort(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
            debug!("listener task aborted");
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.abort();
    }
}

// ---------------------------------------------------------------------------
// Server-sent events
// ---------------------------------------------------------------------------

/// One decoded server-sent event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SseEvent {
    pub event: String,
    pub data: String,
}

/// Incremental `text/event-stream` decoder.
///
/// Bytes are buffered until a full line is available, so multi-byte
/// characters split across network chunks decode correctly.
#[derive(Debug, Default)]
pub(crate) struct SseDecoder {
    buffer: Vec<u8>,
    event: Option<String>,
    data: Vec<String>,
}

impl SseDecoder {
    /// Feed a chunk and return every event it completes.
    pub(crate) fn push(&mut self, chunk: &[u8]) -> Vec<SseEvent> {
        self.buffer.extend_from_slice(chunk);
        let mut out = Vec::new();

        while let Some(pos) = self.buffer.iter().position(|b| *b == b'\n') {
            let raw: Vec<u8> = self.buffer.drain(..=pos).collect();
            let line = String::from_utf8_lossy(&raw);
            let line = line.trim_end_matches(['\n', '\r']);

            if line.is_empty() {
                if let Some(event) = self.dispatch() {
                    out.push(event);
                }
                continue;
            }

            // Comment line, used by the server as a keep-alive.
            if line.starts_with(':') {
                continue;
            }

            let (field, value) = match line.split_once(':') {
                Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
                None => (line, ""),
            };

            match field {
                "event" => self.event = Some(value.to_string()),
                "data" => self.data.push(value.to_string()),
                _ => {}
            }
        }

        out
    }

    fn dispatch(&mut self) -> Option<SseEvent> {
        if self.data.is_empty() && self.event.is_none() {
            return None;
        }
        let event = SseEvent {
            event: self.event.take().unwrap_or_else(|| "message".into()),
            data: self.data.join("\n"),
        };
        self.data.clear();
        Some(event)
    }
}

/// Read the listen response until it ends, forwarding mutations to `tx`.
pub(crate) async fn pump(mut response: reqwest::Response, tx: mpsc::Sender<ChangeEvent>) {
    let mut decoder = SseDecoder::default();

    loop {
        let chunk = match response.chunk().await {
            Ok(Some(chunk)) => chunk,
            Ok(None) => {
                info!("listen stream ended");
                return;
            }
            Err(e) => {
                warn!(error = %e, "listen stream failed");
                return;
            }
        };

        for event in decoder.push(&chunk) {
            match event.event.as_str() {
                "welcome" => info!("listening for changes"),
                "mutation" => match serde_json::from_str::<ChangeEvent>(&event.data) {
                    Ok(change) => {
                        debug!(document = %change.document_id, transition = %change.transition, "change received");
                        if tx.send(change).await.is_err() {
                            debug!("subscription dropped, stopping listener");
                            return;
                        }
                    }
                    Err(e) => warn!(error = %e, "unreadable mutation event"),
                },
                "disconnect" | "channelError" => {
                    warn!(event = %event.event, data = %event.data, "listener closed by server");
                    return;
                }
                other => debug!(event = other, "ignoring listen event"),
            }
        }
    }
}
