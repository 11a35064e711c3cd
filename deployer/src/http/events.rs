//! Raw event source: Marathon's `text/event-stream` endpoint

use futures::StreamExt;
use reqwest::{header, Method, Response, StatusCode};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::errors::DeployError;
use crate::events::types::RawEvent;
use crate::http::client::{unexpected_status, MarathonClient};

pub const EVENT_PATH: &str = "/v2/events";

/// Event source options
#[derive(Debug, Clone)]
pub struct Options {
    /// Capacity of the raw event queue
    pub capacity: usize,
}

impl Default for Options {
    fn default() -> Self {
        Self { capacity: 64 }
    }
}

/// Incremental parser for server-sent event framing.
///
/// `event:` names the event, `data:` lines accumulate the payload and a blank
/// line dispatches it. Lines starting with `:` are keep-alives.
#[derive(Debug, Default)]
pub struct EventStreamParser {
    buffer: Vec<u8>,
    name: Option<String>,
    data: Vec<u8>,
}

impl EventStreamParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a chunk of bytes, returning every event it completes
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<RawEvent> {
        self.buffer.extend_from_slice(chunk);

        let mut events = Vec::new();
        while let Some(pos) = self.buffer.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=pos).collect();
            if let Some(event) = self.handle_line(&line) {
                events.push(event);
            }
        }
        events
    }

    fn handle_line(&mut self, line: &[u8]) -> Option<RawEvent> {
        let line = trim_line_end(line);

        if line.is_empty() {
            return self.dispatch();
        }
        if line.starts_with(b":") {
            return None;
        }

        if let Some(value) = field_value(line, b"event") {
            self.name = Some(String::from_utf8_lossy(value).into_owned());
        } else if let Some(value) = field_value(line, b"data") {
            if !self.data.is_empty() {
                self.data.push(b'\n');
            }
            self.data.extend_from_slice(value);
        }
        None
    }

    fn dispatch(&mut self) -> Option<RawEvent> {
        let name = self.name.take();
        let payload = std::mem::take(&mut self.data);
        if payload.is_empty() {
            return None;
        }
        Some(RawEvent {
            name: name.unwrap_or_else(|| "message".to_string()),
            payload,
        })
    }
}

fn trim_line_end(line: &[u8]) -> &[u8] {
    let mut end = line.len();
    while end > 0 && matches!(line[end - 1], b'\n' | b'\r') {
        end -= 1;
    }
    &line[..end]
}

fn field_value<'a>(line: &'a [u8], field: &[u8]) -> Option<&'a [u8]> {
    let value = line.strip_prefix(field)?.strip_prefix(b":")?;
    Some(value.strip_prefix(b" ").unwrap_or(value))
}

impl MarathonClient {
    /// Subscribe to the event stream.
    ///
    /// Returns once Marathon accepted the subscription. Events are pumped into
    /// the returned queue by a spawned task; the queue closes when the
    /// connection ends.
    pub async fn subscribe_events(
        &self,
        options: &Options,
    ) -> Result<(mpsc::Receiver<RawEvent>, JoinHandle<()>), DeployError> {
        let response = self
            .request(Method::GET, self.url(EVENT_PATH))
            .header(header::ACCEPT, "text/event-stream")
            .send()
            .await?;

        if response.status() != StatusCode::OK {
            return Err(unexpected_status(response).await);
        }

        info!("Subscribed to Marathon event stream");

        let (tx, rx) = mpsc::channel(options.capacity.max(1));
        let handle = tokio::spawn(pump(response, tx));
        Ok((rx, handle))
    }
}

async fn pump(response: Response, tx: mpsc::Sender<RawEvent>) {
    let mut parser = EventStreamParser::new();
    let mut stream = response.bytes_stream();

    while let Some(chunk) = stream.next().await {
        let chunk = match chunk {
            Ok(chunk) => chunk,
            Err(e) => {
                warn!("Event stream read failed: {}", e);
                break;
            }
        };

        for event in parser.feed(&chunk) {
            if tx.send(event).await.is_err() {
                debug!("Event bus dropped, closing event stream");
                return;
            }
        }
    }

    info!("Event stream closed");
}
