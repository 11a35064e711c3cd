//! Event bus between the raw event source and the deployment tracker

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, trace, warn};

use crate::events::decoder::{decode, DecodeError};
use crate::events::types::{Event, RawEvent};

/// Event bus options
#[derive(Debug, Clone)]
pub struct Options {
    /// Capacity of the decoded event queue
    pub capacity: usize,
}

impl Default for Options {
    fn default() -> Self {
        Self { capacity: 64 }
    }
}

/// Counters reported when the bus stops
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BusStats {
    pub forwarded: u64,
    pub unhandled: u64,
    pub malformed: u64,
}

/// Run the bus until `input` closes or the consumer of `output` goes away.
///
/// `output` is dropped on return, which closes the downstream queue.
pub async fn run(mut input: mpsc::Receiver<RawEvent>, output: mpsc::Sender<Event>) -> BusStats {
    let mut stats = BusStats::default();

    while let Some(raw) = input.recv().await {
        match decode(&raw) {
            Ok(event) => {
                if output.send(event).await.is_err() {
                    debug!("Event consumer dropped, stopping event bus");
                    break;
                }
                stats.forwarded += 1;
            }
            Err(DecodeError::UnhandledEventKind(name)) => {
                trace!(event = %name, "Skipping unhandled event");
                stats.unhandled += 1;
            }
            Err(e) => {
                warn!(
                    error = %e,
                    payload = %String::from_utf8_lossy(&raw.payload),
                    "Error parsing event"
                );
                stats.malformed += 1;
            }
        }
    }

    debug!(
        forwarded = stats.forwarded,
        unhandled = stats.unhandled,
        malformed = stats.malformed,
        "Event bus closed"
    );
    stats
}

/// Spawn the bus on its own task and hand back the decoded event queue
pub fn spawn(
    options: &Options,
    input: mpsc::Receiver<RawEvent>,
) -> (mpsc::Receiver<Event>, JoinHandle<BusStats>) {
    let (tx, rx) = mpsc::channel(options.capacity.max(1));
    let handle = tokio::spawn(run(input, tx));
    (rx, handle)
}
