//! Marathon event stream handling

pub mod bus;
pub mod decoder;
pub mod types;

pub use decoder::{decode, DecodeError};
pub use types::{Event, EventKind, EventPayload, RawEvent};
