//! Marathon HTTP API

pub mod client;
pub mod deployments;
pub mod events;
