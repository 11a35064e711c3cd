//! Marathon deployment tool library
//!
//! Submits a job to Marathon, then follows the deployment it started through
//! the Marathon event stream until it succeeds, fails, or the stream ends.

pub mod app;
pub mod errors;
pub mod events;
pub mod http;
pub mod logs;
pub mod models;
pub mod settings;
pub mod tracker;
pub mod utils;
