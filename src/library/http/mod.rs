//! Structures for talking HTTP with clients and other services

mod probe;
mod reply;

pub use probe::{ProbeError, StatusProbe};
pub use reply::*;
