//! Notifications exchanged between services
//!
//! Every notification carries the full snapshot of the affected entity as it was right after the
//! change, serialized exactly like the entity itself.

mod order;
mod user;

pub use order::*;
pub use user::*;
