//! Domain specific structures, implementations, and logic

/// Number of random characters in entity identifiers
pub(self) const IDENTIFIER_LENGTH: usize = 6;

mod cache;
mod order;
mod user;
mod validator;

pub mod event;
pub mod store;

pub use cache::*;
pub use order::*;
pub use user::*;
pub use validator::*;

/// Entity state which carries a stable identifier
pub trait Snapshot {
    /// Identifier by which the entity is referenced across services
    fn id(&self) -> &str;
}
