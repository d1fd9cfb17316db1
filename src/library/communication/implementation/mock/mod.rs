mod notification_publisher;
mod queue_provider;

pub use notification_publisher::*;
pub use queue_provider::*;
