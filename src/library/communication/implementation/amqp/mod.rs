//! Trait implementations using [`lapin`], an AMQP 0-9-1 client
//!
//! All services of a process share one [`BrokerSession`]: a single connection with a single
//! channel on which the exchange has been declared. The session is produced by the
//! [`BrokerConnector`] and distributed through a [`BrokerHandle`]. Publishing goes through the
//! [`AmqpPublisher`], consumption through the [`AmqpQueueProvider`].

mod connector;
mod handle;
mod publisher;
mod queue_entry;
mod queue_provider;
mod session;

pub mod topology;

pub use connector::*;
pub use handle::*;
pub use publisher::*;
pub use queue_entry::*;
pub use queue_provider::*;
pub use session::*;

/// AMQP delivery mode of messages that are written to disk by the broker
const DELIVERY_MODE_PERSISTENT: u8 = 2;

/// AMQP reply code for a regular connection close
const REPLY_SUCCESS: u16 = 200;

/// Number of unacknowledged deliveries the broker may push to a consumer
const DEFAULT_PREFETCH: u16 = 16;
