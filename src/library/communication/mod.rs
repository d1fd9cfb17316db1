//! Structures to communicate between services in a distributed system
//!
//! Communication happens by publishing and subscribing to event notifications. Whenever something
//! noteworthy happens in a service, a notification describing what happened is published to a
//! topic. The notification data structure implements the [`Notification`](event::Notification)
//! trait and thus describes where to expect it in a type-safe manner. Interested parties bind a
//! [`Queue`](event::QueueDescriptor) to the topics they care about and process the notifications
//! delivered to it. For more details consult the [`event`] module.
//!
//! The traits are transport agnostic, the [`implementation`] module provides a serialization layer
//! and an AMQP based transport.

pub mod event;
pub mod implementation;
