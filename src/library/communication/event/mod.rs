//! Structures to realise an event-driven service architecture
//!
//! In an event driven world, services have no knowledge of each other.
//! Each service operates independently and during the operation, certain
//! events occur. For each of these (that are of relevance to other services)
//! an event [`Notification`] is published to its [`Topic`](TopicDescriptor).
//!
//! Every interested party declares a [`Queue`](QueueDescriptor) which is bound to
//! one or more topics. Notifications published to those topics are delivered to the
//! queue where a [`Consumer`] processes them one by one. Each delivered [`QueueEntry`] is either
//! acknowledged once processing concludes or rejected if it can never be processed.
//!
//! Delivery is at-least-once. Consumers are expected to apply notifications idempotently
//! so that a redelivered entry leaves the same state behind as the first delivery.
//!
//! Publishing is best-effort. A [`BestEffortPublisher`] never propagates failures back to the
//! operation that triggered the notification; it reports a [`PublishOutcome`] instead.

mod consumer;
mod notification;
mod publisher;
mod queue;
mod queue_provider;
mod topic;

pub use consumer::*;
pub use notification::*;
pub use publisher::*;
pub use queue::*;
pub use queue_provider::*;
pub use topic::*;
