use super::TopicDescriptor;
use crate::library::{BoxedError, EmptyResult};
use async_trait::async_trait;
use serde::de::DeserializeOwned;

/// Describes a notification queue and the topics it is bound to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueDescriptor {
    name: String,
    bindings: Vec<TopicDescriptor>,
}

impl QueueDescriptor {
    /// Creates a new instance from raw parts
    pub fn new(name: String, bindings: Vec<TopicDescriptor>) -> Self {
        Self { name, bindings }
    }

    /// Value which is used by queue implementations to identify a queue
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Topics whose notifications are delivered to this queue
    pub fn bindings(&self) -> &[TopicDescriptor] {
        &self.bindings
    }
}

/// Entry retrieved from a [`Queue`](QueueDescriptor) providing a raw payload
#[async_trait]
pub trait RawQueueEntry {
    /// Payload of the item
    fn payload(&self) -> &[u8];

    /// Acknowledge the item as processed
    async fn acknowledge(&mut self) -> EmptyResult;

    /// Reject the item so that it is dropped and never redelivered
    async fn reject(&mut self) -> EmptyResult;
}

/// Useful functions for [`QueueEntry`] implementations with default implementations
pub trait QueueEntry: RawQueueEntry {
    /// Attempts to parse the wire-format payload into a given data structure
    fn parse_payload<T>(&self) -> Result<T, BoxedError>
    where
        T: DeserializeOwned;
}
