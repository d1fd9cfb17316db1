use super::{AmqpQueueEntry, BrokerSession};
use crate::library::communication::event::{QueueDescriptor, QueueProvider};
use crate::library::BoxedError;
use async_trait::async_trait;
use futures::stream::{BoxStream, StreamExt};
use lapin::options::BasicConsumeOptions;
use lapin::types::FieldTable;
use std::sync::Arc;
use tracing::debug;

/// Queue provider implementation using [`basic.consume`](lapin::Channel::basic_consume)
pub struct AmqpQueueProvider {
    session: Arc<BrokerSession>,
}

impl AmqpQueueProvider {
    /// Creates a new instance consuming through the given session
    pub fn new(session: Arc<BrokerSession>) -> Self {
        Self { session }
    }
}

#[async_trait]
impl QueueProvider for AmqpQueueProvider {
    type Entry = AmqpQueueEntry;

    /// Subscribes to a queue which has been declared while establishing the session
    async fn consume(
        &self,
        queue: &QueueDescriptor,
    ) -> Result<BoxStream<'static, Result<Self::Entry, BoxedError>>, BoxedError> {
        let consumer = self
            .session
            .channel()
            .basic_consume(
                queue.name(),
                "",
                BasicConsumeOptions::default(),
                FieldTable::default(),
            )
            .await?;

        debug!(queue = queue.name(), "Subscribed to queue");

        let stream: BoxStream<'static, Result<AmqpQueueEntry, BoxedError>> = consumer
            .map(|delivery| delivery.map(AmqpQueueEntry::from).map_err(Into::into))
            .boxed();

        Ok(stream)
    }
}
