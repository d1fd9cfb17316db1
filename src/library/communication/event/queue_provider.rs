use super::{QueueDescriptor, QueueEntry};
use crate::library::BoxedError;
use async_trait::async_trait;
use futures::stream::BoxStream;

/// Allows consumption of notification queues
#[async_trait]
pub trait QueueProvider {
    /// Type of [`QueueEntry`] returned by the provider
    type Entry: QueueEntry + Send + Sync;

    /// Subscribes to the queue.
    ///
    /// Entries are yielded in delivery order. The stream ends when the subscription is lost.
    async fn consume(
        &self,
        queue: &QueueDescriptor,
    ) -> Result<BoxStream<'static, Result<Self::Entry, BoxedError>>, BoxedError>;
}

/// Hands out a [`QueueProvider`] once the underlying transport becomes available
#[async_trait]
pub trait QueueProviderSource {
    /// Provider handed out by the source
    type Provider: QueueProvider + Send + Sync;

    /// Waits until a provider is available. Returns `None` if none will ever be.
    async fn provider(&self) -> Option<Self::Provider>;
}
