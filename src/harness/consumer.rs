use super::HeartStone;
use crate::library::communication::event::{
    Consumer, ConsumerExt, QueueDescriptor, QueueProviderSource,
};
use crate::library::EmptyResult;
use async_trait::async_trait;
use jatsl::{Job, JobManager};
use std::any::type_name;
use tracing::error;

/// Runner for [`Consumer`] implementations
///
/// Waits for a queue provider to become available and consumes the given queue with it.
/// The subscription ending for any reason other than termination of the job is considered
/// fatal and kills the [`Heart`](super::Heart) linked to the provided stone.
pub struct ConsumerJob<C, S> {
    consumer: C,
    queue: QueueDescriptor,
    source: S,
    stone: HeartStone,
}

impl<C, S> ConsumerJob<C, S> {
    /// Creates a new runner job consuming the queue through a provider obtained from the source
    pub fn new(consumer: C, queue: QueueDescriptor, source: S, stone: HeartStone) -> Self {
        Self {
            consumer,
            queue,
            source,
            stone,
        }
    }
}

#[async_trait]
impl<C, S> Job for ConsumerJob<C, S>
where
    C: Consumer + Send + Sync + 'static,
    S: QueueProviderSource + Send + Sync + 'static,
{
    const NAME: &'static str = module_path!();
    const SUPPORTS_GRACEFUL_TERMINATION: bool = true;

    fn name(&self) -> String {
        format!("{}({})", Self::NAME, type_name::<C>())
    }

    async fn execute(&self, manager: JobManager) -> EmptyResult {
        manager.ready().await;

        let termination = manager.termination_signal();
        tokio::pin!(termination);

        let provider = tokio::select! {
            biased;
            _ = &mut termination => return Ok(()),
            provider = self.source.provider() => provider,
        };

        let reason = match provider {
            Some(provider) => {
                let result = tokio::select! {
                    biased;
                    _ = &mut termination => return Ok(()),
                    result = self.consumer.consume_queue(&provider, &self.queue) => result,
                };

                match result {
                    Ok(_) => format!("subscription to queue {} ended", self.queue.name()),
                    Err(error) => {
                        format!("unable to consume queue {}: {}", self.queue.name(), error)
                    }
                }
            }
            None => "queue provider is no longer available".to_string(),
        };

        error!(%reason, "Consumer stopped unexpectedly");
        self.stone.kill_now(reason);
        termination.await;

        Ok(())
    }
}
