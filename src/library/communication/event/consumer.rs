use super::{QueueDescriptor, QueueEntry, QueueProvider};
use crate::library::EmptyResult;
use async_trait::async_trait;
use futures::StreamExt;
use serde::de::DeserializeOwned;
use std::any::type_name;
use tracing::{debug, info, warn};

/// Entity which may consume and process notifications
#[async_trait]
pub trait Consumer {
    /// Notification to consume
    type Notification: DeserializeOwned + Send;

    /// Processes an event notification and returns whether it succeeded or failed
    async fn consume(&self, notification: Self::Notification) -> EmptyResult;
}

/// Final state of a [`QueueEntry`] after processing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// Entry has been processed and acknowledged
    Acknowledged,
    /// Entry could not be processed and has been rejected without requeueing
    Rejected,
}

/// Helper functions to aid the consumption of messages
#[async_trait]
pub trait ConsumerExt {
    /// Consumes notifications from a queue using the given provider.
    ///
    /// Entries are processed one at a time in delivery order. Successfully processed entries are
    /// acknowledged. Entries which fail to deserialize or to be processed are rejected without
    /// requeue so that a single poisonous entry can not block the queue. Returns once the
    /// stream of entries ends.
    async fn consume_queue<Q>(&self, provider: &Q, queue: &QueueDescriptor) -> EmptyResult
    where
        Q: QueueProvider + Send + Sync;

    /// Processes a single entry and settles it
    async fn process_entry<E>(&self, entry: &mut E) -> Disposition
    where
        E: QueueEntry + Send + Sync;
}

#[async_trait]
impl<C> ConsumerExt for C
where
    C: Consumer + Send + Sync,
{
    async fn consume_queue<Q>(&self, provider: &Q, queue: &QueueDescriptor) -> EmptyResult
    where
        Q: QueueProvider + Send + Sync,
    {
        let mut stream = provider.consume(queue).await?;

        info!(queue = queue.name(), "Consuming queue");

        while let Some(item) = stream.next().await {
            match item {
                Ok(mut entry) => {
                    self.process_entry(&mut entry).await;
                }
                Err(error) => warn!(
                    queue = queue.name(),
                    %error,
                    "Failed to receive {}",
                    type_name::<C::Notification>()
                ),
            }
        }

        info!(queue = queue.name(), "Queue subscription ended");

        Ok(())
    }

    async fn process_entry<E>(&self, entry: &mut E) -> Disposition
    where
        E: QueueEntry + Send + Sync,
    {
        let notification_type = type_name::<C::Notification>();

        let disposition = match entry.parse_payload::<C::Notification>() {
            Ok(notification) => match self.consume(notification).await {
                Ok(_) => Disposition::Acknowledged,
                Err(error) => {
                    warn!(%error, "Failed to consume {}", notification_type);
                    Disposition::Rejected
                }
            },
            Err(error) => {
                warn!(%error, "Dropping malformed {}", notification_type);
                Disposition::Rejected
            }
        };

        let settlement = match disposition {
            Disposition::Acknowledged => entry.acknowledge().await,
            Disposition::Rejected => entry.reject().await,
        };

        match settlement {
            Ok(_) => debug!(?disposition, "Settled {}", notification_type),
            Err(error) => warn!(
                %error,
                ?disposition,
                "Failed to settle {}", notification_type
            ),
        }

        disposition
    }
}

#[cfg(test)]
mod does {
    use super::*;
    use crate::library::communication::event::TopicDescriptor;
    use crate::library::communication::implementation::mock::MockQueueProvider;
    use serde::Deserialize;
    use std::sync::Mutex;

    #[derive(Debug, Deserialize)]
    struct Tally {
        amount: usize,
    }

    #[derive(Default)]
    struct TallyConsumer {
        seen: Mutex<Vec<usize>>,
    }

    #[async_trait]
    impl Consumer for TallyConsumer {
        type Notification = Tally;

        async fn consume(&self, notification: Self::Notification) -> EmptyResult {
            if notification.amount == 0 {
                return Err("refusing empty tally".into());
            }

            self.seen.lock().unwrap().push(notification.amount);
            Ok(())
        }
    }

    fn queue() -> QueueDescriptor {
        QueueDescriptor::new("tally.q".into(), vec![TopicDescriptor::new("tally.added")])
    }

    #[tokio::test]
    async fn acknowledge_processed_entries() {
        let consumer = TallyConsumer::default();
        let provider = MockQueueProvider::with_payloads(vec![
            br#"{"amount":1}"#.to_vec(),
            br#"{"amount":2}"#.to_vec(),
        ]);

        consumer.consume_queue(&provider, &queue()).await.unwrap();

        assert_eq!(*consumer.seen.lock().unwrap(), vec![1, 2]);
        assert_eq!(
            provider.dispositions(),
            vec![Disposition::Acknowledged, Disposition::Acknowledged]
        );
    }

    #[tokio::test]
    async fn reject_malformed_entries_and_continue() {
        let consumer = TallyConsumer::default();
        let provider = MockQueueProvider::with_payloads(vec![
            b"definitely not json".to_vec(),
            br#"{"unrelated":true}"#.to_vec(),
            br#"{"amount":3}"#.to_vec(),
        ]);

        consumer.consume_queue(&provider, &queue()).await.unwrap();

        assert_eq!(*consumer.seen.lock().unwrap(), vec![3]);
        assert_eq!(
            provider.dispositions(),
            vec![
                Disposition::Rejected,
                Disposition::Rejected,
                Disposition::Acknowledged
            ]
        );
    }

    #[tokio::test]
    async fn reject_entries_failing_to_process() {
        let consumer = TallyConsumer::default();
        let provider = MockQueueProvider::with_payloads(vec![br#"{"amount":0}"#.to_vec()]);

        consumer.consume_queue(&provider, &queue()).await.unwrap();

        assert!(consumer.seen.lock().unwrap().is_empty());
        assert_eq!(provider.dispositions(), vec![Disposition::Rejected]);
    }

    #[tokio::test]
    async fn subscribe_to_requested_queue() {
        let consumer = TallyConsumer::default();
        let provider = MockQueueProvider::with_payloads(Vec::new());

        consumer.consume_queue(&provider, &queue()).await.unwrap();

        assert_eq!(provider.subscriptions(), vec![queue()]);
    }
}
