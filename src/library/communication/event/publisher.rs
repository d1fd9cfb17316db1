use super::{Notification, TopicDescriptor};
use crate::library::EmptyResult;
use async_trait::async_trait;
use std::any::type_name;
use tracing::{debug, error, warn};

/// Structure which allows publishing of serialized data to a topic
#[async_trait]
pub trait RawNotificationPublisher {
    /// Sends an opaque payload to a [`Topic`](TopicDescriptor)
    async fn publish_raw(&self, data: &[u8], topic: TopicDescriptor) -> EmptyResult;
}

/// Publisher for [`Notifications`](Notification)
#[async_trait]
pub trait NotificationPublisher {
    /// Publishes a [`Notification`] to its designated topic
    async fn publish<N: Notification + Send + Sync>(&self, notification: &N) -> EmptyResult;
}

/// Source of publishers which might not be available (yet)
///
/// Services usually start accepting requests before a connection to the message broker has been
/// established. Instead of blocking or failing, they ask the slot for the current publisher and
/// get `None` while there is none.
pub trait PublisherSlot {
    /// [`NotificationPublisher`] implementation handed out by the slot
    type Publisher: NotificationPublisher + Send + Sync;

    /// Publisher that is currently available, if any
    fn current(&self) -> Option<Self::Publisher>;
}

impl<P> PublisherSlot for Option<P>
where
    P: NotificationPublisher + Clone + Send + Sync,
{
    type Publisher = P;

    fn current(&self) -> Option<Self::Publisher> {
        self.clone()
    }
}

/// What happened to a notification handed to a [`BestEffortPublisher`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishOutcome {
    /// Notification has been handed to the transport
    Published,
    /// No publisher was available, the notification has been dropped
    Skipped,
    /// The transport returned an error, the notification has been dropped
    Failed,
}

/// Publisher which swallows all failures
///
/// Notifications are a side-effect of operations that already succeeded (e.g. a database write).
/// Failing to announce them must not fail the operation itself, thus this publisher logs
/// every failure and reports a [`PublishOutcome`] instead of an error.
#[derive(Clone)]
pub struct BestEffortPublisher<S> {
    slot: S,
}

impl<S> BestEffortPublisher<S>
where
    S: PublisherSlot + Send + Sync,
{
    /// Creates a new instance drawing publishers from the given slot
    pub fn new(slot: S) -> Self {
        Self { slot }
    }

    /// Publishes a notification if a publisher is available
    pub async fn publish<N: Notification + Send + Sync>(&self, notification: &N) -> PublishOutcome {
        let topic = N::topic();
        let notification_type = type_name::<N>();

        let publisher = match self.slot.current() {
            Some(publisher) => publisher,
            None => {
                warn!(%topic, notification_type, "No publisher available, skipping notification");
                return PublishOutcome::Skipped;
            }
        };

        match publisher.publish(notification).await {
            Ok(_) => {
                debug!(%topic, notification_type, "Published notification");
                PublishOutcome::Published
            }
            Err(error) => {
                error!(%topic, notification_type, %error, "Failed to publish notification");
                PublishOutcome::Failed
            }
        }
    }
}
