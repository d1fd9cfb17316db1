use super::{BrokerSession, DELIVERY_MODE_PERSISTENT};
use crate::library::communication::event::{RawNotificationPublisher, TopicDescriptor};
use crate::library::communication::implementation::json::{
    JsonNotificationPublisher, CONTENT_TYPE,
};
use crate::library::EmptyResult;
use async_trait::async_trait;
use lapin::options::BasicPublishOptions;
use lapin::BasicProperties;
use std::sync::Arc;

/// [`NotificationPublisher`](crate::library::communication::event::NotificationPublisher)
/// implementation using [`basic.publish`](lapin::Channel::basic_publish)
///
/// Messages are marked persistent and published to the session's exchange using the routing key
/// the session's routing table assigns to the topic. Publishing does not wait for a broker
/// confirmation.
#[derive(Clone)]
pub struct AmqpPublisher {
    session: Arc<BrokerSession>,
}

impl AmqpPublisher {
    /// Creates a new instance publishing through the given session
    pub fn new(session: Arc<BrokerSession>) -> Self {
        Self { session }
    }
}

/// Properties attached to every published message
pub fn message_properties() -> BasicProperties {
    BasicProperties::default()
        .with_delivery_mode(DELIVERY_MODE_PERSISTENT)
        .with_content_type(CONTENT_TYPE.into())
}

impl JsonNotificationPublisher for AmqpPublisher {}

#[async_trait]
impl RawNotificationPublisher for AmqpPublisher {
    async fn publish_raw(&self, data: &[u8], topic: TopicDescriptor) -> EmptyResult {
        let routing_key = self.session.routing().resolve(&topic);

        // Confirmation is not awaited
        let _confirmation = self
            .session
            .channel()
            .basic_publish(
                self.session.exchange(),
                routing_key,
                BasicPublishOptions::default(),
                data,
                message_properties(),
            )
            .await?;

        Ok(())
    }
}
