use crate::domain::Order;
use crate::library::communication::event::{Notification, TopicDescriptor};
use serde::{Deserialize, Serialize};

/// Topic of [`OrderCreatedNotification`]
pub const TOPIC_ORDER_CREATED: TopicDescriptor = TopicDescriptor::new("order.created");

/// Topic of [`OrderCancelledNotification`]
pub const TOPIC_ORDER_CANCELLED: TopicDescriptor = TopicDescriptor::new("order.cancelled");

/// Order has been placed
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct OrderCreatedNotification(pub Order);

impl Notification for OrderCreatedNotification {
    fn topic() -> TopicDescriptor {
        TOPIC_ORDER_CREATED
    }
}

/// Order has been cancelled and removed, carries the last known state
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct OrderCancelledNotification(pub Order);

impl Notification for OrderCancelledNotification {
    fn topic() -> TopicDescriptor {
        TOPIC_ORDER_CANCELLED
    }
}
