use crate::domain::User;
use crate::library::communication::event::{Notification, TopicDescriptor};
use serde::{Deserialize, Serialize};

/// Topic of [`UserCreatedNotification`]
pub const TOPIC_USER_CREATED: TopicDescriptor = TopicDescriptor::new("user.created");

/// Topic of [`UserUpdatedNotification`]
pub const TOPIC_USER_UPDATED: TopicDescriptor = TopicDescriptor::new("user.updated");

/// New user has been registered
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct UserCreatedNotification(pub User);

impl Notification for UserCreatedNotification {
    fn topic() -> TopicDescriptor {
        TOPIC_USER_CREATED
    }
}

/// Name or email of an existing user changed
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct UserUpdatedNotification(pub User);

impl Notification for UserUpdatedNotification {
    fn topic() -> TopicDescriptor {
        TOPIC_USER_UPDATED
    }
}
