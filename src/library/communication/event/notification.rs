use super::TopicDescriptor;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt::Debug;

/// Entity to notify other service about an event that took place
pub trait Notification: Serialize + DeserializeOwned + PartialEq + Debug {
    /// Topic to which this implementation is published
    fn topic() -> TopicDescriptor;
}
