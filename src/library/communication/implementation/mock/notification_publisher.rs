use crate::library::communication::event::{Notification, NotificationPublisher, TopicDescriptor};
use crate::library::EmptyResult;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

struct ExpectedNotification {
    topic: TopicDescriptor,
    payload: serde_json::Value,
}

/// Publisher which checks published notifications against a list of expectations
///
/// Expectations are matched in order. Dropping the publisher while some are still unmet panics.
#[derive(Default)]
pub struct MockNotificationPublisher {
    expected: Mutex<VecDeque<ExpectedNotification>>,
    published: AtomicUsize,
    ignore_expectations: bool,
}

#[async_trait]
impl NotificationPublisher for Arc<MockNotificationPublisher> {
    async fn publish<N: Notification + Send + Sync>(&self, notification: &N) -> EmptyResult {
        self.handle(notification);
        Ok(())
    }
}

impl MockNotificationPublisher {
    /// Accepts anything and only counts what has been published
    pub fn ignoring_everything() -> Self {
        Self {
            expected: Default::default(),
            published: Default::default(),
            ignore_expectations: true,
        }
    }

    pub fn expect<N: Notification + Send + Sync>(&self, notification: &N) -> &Self {
        let payload = serde_json::to_value(notification).unwrap();

        self.expected.lock().unwrap().push_back(ExpectedNotification {
            topic: N::topic(),
            payload,
        });

        self
    }

    /// Number of notifications that have been published so far
    pub fn published(&self) -> usize {
        self.published.load(Ordering::SeqCst)
    }

    fn handle<N: Notification + Send + Sync>(&self, notification: &N) {
        let topic = N::topic();
        let payload = serde_json::to_value(notification).unwrap();

        self.published.fetch_add(1, Ordering::SeqCst);

        if self.ignore_expectations {
            return;
        }

        match self.expected.lock().unwrap().pop_front() {
            None => panic!("Unexpected notification on {}: {}", topic, payload),
            Some(expected) => {
                pretty_assertions::assert_eq!(expected.topic, topic);
                pretty_assertions::assert_eq!(expected.payload, payload);
            }
        }
    }
}

impl Drop for MockNotificationPublisher {
    fn drop(&mut self) {
        if std::thread::panicking() || self.ignore_expectations {
            return;
        }

        let remaining = self.expected.lock().map(|e| e.len()).unwrap_or_default();
        if remaining > 0 {
            panic!(
                "MockNotificationPublisher was dropped with {} expected notifications remaining",
                remaining
            );
        }
    }
}

/// Publisher whose transport is permanently broken
#[derive(Clone)]
pub struct FailingNotificationPublisher;

#[async_trait]
impl NotificationPublisher for FailingNotificationPublisher {
    async fn publish<N: Notification + Send + Sync>(&self, _notification: &N) -> EmptyResult {
        Err("broker channel closed".into())
    }
}

#[cfg(test)]
mod does {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct Tick(usize);

    impl Notification for Tick {
        fn topic() -> TopicDescriptor {
            TopicDescriptor::new("clock.ticked")
        }
    }

    #[tokio::test]
    async fn fulfill_expectations() {
        let publisher = Arc::new(MockNotificationPublisher::default());

        publisher.expect(&Tick(42));
        publisher.publish(&Tick(42)).await.unwrap();

        assert_eq!(publisher.published(), 1);
    }

    #[tokio::test]
    #[should_panic]
    async fn fail_on_different_content() {
        let publisher = Arc::new(MockNotificationPublisher::default());

        publisher.expect(&Tick(42));
        publisher.publish(&Tick(7)).await.unwrap();
    }

    #[tokio::test]
    #[should_panic]
    async fn fail_on_unexpected() {
        let publisher = Arc::new(MockNotificationPublisher::default());
        publisher.publish(&Tick(42)).await.unwrap();
    }

    #[tokio::test]
    #[should_panic]
    async fn fail_on_missing() {
        MockNotificationPublisher::default().expect(&Tick(42));
    }
}
