use crate::domain::{EntityCache, Snapshot, User};
use crate::library::communication::event::Consumer;
use crate::library::EmptyResult;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

/// Materializes user notifications into the local user cache
///
/// Notifications about created and updated users carry the same snapshot, thus both are
/// consumed from the same queue and applied in the same way.
pub struct UserCacheService {
    cache: Arc<dyn EntityCache<User>>,
}

impl UserCacheService {
    /// Creates a new instance writing into the given cache
    pub fn new(cache: Arc<dyn EntityCache<User>>) -> Self {
        Self { cache }
    }
}

#[async_trait]
impl Consumer for UserCacheService {
    type Notification = User;

    async fn consume(&self, user: Self::Notification) -> EmptyResult {
        if user.id().is_empty() {
            return Err("user snapshot without identifier".into());
        }

        debug!(id = user.id(), "Caching user");
        self.cache.upsert(user.id().to_owned(), user);

        Ok(())
    }
}

#[cfg(test)]
mod does {
    use super::*;
    use crate::domain::event::{UserCreatedNotification, UserUpdatedNotification};
    use crate::domain::{ConsistencyCache, UserDetails};
    use crate::library::communication::event::{ConsumerExt, Disposition, QueueDescriptor};
    use crate::library::communication::implementation::mock::MockQueueProvider;
    use pretty_assertions::assert_eq;

    fn user(id: &str, name: &str) -> User {
        User {
            id: id.into(),
            ..User::new(UserDetails {
                name: name.into(),
                email: "user@example.com".into(),
            })
        }
    }

    fn queue() -> QueueDescriptor {
        QueueDescriptor::new("orders.q".into(), vec![])
    }

    #[tokio::test]
    async fn cache_latest_snapshot() {
        let cache: Arc<ConsistencyCache<User>> = Arc::new(ConsistencyCache::new());
        let service = UserCacheService::new(cache.clone());
        let updated = user("u_1", "B");

        let provider = MockQueueProvider::with_payloads(vec![
            serde_json::to_vec(&UserCreatedNotification(user("u_1", "A"))).unwrap(),
            serde_json::to_vec(&UserUpdatedNotification(updated.clone())).unwrap(),
        ]);

        service.consume_queue(&provider, &queue()).await.unwrap();

        assert_eq!(cache.get("u_1"), Some(updated));
        assert_eq!(
            provider.dispositions(),
            vec![Disposition::Acknowledged, Disposition::Acknowledged]
        );
    }

    #[tokio::test]
    async fn survive_malformed_notifications() {
        let cache: Arc<ConsistencyCache<User>> = Arc::new(ConsistencyCache::new());
        let service = UserCacheService::new(cache.clone());
        let ada = user("u_1", "Ada");

        let provider = MockQueueProvider::with_payloads(vec![
            b"{ not json".to_vec(),
            br#"{"id":"u_2"}"#.to_vec(),
            serde_json::to_vec(&user("", "Nobody")).unwrap(),
            serde_json::to_vec(&ada).unwrap(),
        ]);

        service.consume_queue(&provider, &queue()).await.unwrap();

        assert_eq!(
            provider.dispositions(),
            vec![
                Disposition::Rejected,
                Disposition::Rejected,
                Disposition::Rejected,
                Disposition::Acknowledged
            ]
        );
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get("u_1"), Some(ada));
    }
}
