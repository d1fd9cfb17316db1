//! Order management which validates users against the users service
//!
//! Users are validated synchronously. When the users service can not be asked, a local cache of
//! users is consulted which is kept up to date by consuming user notifications.

use crate::domain::event::{TOPIC_USER_CREATED, TOPIC_USER_UPDATED};
use crate::domain::store::{self, OrderStore};
use crate::domain::{ConsistencyCache, DependencyValidator, HttpDependencyLookup, User};
use crate::harness::{BrokerJob, ConsumerJob, Heart, Module, ServerJob};
use crate::library::communication::event::QueueDescriptor;
use crate::library::communication::implementation::amqp::session_slot;
use crate::library::{BoxedError, EmptyResult};
use async_trait::async_trait;
use jatsl::{schedule, JobScheduler};
use std::sync::Arc;

mod api;
mod options;
mod services;

pub use api::{routes, OrdersContext};
pub use options::Options;
pub use services::*;

/// Module implementation
pub struct Orders {
    options: Options,
    store: Option<OrderStore>,
}

impl Orders {
    /// Creates a new instance from raw parts
    pub fn new(options: Options) -> Self {
        Self {
            options,
            store: None,
        }
    }

    fn queue(&self) -> QueueDescriptor {
        QueueDescriptor::new(
            self.options.queue.clone(),
            vec![TOPIC_USER_CREATED, TOPIC_USER_UPDATED],
        )
    }
}

#[async_trait]
impl Module for Orders {
    async fn pre_startup(&mut self) -> EmptyResult {
        self.options.validate()?;

        let store = OrderStore::new(store::connect(&self.options.database.url).await?);
        store.setup().await?;
        self.store = Some(store);

        Ok(())
    }

    async fn run(&mut self, scheduler: &JobScheduler) -> Result<Option<Heart>, BoxedError> {
        let store = self.store.clone().ok_or("store has not been set up")?;
        let (heart, stone) = Heart::new();
        let (slot, handle) = session_slot();
        let cache: Arc<ConsistencyCache<User>> = Arc::new(ConsistencyCache::new());

        // Build all the required data structures
        let lookup = HttpDependencyLookup::new(
            &self.options.dependency.users_base_url,
            self.options.dependency.http_timeout,
        );
        let validator = DependencyValidator::new(Box::new(lookup), cache.clone());
        let context = Arc::new(OrdersContext::new(store, validator, handle.clone()));

        // Create individual jobs
        let broker_job = BrokerJob::new(
            self.options.broker.connector(),
            self.options.broker.exchange.clone(),
            self.options.routing.routing_table(),
            vec![self.queue()],
            slot,
            stone.clone(),
        );
        let user_cache_job =
            ConsumerJob::new(UserCacheService::new(cache), self.queue(), handle, stone);
        let server_job = ServerJob::new(self.options.port, routes(context));

        // Schedule everything
        schedule!(scheduler, { broker_job, user_cache_job, server_job });

        Ok(Some(heart))
    }
}
