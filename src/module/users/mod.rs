//! Registry of users which announces every change to other services

use crate::domain::store::{self, UserStore};
use crate::harness::{BrokerJob, Heart, Module, ServerJob};
use crate::library::communication::implementation::amqp::session_slot;
use crate::library::{BoxedError, EmptyResult};
use async_trait::async_trait;
use jatsl::{schedule, JobScheduler};
use std::sync::Arc;

mod api;
mod options;

pub use api::{routes, UsersContext};
pub use options::Options;

/// Module implementation
pub struct Users {
    options: Options,
    store: Option<UserStore>,
}

impl Users {
    /// Creates a new instance from raw parts
    pub fn new(options: Options) -> Self {
        Self {
            options,
            store: None,
        }
    }
}

#[async_trait]
impl Module for Users {
    async fn pre_startup(&mut self) -> EmptyResult {
        self.options.validate()?;

        let store = UserStore::new(store::connect(&self.options.database.url).await?);
        store.setup().await?;
        self.store = Some(store);

        Ok(())
    }

    async fn run(&mut self, scheduler: &JobScheduler) -> Result<Option<Heart>, BoxedError> {
        let store = self.store.clone().ok_or("store has not been set up")?;
        let (heart, stone) = Heart::new();
        let (slot, handle) = session_slot();

        let broker_job = BrokerJob::new(
            self.options.broker.connector(),
            self.options.broker.exchange.clone(),
            self.options.routing.routing_table(),
            Vec::new(),
            slot,
            stone,
        );

        let context = Arc::new(UsersContext::new(store, handle));
        let server_job = ServerJob::new(self.options.port, routes(context));

        schedule!(scheduler, { broker_job, server_job });

        Ok(Some(heart))
    }
}
