use super::{AmqpPublisher, AmqpQueueProvider, BrokerSession};
use crate::library::communication::event::{PublisherSlot, QueueProviderSource};
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::watch;

/// Creates a linked pair of [`SessionSlot`] and [`BrokerHandle`] without a session
pub fn session_slot() -> (SessionSlot, BrokerHandle) {
    let (tx, rx) = watch::channel(None);
    (SessionSlot { tx }, BrokerHandle { rx })
}

/// Writing half which hands out the [`BrokerSession`] once it has been established
pub struct SessionSlot {
    tx: watch::Sender<Option<Arc<BrokerSession>>>,
}

impl SessionSlot {
    /// Makes the session available to all linked handles
    pub fn fill(&self, session: Arc<BrokerSession>) {
        self.tx.send(Some(session)).ok();
    }

    /// Withdraws the session, e.g. right before it is closed
    pub fn clear(&self) {
        self.tx.send(None).ok();
    }
}

/// Reading half providing access to the current [`BrokerSession`], if any
#[derive(Clone)]
pub struct BrokerHandle {
    rx: watch::Receiver<Option<Arc<BrokerSession>>>,
}

impl BrokerHandle {
    /// Session that is currently established
    pub fn session(&self) -> Option<Arc<BrokerSession>> {
        self.rx.borrow().clone()
    }

    /// Waits until a session is established. Returns `None` if the slot has been dropped.
    pub async fn established(&mut self) -> Option<Arc<BrokerSession>> {
        loop {
            if let Some(session) = self.session() {
                return Some(session);
            }

            if self.rx.changed().await.is_err() {
                return None;
            }
        }
    }
}

impl PublisherSlot for BrokerHandle {
    type Publisher = AmqpPublisher;

    fn current(&self) -> Option<Self::Publisher> {
        self.session().map(AmqpPublisher::new)
    }
}

#[async_trait]
impl QueueProviderSource for BrokerHandle {
    type Provider = AmqpQueueProvider;

    async fn provider(&self) -> Option<Self::Provider> {
        let mut handle = self.clone();
        handle.established().await.map(AmqpQueueProvider::new)
    }
}
