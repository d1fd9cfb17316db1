use crate::library::communication::event::{
    Disposition, QueueDescriptor, QueueProvider, RawQueueEntry,
};
use crate::library::communication::implementation::json::JsonQueueEntry;
use crate::library::{BoxedError, EmptyResult};
use async_trait::async_trait;
use futures::stream::{self, BoxStream, StreamExt};
use std::sync::{Arc, Mutex};

type DispositionLog = Arc<Mutex<Vec<Disposition>>>;

pub struct MockQueueEntry {
    payload: Vec<u8>,
    log: DispositionLog,
}

impl MockQueueEntry {
    fn settle(&self, disposition: Disposition) -> EmptyResult {
        self.log.lock().unwrap().push(disposition);
        Ok(())
    }
}

#[async_trait]
impl RawQueueEntry for MockQueueEntry {
    fn payload(&self) -> &[u8] {
        &self.payload
    }

    async fn acknowledge(&mut self) -> EmptyResult {
        self.settle(Disposition::Acknowledged)
    }

    async fn reject(&mut self) -> EmptyResult {
        self.settle(Disposition::Rejected)
    }
}

impl JsonQueueEntry for MockQueueEntry {}

/// Queue provider which delivers a fixed set of payloads and records how they were settled
#[derive(Default)]
pub struct MockQueueProvider {
    payloads: Mutex<Vec<Vec<u8>>>,
    log: DispositionLog,
    subscriptions: Mutex<Vec<QueueDescriptor>>,
}

impl MockQueueProvider {
    pub fn with_payloads(payloads: Vec<Vec<u8>>) -> Self {
        Self {
            payloads: Mutex::new(payloads),
            ..Default::default()
        }
    }

    pub fn dispositions(&self) -> Vec<Disposition> {
        self.log.lock().unwrap().clone()
    }

    pub fn subscriptions(&self) -> Vec<QueueDescriptor> {
        self.subscriptions.lock().unwrap().clone()
    }
}

#[async_trait]
impl QueueProvider for MockQueueProvider {
    type Entry = MockQueueEntry;

    async fn consume(
        &self,
        queue: &QueueDescriptor,
    ) -> Result<BoxStream<'static, Result<Self::Entry, BoxedError>>, BoxedError> {
        self.subscriptions.lock().unwrap().push(queue.clone());

        let payloads = std::mem::take(&mut *self.payloads.lock().unwrap());
        let log = self.log.clone();

        let entries = payloads.into_iter().map(move |payload| {
            Ok::<_, BoxedError>(MockQueueEntry {
                payload,
                log: log.clone(),
            })
        });

        Ok(stream::iter(entries).boxed())
    }
}
