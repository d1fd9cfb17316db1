use crate::library::communication::event::RawQueueEntry;
use crate::library::communication::implementation::json::JsonQueueEntry;
use crate::library::EmptyResult;
use async_trait::async_trait;
use lapin::acker::Acker;
use lapin::message::Delivery;
use lapin::options::{BasicAckOptions, BasicRejectOptions};

/// AMQP based implementation of the [`QueueEntry`](crate::library::communication::event::QueueEntry) trait
pub struct AmqpQueueEntry {
    payload: Vec<u8>,
    acker: Acker,
}

impl From<Delivery> for AmqpQueueEntry {
    fn from(delivery: Delivery) -> Self {
        Self {
            payload: delivery.data,
            acker: delivery.acker,
        }
    }
}

#[async_trait]
impl RawQueueEntry for AmqpQueueEntry {
    fn payload(&self) -> &[u8] {
        &self.payload
    }

    async fn acknowledge(&mut self) -> EmptyResult {
        self.acker.ack(BasicAckOptions::default()).await?;
        Ok(())
    }

    async fn reject(&mut self) -> EmptyResult {
        self.acker
            .reject(BasicRejectOptions { requeue: false })
            .await?;
        Ok(())
    }
}

impl JsonQueueEntry for AmqpQueueEntry {}
