//! Declaration of exchanges, queues and bindings
//!
//! All declarations are durable and idempotent. Declaring an entity that already exists with the
//! same parameters is a no-op on the broker, thus the functions in this module are safe to call on
//! every startup.

use super::DEFAULT_PREFETCH;
use lapin::options::{
    BasicQosOptions, ExchangeDeclareOptions, QueueBindOptions, QueueDeclareOptions,
};
use lapin::types::FieldTable;
use lapin::{Channel, Connection, ExchangeKind};
use tracing::{debug, instrument};

/// Opens a channel on the connection and declares a durable topic exchange on it
#[instrument(skip(connection))]
pub async fn setup_exchange(
    connection: &Connection,
    exchange: &str,
) -> Result<Channel, lapin::Error> {
    let channel = connection.create_channel().await?;

    channel
        .exchange_declare(
            exchange,
            ExchangeKind::Topic,
            ExchangeDeclareOptions {
                durable: true,
                ..ExchangeDeclareOptions::default()
            },
            FieldTable::default(),
        )
        .await?;

    debug!("Declared exchange");

    Ok(channel)
}

/// Declares a durable queue and binds it to the exchange once for every routing key
#[instrument(skip(channel))]
pub async fn setup_queue(
    channel: &Channel,
    queue: &str,
    exchange: &str,
    routing_keys: &[String],
) -> Result<(), lapin::Error> {
    channel
        .queue_declare(
            queue,
            QueueDeclareOptions {
                durable: true,
                ..QueueDeclareOptions::default()
            },
            FieldTable::default(),
        )
        .await?;

    for routing_key in routing_keys {
        channel
            .queue_bind(
                queue,
                exchange,
                routing_key,
                QueueBindOptions::default(),
                FieldTable::default(),
            )
            .await?;

        debug!(%routing_key, "Bound queue");
    }

    Ok(())
}

/// Limits the number of unacknowledged deliveries in flight on the channel
pub async fn limit_prefetch(channel: &Channel) -> Result<(), lapin::Error> {
    channel
        .basic_qos(DEFAULT_PREFETCH, BasicQosOptions::default())
        .await
}
