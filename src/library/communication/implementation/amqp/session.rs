use super::{topology, DisconnectAlarm, REPLY_SUCCESS};
use crate::library::communication::event::{QueueDescriptor, RoutingTable};
use lapin::{Channel, Connection};
use tracing::{debug, info, instrument, warn};

/// Single broker connection shared by everything within a process
///
/// A session is only handed out after the exchange and all queues consumed by the process have
/// been declared on its channel. From then on it is used read-only by publishers and consumers.
pub struct BrokerSession {
    connection: Connection,
    channel: Channel,
    exchange: String,
    routing: RoutingTable,
    alarm: DisconnectAlarm,
}

impl BrokerSession {
    /// Declares the exchange on a freshly opened channel of the connection. Each queue is declared
    /// and bound to the routing keys of its topics, after which the prefetch limit is applied.
    #[instrument(skip(connection, routing, queues, alarm))]
    pub async fn establish(
        connection: Connection,
        exchange: String,
        routing: RoutingTable,
        queues: &[QueueDescriptor],
        alarm: DisconnectAlarm,
    ) -> Result<Self, lapin::Error> {
        let channel = topology::setup_exchange(&connection, &exchange).await?;

        for queue in queues {
            let routing_keys = routing.resolve_all(queue.bindings());
            topology::setup_queue(&channel, queue.name(), &exchange, &routing_keys).await?;
            debug!(queue = queue.name(), ?routing_keys, "Declared queue");
        }

        if !queues.is_empty() {
            topology::limit_prefetch(&channel).await?;
        }

        Ok(Self {
            connection,
            channel,
            exchange,
            routing,
            alarm,
        })
    }

    /// Channel on which all operations are executed
    pub fn channel(&self) -> &Channel {
        &self.channel
    }

    /// Name of the exchange to which notifications are published
    pub fn exchange(&self) -> &str {
        &self.exchange
    }

    /// Routing table translating topics into routing keys
    pub fn routing(&self) -> &RoutingTable {
        &self.routing
    }

    /// Closes the connection without raising the disconnect alarm. Failures are only logged.
    #[instrument(skip(self))]
    pub async fn close(&self) {
        self.alarm.disarm();

        match self.connection.close(REPLY_SUCCESS, "shutdown").await {
            Ok(_) => info!("Closed broker connection"),
            Err(error) => warn!(%error, "Failed to close broker connection"),
        }
    }
}
