use super::HeartStone;
use crate::library::communication::event::{QueueDescriptor, RoutingTable};
use crate::library::communication::implementation::amqp::{
    BrokerConnector, BrokerSession, BrokerTransport, DisconnectAlarm, SessionSlot,
};
use crate::library::{BoxedError, EmptyResult};
use async_trait::async_trait;
use jatsl::{Job, JobManager};
use lapin::Connection;
use std::sync::Arc;
use tracing::{error, info};

/// Job which owns the process-wide [`BrokerSession`]
///
/// The session is established in the background so that other jobs (e.g. HTTP servers) become
/// available right away. The queues consumed by the process are declared before the session is
/// handed out through the [`SessionSlot`]. From then on it is kept
/// until the job is terminated. Failing to establish the session or losing it later on kills the
/// [`Heart`](super::Heart) linked to the provided stone.
pub struct BrokerJob<T> {
    connector: BrokerConnector<T>,
    exchange: String,
    routing: RoutingTable,
    queues: Vec<QueueDescriptor>,
    slot: SessionSlot,
    stone: HeartStone,
}

impl<T> BrokerJob<T>
where
    T: BrokerTransport<Connection = Connection> + Send + Sync,
{
    /// Creates a new instance from raw parts
    pub fn new(
        connector: BrokerConnector<T>,
        exchange: String,
        routing: RoutingTable,
        queues: Vec<QueueDescriptor>,
        slot: SessionSlot,
        stone: HeartStone,
    ) -> Self {
        Self {
            connector,
            exchange,
            routing,
            queues,
            slot,
            stone,
        }
    }

    async fn establish(&self, alarm: DisconnectAlarm) -> Result<BrokerSession, BoxedError> {
        let connection = self.connector.connect(alarm.clone()).await?;

        match BrokerSession::establish(
            connection,
            self.exchange.clone(),
            self.routing.clone(),
            &self.queues,
            alarm.clone(),
        )
        .await
        {
            Ok(session) => Ok(session),
            Err(error) => {
                alarm.disarm();
                Err(error.into())
            }
        }
    }
}

#[async_trait]
impl<T> Job for BrokerJob<T>
where
    T: BrokerTransport<Connection = Connection> + Send + Sync + 'static,
{
    const NAME: &'static str = module_path!();
    const SUPPORTS_GRACEFUL_TERMINATION: bool = true;

    async fn execute(&self, manager: JobManager) -> EmptyResult {
        manager.ready().await;

        let termination = manager.termination_signal();
        tokio::pin!(termination);

        let stone = self.stone.clone();
        let alarm = DisconnectAlarm::new(move |failure| stone.kill_now(failure.to_string()));

        let session = tokio::select! {
            biased;
            _ = &mut termination => return Ok(()),
            session = self.establish(alarm) => session,
        };

        let session = match session {
            Ok(session) => Arc::new(session),
            Err(error) => {
                error!(%error, "Unable to establish broker session");
                self.stone.kill_now(error.to_string());
                termination.await;
                return Ok(());
            }
        };

        info!(exchange = session.exchange(), "Broker session established");
        self.slot.fill(session.clone());

        termination.await;

        self.slot.clear();
        session.close().await;

        Ok(())
    }
}

#[cfg(test)]
mod does {
    use super::*;
    use crate::harness::{DeathReason, Heart};
    use crate::library::communication::implementation::amqp::{session_slot, RetryPolicy};
    use std::time::Duration;
    use tokio::time::timeout;

    struct RefusingTransport;

    #[async_trait]
    impl BrokerTransport for RefusingTransport {
        type Connection = Connection;

        async fn open(&self, _url: &str) -> Result<Self::Connection, BoxedError> {
            Err("connection refused".into())
        }

        fn watch(&self, _connection: &Self::Connection, _alarm: DisconnectAlarm) {}
    }

    #[tokio::test]
    async fn kill_heart_when_broker_is_unreachable() {
        let (mut heart, stone) = Heart::new();
        let (slot, handle) = session_slot();
        let connector = BrokerConnector::new(
            RefusingTransport,
            "amqp://localhost".into(),
            RetryPolicy::new(2, Duration::from_millis(10)),
        );
        let job = BrokerJob::new(
            connector,
            "events".into(),
            RoutingTable::default(),
            Vec::new(),
            slot,
            stone,
        );

        let (manager, _, _, termination) = JobManager::new(0, ());
        let execution = tokio::spawn(async move { job.execute(manager).await });

        let reason = timeout(Duration::from_secs(5), heart.death()).await.unwrap();

        assert!(matches!(reason, DeathReason::Killed(_)));
        assert!(handle.session().is_none());

        termination.send(Some(())).unwrap();
        execution.await.unwrap().unwrap();
    }
}
