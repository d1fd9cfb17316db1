use crate::library::BoxedError;
use async_trait::async_trait;
use lapin::{Connection, ConnectionProperties};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::time::sleep;
use tracing::{debug, error, info, instrument, warn};

/// Connection attempts have been exhausted
#[derive(Debug, Error)]
#[error("unable to connect to broker after {attempts} attempts")]
pub struct ConnectError {
    /// Number of attempts that have been made
    pub attempts: u32,
    /// Error of the last attempt
    #[source]
    pub source: BoxedError,
}

/// Fatal condition of an established broker connection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrokerFailure {
    reason: String,
}

impl BrokerFailure {
    /// Creates a new instance with a human readable reason
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }

    /// Human readable description of what went wrong
    pub fn reason(&self) -> &str {
        &self.reason
    }
}

impl fmt::Display for BrokerFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "broker connection lost: {}", self.reason)
    }
}

struct AlarmState {
    armed: AtomicBool,
    fired: AtomicBool,
    handler: Box<dyn Fn(BrokerFailure) + Send + Sync>,
}

/// Raises a fatal condition at most once
///
/// Connections report errors through callbacks which may fire repeatedly (e.g. an IO error
/// followed by the close of the connection). The alarm forwards only the first one to its handler.
/// Once [disarmed](DisconnectAlarm::disarm) (usually right before a deliberate close) nothing is
/// forwarded anymore.
#[derive(Clone)]
pub struct DisconnectAlarm {
    state: Arc<AlarmState>,
}

impl DisconnectAlarm {
    /// Creates a new, armed alarm which calls the handler when triggered
    pub fn new<F>(handler: F) -> Self
    where
        F: Fn(BrokerFailure) + Send + Sync + 'static,
    {
        Self {
            state: Arc::new(AlarmState {
                armed: AtomicBool::new(true),
                fired: AtomicBool::new(false),
                handler: Box::new(handler),
            }),
        }
    }

    /// Raises the fatal condition unless it has already been raised or the alarm is disarmed.
    /// Returns whether the handler has been called.
    pub fn trigger(&self, failure: BrokerFailure) -> bool {
        if !self.state.armed.load(Ordering::SeqCst) {
            debug!(%failure, "Ignoring failure of disarmed connection");
            return false;
        }

        if self
            .state
            .fired
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            debug!(%failure, "Ignoring repeated connection failure");
            return false;
        }

        error!(%failure, "Unexpected broker disconnect");
        (self.state.handler)(failure);
        true
    }

    /// Prevents any further failures from being raised
    pub fn disarm(&self) {
        self.state.armed.store(false, Ordering::SeqCst);
    }
}

/// Transport which is able to open connections to a broker
#[async_trait]
pub trait BrokerTransport {
    /// Connection type returned by the transport
    type Connection: Send + Sync;

    /// Makes a single attempt to open a connection
    async fn open(&self, url: &str) -> Result<Self::Connection, BoxedError>;

    /// Arranges for the alarm to be triggered once the connection fails or closes unexpectedly
    fn watch(&self, connection: &Self::Connection, alarm: DisconnectAlarm);
}

/// [`BrokerTransport`] implementation using [`lapin`]
#[derive(Default, Clone)]
pub struct LapinTransport {}

#[async_trait]
impl BrokerTransport for LapinTransport {
    type Connection = Connection;

    async fn open(&self, url: &str) -> Result<Self::Connection, BoxedError> {
        Ok(Connection::connect(url, ConnectionProperties::default()).await?)
    }

    /// Lapin reports both connection level errors and closes initiated by the broker
    /// through the error callback.
    fn watch(&self, connection: &Self::Connection, alarm: DisconnectAlarm) {
        connection.on_error(move |error| {
            alarm.trigger(BrokerFailure::new(error.to_string()));
        });
    }
}

/// Parameters for repeated connection attempts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    ceiling: u32,
    delay: Duration,
}

impl RetryPolicy {
    /// Creates a policy making at most `ceiling` attempts with a fixed `delay` in between.
    /// A ceiling of zero is treated as a single attempt.
    pub fn new(ceiling: u32, delay: Duration) -> Self {
        Self {
            ceiling: ceiling.max(1),
            delay,
        }
    }

    /// Maximum number of attempts
    pub fn ceiling(&self) -> u32 {
        self.ceiling
    }

    /// Pause between two consecutive attempts
    pub fn delay(&self) -> Duration {
        self.delay
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(10, Duration::from_secs(5))
    }
}

/// Establishes broker connections with a bounded number of attempts
pub struct BrokerConnector<T> {
    transport: T,
    url: String,
    policy: RetryPolicy,
}

impl<T> BrokerConnector<T>
where
    T: BrokerTransport + Send + Sync,
{
    /// Creates a new instance from raw parts
    pub fn new(transport: T, url: String, policy: RetryPolicy) -> Self {
        Self {
            transport,
            url,
            policy,
        }
    }

    /// Connects to the broker, retrying with a fixed delay until the policy's ceiling is reached.
    ///
    /// The returned connection is watched by the given alarm.
    #[instrument(skip(self, alarm), fields(ceiling = self.policy.ceiling()))]
    pub async fn connect(&self, alarm: DisconnectAlarm) -> Result<T::Connection, ConnectError> {
        let mut attempt = 0;

        loop {
            attempt += 1;
            debug!(attempt, "Connecting to broker");

            match self.transport.open(&self.url).await {
                Ok(connection) => {
                    info!(attempt, "Connected to broker");
                    self.transport.watch(&connection, alarm);
                    return Ok(connection);
                }
                Err(error) if attempt >= self.policy.ceiling() => {
                    error!(attempt, %error, "Giving up connecting to broker");
                    return Err(ConnectError {
                        attempts: attempt,
                        source: error,
                    });
                }
                Err(error) => {
                    warn!(
                        attempt,
                        %error,
                        "Failed to connect to broker, retrying in {:?}",
                        self.policy.delay()
                    );
                    sleep(self.policy.delay()).await;
                }
            }
        }
    }
}

#[cfg(test)]
mod does {
    use super::*;
    use std::sync::atomic::AtomicU32;
    use std::sync::Mutex;
    use tokio::time::Instant;

    #[derive(Default)]
    struct FlakyTransport {
        failures_before_success: Option<u32>,
        attempts: AtomicU32,
        attempt_times: Mutex<Vec<Instant>>,
        watched: Mutex<Option<DisconnectAlarm>>,
    }

    impl FlakyTransport {
        fn failing_forever() -> Self {
            Self::default()
        }

        fn succeeding_after(failures: u32) -> Self {
            Self {
                failures_before_success: Some(failures),
                ..Default::default()
            }
        }

        fn attempts(&self) -> u32 {
            self.attempts.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl BrokerTransport for Arc<FlakyTransport> {
        type Connection = u32;

        async fn open(&self, _url: &str) -> Result<Self::Connection, BoxedError> {
            let attempt = self.attempts.fetch_add(1, Ordering::SeqCst) + 1;
            self.attempt_times.lock().unwrap().push(Instant::now());

            match self.failures_before_success {
                Some(failures) if attempt > failures => Ok(attempt),
                _ => Err("connection refused".into()),
            }
        }

        fn watch(&self, _connection: &Self::Connection, alarm: DisconnectAlarm) {
            *self.watched.lock().unwrap() = Some(alarm);
        }
    }

    fn counting_alarm() -> (DisconnectAlarm, Arc<AtomicU32>) {
        let count = Arc::new(AtomicU32::new(0));
        let handler_count = count.clone();
        let alarm = DisconnectAlarm::new(move |_| {
            handler_count.fetch_add(1, Ordering::SeqCst);
        });

        (alarm, count)
    }

    #[tokio::test]
    async fn respect_retry_ceiling() {
        tokio::time::pause();

        let delay = Duration::from_millis(5000);
        let transport = Arc::new(FlakyTransport::failing_forever());
        let connector = BrokerConnector::new(
            transport.clone(),
            "amqp://localhost".into(),
            RetryPolicy::new(4, delay),
        );
        let (alarm, _) = counting_alarm();

        let result = connector.connect(alarm).await;

        assert_eq!(result.unwrap_err().attempts, 4);
        assert_eq!(transport.attempts(), 4);

        let times = transport.attempt_times.lock().unwrap();
        for pair in times.windows(2) {
            assert!(pair[1] - pair[0] >= delay);
        }
    }

    #[tokio::test]
    async fn connect_after_transient_failures() {
        tokio::time::pause();

        let transport = Arc::new(FlakyTransport::succeeding_after(2));
        let connector = BrokerConnector::new(
            transport.clone(),
            "amqp://localhost".into(),
            RetryPolicy::new(10, Duration::from_secs(1)),
        );
        let (alarm, _) = counting_alarm();

        let connection = connector.connect(alarm).await.unwrap();

        assert_eq!(connection, 3);
        assert_eq!(transport.attempts(), 3);
        assert!(transport.watched.lock().unwrap().is_some());
    }

    #[tokio::test]
    async fn treat_zero_ceiling_as_single_attempt() {
        let transport = Arc::new(FlakyTransport::failing_forever());
        let connector = BrokerConnector::new(
            transport.clone(),
            "amqp://localhost".into(),
            RetryPolicy::new(0, Duration::from_secs(1)),
        );
        let (alarm, _) = counting_alarm();

        assert!(connector.connect(alarm).await.is_err());
        assert_eq!(transport.attempts(), 1);
    }

    #[tokio::test]
    async fn raise_disconnect_exactly_once() {
        let transport = Arc::new(FlakyTransport::succeeding_after(0));
        let connector = BrokerConnector::new(
            transport.clone(),
            "amqp://localhost".into(),
            RetryPolicy::default(),
        );
        let (alarm, count) = counting_alarm();

        connector.connect(alarm).await.unwrap();

        let watched = transport.watched.lock().unwrap().clone().unwrap();
        assert!(watched.trigger(BrokerFailure::new("connection reset by peer")));
        assert!(!watched.trigger(BrokerFailure::new("connection closed")));

        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn stay_silent_when_disarmed() {
        let (alarm, count) = counting_alarm();

        alarm.disarm();

        assert!(!alarm.trigger(BrokerFailure::new("connection closed")));
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }
}
