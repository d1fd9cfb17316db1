use crate::constants;
use crate::module::options::{
    BrokerOptions, ConfigError, DatabaseOptions, DependencyOptions, RoutingOptions,
};
use structopt::StructOpt;

/// Options for the orders module
#[derive(Debug, StructOpt)]
pub struct Options {
    #[allow(missing_docs)]
    #[structopt(flatten)]
    pub broker: BrokerOptions,

    #[allow(missing_docs)]
    #[structopt(flatten)]
    pub routing: RoutingOptions,

    #[allow(missing_docs)]
    #[structopt(flatten)]
    pub database: DatabaseOptions,

    #[allow(missing_docs)]
    #[structopt(flatten)]
    pub dependency: DependencyOptions,

    /// Durable queue through which user notifications are received.
    /// It is shared by all instances of the service.
    #[structopt(long, env = "QUEUE", default_value = constants::QUEUE_ORDERS)]
    pub queue: String,

    /// Port on which the HTTP API is served
    #[structopt(short, long, env = "PORT", default_value = constants::PORT_ORDERS)]
    pub port: u16,
}

impl Options {
    /// Checks all options, called once on startup
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.broker.validate()?;
        self.routing.validate()?;
        self.dependency.validate()?;

        if self.queue.is_empty() {
            return Err(ConfigError::Empty("QUEUE"));
        }

        Ok(())
    }
}
