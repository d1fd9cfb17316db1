use crate::constants;
use crate::module::options::{BrokerOptions, ConfigError, DatabaseOptions, RoutingOptions};
use structopt::StructOpt;

/// Options for the users module
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

    /// Port on which the HTTP API is served
    #[structopt(short, long, env = "PORT", default_value = constants::PORT_USERS)]
    pub port: u16,
}

impl Options {
    /// Checks all options, called once on startup
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.broker.validate()?;
        self.routing.validate()
    }
}
