use anyhow::Result;
use options::{Command, LogFormat};
use ordergrid::harness::ModuleRunner;
use ordergrid::module::orders::Orders;
use ordergrid::module::users::Users;
use structopt::StructOpt;
use tracing::{error, info};

mod options;

#[tokio::main]
async fn main() -> Result<()> {
    let (command, runner) = init()?;

    let termination_reason = match command {
        Command::Users(options) => runner.run(Users::new(options)).await,
        Command::Orders(options) => runner.run(Orders::new(options)).await,
    };

    // Supervisors are expected to restart the process
    if termination_reason.is_failure() {
        error!(%termination_reason, "Exiting with failure");
        std::process::exit(1);
    }

    Ok(())
}

fn init() -> Result<(options::Command, ModuleRunner)> {
    let options = options::MainOptions::from_args();

    let formatter = tracing_subscriber::fmt().with_env_filter(options.log);

    match options.log_format {
        LogFormat::Text => formatter.init(),
        LogFormat::Compact => formatter.compact().init(),
        LogFormat::Json => formatter.json().init(),
    };

    let runner = match options.status_server {
        Some(port) => ModuleRunner::new_with_status_server(port),
        None => ModuleRunner::default(),
    };

    info!("ordergrid {}", env!("CARGO_PKG_VERSION"));

    Ok((options.command, runner))
}
