use crate::library::EmptyResult;
use async_trait::async_trait;
use jatsl::{Job, JobManager};
use std::net::SocketAddr;
use tracing::info;
use warp::filters::BoxedFilter;
use warp::reply::Response;
use warp::Filter;

/// Job serving a set of [`warp`] routes over HTTP
pub struct ServerJob {
    port: u16,
    routes: BoxedFilter<(Response,)>,
}

impl ServerJob {
    /// Creates a new instance listening on all interfaces
    pub fn new(port: u16, routes: BoxedFilter<(Response,)>) -> Self {
        Self { port, routes }
    }
}

#[async_trait]
impl Job for ServerJob {
    const NAME: &'static str = module_path!();
    const SUPPORTS_GRACEFUL_TERMINATION: bool = true;

    async fn execute(&self, manager: JobManager) -> EmptyResult {
        let routes = self.routes.clone().with(warp::trace::request());

        let source_addr: SocketAddr = ([0, 0, 0, 0], self.port).into();
        let (addr, server) = warp::serve(routes)
            .try_bind_with_graceful_shutdown(source_addr, manager.termination_signal())?;

        info!(?addr, "Serving HTTP API");
        manager.ready().await;
        server.await;

        Ok(())
    }
}
