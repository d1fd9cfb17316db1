use hyper::client::HttpConnector;
use hyper::http::uri::InvalidUri;
use hyper::{Body, Client, Request, StatusCode, Uri};
use std::time::Duration;
use thiserror::Error;
use tokio::time::timeout;
use tracing::trace;

/// Reasons why a [`StatusProbe`] did not yield a status code
#[derive(Debug, Error)]
pub enum ProbeError {
    /// The remote did not respond within the deadline
    #[error("no response within {0:?}")]
    Timeout(Duration),
    /// The remote could not be reached
    #[error("remote unreachable")]
    Unreachable(#[from] hyper::Error),
    /// The target could not be parsed into a valid URI
    #[error("invalid target uri")]
    InvalidUri(#[from] InvalidUri),
    /// The request could not be assembled
    #[error("unable to build request")]
    Request(#[from] hyper::http::Error),
}

/// Sends `GET` requests with a bounded deadline and reports the response status
///
/// The body of the response is discarded, only the status code is relevant. Once the deadline
/// passes the in-flight request future is dropped which cancels the request.
#[derive(Clone)]
pub struct StatusProbe {
    client: Client<HttpConnector>,
    deadline: Duration,
}

impl StatusProbe {
    /// Creates a new probe which gives up after `deadline`
    pub fn new(deadline: Duration) -> Self {
        Self {
            client: Client::new(),
            deadline,
        }
    }

    /// Maximum duration a single probe may take
    pub fn deadline(&self) -> Duration {
        self.deadline
    }

    /// Requests the given URL and returns the status code of the response
    pub async fn status(&self, url: &str) -> Result<StatusCode, ProbeError> {
        let uri = url.parse::<Uri>()?;
        let request = Request::get(uri).body(Body::empty())?;

        trace!(url, "Sending probe request");
        match timeout(self.deadline, self.client.request(request)).await {
            Ok(response) => Ok(response?.status()),
            Err(_) => Err(ProbeError::Timeout(self.deadline)),
        }
    }
}
