use super::EntityCache;
use crate::library::http::{ProbeError, StatusProbe};
use crate::library::BoxedError;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, instrument, warn};

/// Definitive answer of a dependency about a referenced entity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupVerdict {
    /// The dependency knows the entity
    Found,
    /// The dependency denied knowing the entity
    NotFound,
}

/// The dependency did not provide a definitive answer
#[derive(Debug, Error)]
pub enum LookupError {
    /// No answer within the deadline
    #[error("dependency did not respond within {0:?}")]
    Timeout(Duration),
    /// The dependency could not be reached at all
    #[error("dependency is unreachable")]
    Unreachable(#[source] BoxedError),
}

/// Synchronous source of truth for foreign entities
#[async_trait]
pub trait DependencyLookup: Send + Sync {
    /// Asks the dependency whether the entity with the given identifier exists
    async fn lookup(&self, id: &str) -> Result<LookupVerdict, LookupError>;
}

/// [`DependencyLookup`] which requests `GET <base_url>/<id>` from another service
///
/// Any 2xx status means the entity exists, every other status that the service responds with
/// means it does not.
pub struct HttpDependencyLookup {
    base_url: String,
    probe: StatusProbe,
}

impl HttpDependencyLookup {
    /// Creates a new instance giving up on requests after `timeout`
    pub fn new(base_url: &str, timeout: Duration) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_owned(),
            probe: StatusProbe::new(timeout),
        }
    }
}

#[async_trait]
impl DependencyLookup for HttpDependencyLookup {
    async fn lookup(&self, id: &str) -> Result<LookupVerdict, LookupError> {
        // Anything else could address a different resource than the entity itself
        if !is_path_segment(id) {
            debug!(id, "Identifier is not a plain path segment");
            return Ok(LookupVerdict::NotFound);
        }

        let url = format!("{}/{}", self.base_url, id);

        match self.probe.status(&url).await {
            Ok(status) if status.is_success() => Ok(LookupVerdict::Found),
            Ok(status) => {
                debug!(%status, url = url.as_str(), "Dependency denied entity");
                Ok(LookupVerdict::NotFound)
            }
            // Identifiers that do not fit into a path can not belong to any entity
            Err(ProbeError::InvalidUri(_)) => Ok(LookupVerdict::NotFound),
            Err(ProbeError::Timeout(deadline)) => Err(LookupError::Timeout(deadline)),
            Err(error) => Err(LookupError::Unreachable(error.into())),
        }
    }
}

/// Whether the identifier consists only of unreserved URI characters and is no dot-segment
fn is_path_segment(id: &str) -> bool {
    !id.is_empty()
        && id != "."
        && id != ".."
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '.' | '_' | '~'))
}

/// Reasons why a foreign reference has not been accepted
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    /// The dependency definitively denied the existence of the entity
    #[error("referenced entity does not exist")]
    Invalid,
    /// The dependency could not answer and the entity is not cached either
    #[error("dependency unavailable and referenced entity unknown")]
    Unavailable,
}

/// Hybrid policy validating references to entities owned by another service
///
/// The dependency is asked synchronously first. Only if it can not give a definitive answer the
/// local [`EntityCache`], which is fed by notifications, is used as a fallback. A definitive
/// negative answer always wins over the cache.
pub struct DependencyValidator<T> {
    lookup: Box<dyn DependencyLookup>,
    cache: Arc<dyn EntityCache<T>>,
}

impl<T> DependencyValidator<T> {
    /// Creates a new instance from raw parts
    pub fn new(lookup: Box<dyn DependencyLookup>, cache: Arc<dyn EntityCache<T>>) -> Self {
        Self { lookup, cache }
    }

    /// Validates a reference to a foreign entity
    #[instrument(skip(self))]
    pub async fn validate(&self, id: &str) -> Result<(), ValidationError> {
        match self.lookup.lookup(id).await {
            Ok(LookupVerdict::Found) => Ok(()),
            Ok(LookupVerdict::NotFound) => Err(ValidationError::Invalid),
            Err(error) => {
                warn!(%error, "Dependency lookup failed, falling back to cache");

                if self.cache.get(id).is_some() {
                    debug!("Referenced entity found in cache");
                    Ok(())
                } else {
                    Err(ValidationError::Unavailable)
                }
            }
        }
    }
}
