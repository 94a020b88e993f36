//! Shared HTTP adapter state.
//!
//! HTTP handlers accept this state via `actix_web::web::Data` so they only
//! depend on domain ports (use-cases) and remain testable without I/O.

use std::sync::Arc;
use std::time::Duration;

use crate::domain::RequestContext;
use crate::domain::ports::{CategoriesCommand, PlacesCommand, PlacesQuery};

/// Upper bound on how long a handler waits on its use-case.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Parameter object bundling the port implementations for HTTP handlers.
#[derive(Clone)]
pub struct HttpStatePorts {
    pub places: Arc<dyn PlacesCommand>,
    pub places_query: Arc<dyn PlacesQuery>,
    pub categories: Arc<dyn CategoriesCommand>,
}

/// Dependency bundle for HTTP handlers.
#[derive(Clone)]
pub struct HttpState {
    pub places: Arc<dyn PlacesCommand>,
    pub places_query: Arc<dyn PlacesQuery>,
    pub categories: Arc<dyn CategoriesCommand>,
    request_timeout: Duration,
}

impl HttpState {
    /// Construct state using [`DEFAULT_REQUEST_TIMEOUT`].
    pub fn new(ports: HttpStatePorts) -> Self {
        let HttpStatePorts {
            places,
            places_query,
            categories,
        } = ports;
        Self {
            places,
            places_query,
            categories,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    /// Override the per-request timeout.
    #[must_use]
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Fresh cancellation scope for one request.
    pub fn request_context(&self) -> RequestContext {
        RequestContext::with_timeout(self.request_timeout)
    }
}

impl From<HttpStatePorts> for HttpState {
    fn from(ports: HttpStatePorts) -> Self {
        Self::new(ports)
    }
}
