//! Place directory backend.
//!
//! Places and categories are served over HTTP. Every mutation is written,
//! its cached listings are invalidated, and a reindex request is published
//! to the broker; the request only succeeds once the broker confirms that
//! exact message. A consumer on the same queue refreshes the search index.

pub mod config;
pub mod doc;
pub mod domain;
pub mod inbound;
pub mod middleware;
pub mod outbound;

/// Public OpenAPI surface used by Swagger UI and tooling.
pub use doc::ApiDoc;
pub use middleware::Trace;
