//! Domain primitives, aggregates, and services.
//!
//! Purpose: define the place directory entities and the services that
//! orchestrate them through ports. Types here are transport agnostic; the
//! inbound and outbound adapters translate to HTTP, AMQP, and Redis.
//!
//! Public surface:
//! - `Place`, `PlaceDraft`, `Category`, `CategoryDraft`: directory entities.
//! - `EntityId`: time-ordered identifier shared by all entities.
//! - `RequestContext`: cancellation scope for calls that wait on I/O.
//! - `PlaceService`: implements the place driving ports.
//! - `CategoryService`: implements category mutations.
//! - `ReindexHandler`: decides how a consumed reindex delivery is settled.

pub mod category;
pub mod category_service;
pub mod entity_id;
pub mod error;
pub mod place;
pub mod place_service;
pub mod ports;
pub mod reindex_consumer;
pub mod request_context;
pub(crate) mod slug;

pub use self::category::{Category, CategoryDraft, CategoryValidationError};
pub use self::category_service::CategoryService;
pub use self::entity_id::{EntityId, EntityIdError};
pub use self::error::{Error, ErrorCode, ErrorValidationError};
pub use self::place::{Place, PlaceDraft, PlaceParts, PlaceValidationError};
pub use self::place_service::{
    DEFAULT_REINDEX_TIMEOUT, LIST_PLACES_CACHE_KEY, PLACES_CACHE_TTL, PlaceService,
    PlaceServicePorts, SEARCH_PLACES_CACHE_PREFIX,
};
pub use self::reindex_consumer::{ConsumerAction, ReindexDelivery, ReindexHandler};
pub use self::request_context::{ContextError, RequestContext};
