//! Outbound adapters implementing domain ports for external infrastructure.
//!
//! - **broker**: AMQP publish channel in confirm mode (lapin)
//! - **queue**: broker-confirmed reindex publisher
//! - **cache**: Redis-backed listing cache (bb8-redis)
//! - **persistence**: in-process place and category repositories
//! - **indexer**: search index placeholder that logs operations
//! - **metrics**: Prometheus counters for reindex outcomes
//!
//! Adapters are thin translators between domain types and infrastructure
//! representations. They contain no business logic.

pub mod broker;
pub mod cache;
pub mod indexer;
pub mod metrics;
pub mod persistence;
pub mod queue;
