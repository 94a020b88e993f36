//! Inbound adapters: HTTP for clients and AMQP for reindex deliveries.

pub mod amqp;
pub mod http;
