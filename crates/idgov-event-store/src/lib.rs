//! idgov event store: durable continuation records for entity events.
//!
//! [`PgEventStore`] is the production store; [`InMemoryEventStore`] backs
//! tests and embedded use.

pub mod memory_event_store;
pub mod pg_event_store;
pub mod schema;

pub use memory_event_store::InMemoryEventStore;
pub use pg_event_store::PgEventStore;
