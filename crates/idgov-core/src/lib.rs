//! idgov Core: shared entity event abstractions.
//!
//! This crate defines the types and traits every bounded context and the
//! event engine depend on: event types, the event envelope, the property
//! bag, the processor contract and the persistence/workflow seams. It
//! contains no infrastructure code.

pub mod clock;
pub mod error;
pub mod event;
pub mod event_type;
pub mod processor;
pub mod properties;
pub mod publisher;
pub mod store;
pub mod workflow;
