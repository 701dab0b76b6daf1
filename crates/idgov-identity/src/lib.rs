//! idgov IDENTITY bounded context.
//!
//! Identity changes run through validation, an optional approval and the
//! save step. Once an identity event has executed, its close chain
//! publishes `ACCOUNT.*` sub-events that carry the change to the target
//! systems.

pub mod application;
pub mod domain;
