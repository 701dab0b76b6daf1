//! Shared test mocks and utilities for the idgov event engine.

mod clock;
mod processor;
mod store;
mod workflow;

pub use clock::{FixedClock, fixed_now};
pub use processor::{InvocationJournal, ScriptedProcessor};
pub use store::FailingEventStore;
pub use workflow::{FailingWorkflowService, RecordingWorkflowService};
