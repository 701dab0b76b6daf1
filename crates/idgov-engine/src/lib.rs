//! idgov Engine: the entity event processing engine.
//!
//! A business action wraps its mutation in an [`Event`](idgov_core::event::Event)
//! and publishes it through an [`EventEngine`]. The engine asks the
//! [`ProcessorRegistry`] for the processors supporting the event type, builds
//! a deterministically ordered chain and runs it. A processor may suspend the
//! chain; the engine then persists a continuation and returns. A later
//! [`EventEngine::resume`] (usually a workflow callback routed through
//! [`CallbackRouter`]) continues with the processor after the last completed
//! one. [`RecoverySweep`] cancels chains interrupted by an unclean shutdown.

pub mod approval;
pub mod callback;
pub mod chain;
pub mod config;
pub mod engine;
pub mod lifecycle;
pub mod recovery;
pub mod registry;

pub use approval::{
    AWAITING_APPROVAL, ApprovalDecisionProcessor, DECISION_APPROVE, DECISION_REJECT,
    WorkflowApprovalProcessor,
};
pub use callback::{
    CallbackListener, CallbackOutcome, CallbackRouter, EventResumer, WorkflowCallback,
};
pub use config::{ConfigError, EngineConfig};
pub use engine::EventEngine;
pub use recovery::{RECOVERY_MESSAGE, RecoveryReport, RecoverySweep};
pub use registry::ProcessorRegistry;

#[cfg(test)]
mod fixtures;
