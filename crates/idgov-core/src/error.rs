//! Domain error types.

use thiserror::Error;
use uuid::Uuid;

use crate::event_type::EventState;

/// Top-level domain error type.
#[derive(Debug, Error)]
pub enum DomainError {
    /// No event with the given identifier exists in the store.
    #[error("event not found: {0}")]
    EventNotFound(Uuid),

    /// Optimistic concurrency conflict on a stored event row.
    #[error("concurrency conflict on event {event_id}: expected version {expected}, found {actual}")]
    ConcurrencyConflict {
        /// The event that had the conflict.
        event_id: Uuid,
        /// The expected version.
        expected: i64,
        /// The actual version found.
        actual: i64,
    },

    /// A lifecycle transition that the state machine does not allow.
    #[error("invalid transition for event {event_id}: {from} -> {to}")]
    InvalidTransition {
        /// The event being transitioned.
        event_id: Uuid,
        /// Current state.
        from: EventState,
        /// Requested state.
        to: EventState,
    },

    /// A stored event belongs to another domain than the one loading it.
    #[error("event {event_id} is owned by {actual}, expected {expected}")]
    TypeMismatch {
        /// The event that was loaded.
        event_id: Uuid,
        /// The owner type of the loading engine.
        expected: String,
        /// The owner type found on the row.
        actual: String,
    },

    /// A processor failed while evaluating its condition or processing.
    #[error("processor {processor} failed on event {event_id}: {source}")]
    ProcessorFailed {
        /// Identifier of the failing processor.
        processor: String,
        /// The event being processed.
        event_id: Uuid,
        /// The underlying failure.
        #[source]
        source: Box<DomainError>,
    },

    /// A validation error in domain logic.
    #[error("validation error: {0}")]
    Validation(String),

    /// An external decision rejected the operation.
    #[error("rejected: {0}")]
    Rejected(String),

    /// An infrastructure/persistence error.
    #[error("infrastructure error: {0}")]
    Infrastructure(String),
}

impl DomainError {
    /// Wraps `self` as the failure of `processor` on `event_id`.
    ///
    /// Errors that are already processor failures (for example from a nested
    /// sub-event) are wrapped again so the outermost processor is reported.
    #[must_use]
    pub fn in_processor(self, processor: &str, event_id: Uuid) -> Self {
        Self::ProcessorFailed {
            processor: processor.to_owned(),
            event_id,
            source: Box::new(self),
        }
    }

    /// Returns the innermost cause of a chain of processor failures.
    #[must_use]
    pub fn root_cause(&self) -> &DomainError {
        match self {
            Self::ProcessorFailed { source, .. } => source.root_cause(),
            other => other,
        }
    }
}

impl From<serde_json::Error> for DomainError {
    fn from(err: serde_json::Error) -> Self {
        Self::Infrastructure(format!("serialization failed: {err}"))
    }
}
