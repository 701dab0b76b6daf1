//! Publishing seam between business code and the engine.

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::DomainError;
use crate::event::Event;
use crate::event_type::{EventState, EventType};
use crate::properties::EventProperties;

/// Result of publishing or resuming an event.
///
/// A failing processor is reported as `Err`, so every variant here is a
/// successful outcome from the caller's point of view. `Suspended` means
/// "accepted, pending" rather than done.
#[derive(Debug, Clone)]
pub enum EventOutcome<T: EventType> {
    /// Every processor of the chain completed.
    Executed(Event<T>),
    /// The chain paused and waits for a resume signal.
    Suspended(Event<T>),
    /// The event was canceled while the chain was running.
    Canceled(Event<T>),
    /// Resume was requested for an event that is not suspended. Nothing ran.
    Stale {
        /// The event the resume targeted.
        event_id: Uuid,
        /// Its current state.
        state: EventState,
    },
}

impl<T: EventType> EventOutcome<T> {
    /// State of the event after the call.
    #[must_use]
    pub fn state(&self) -> EventState {
        match self {
            Self::Executed(event) | Self::Suspended(event) | Self::Canceled(event) => event.state,
            Self::Stale { state, .. } => *state,
        }
    }

    /// The event, unless the outcome is stale.
    #[must_use]
    pub fn event(&self) -> Option<&Event<T>> {
        match self {
            Self::Executed(event) | Self::Suspended(event) | Self::Canceled(event) => Some(event),
            Self::Stale { .. } => None,
        }
    }

    /// Consumes the outcome, returning the event content.
    #[must_use]
    pub fn into_content(self) -> Option<T::Content> {
        match self {
            Self::Executed(event) | Self::Suspended(event) | Self::Canceled(event) => {
                Some(event.content)
            }
            Self::Stale { .. } => None,
        }
    }

    /// Returns `true` if the event waits for an external decision.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Suspended(_))
    }

    /// Returns `true` for the idempotent no-op of a duplicate resume.
    #[must_use]
    pub fn is_stale(&self) -> bool {
        matches!(self, Self::Stale { .. })
    }
}

/// Result of a cancel request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelOutcome {
    /// The event moved to `CANCELED`.
    Canceled,
    /// The event had already reached a terminal state; nothing changed.
    AlreadyTerminal(EventState),
}

/// Entry points of the engine, as seen by business services and by
/// processors publishing sub-events.
#[async_trait]
pub trait EventPublisher<T: EventType>: Send + Sync {
    /// Publishes a new event of `event_type`.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::ProcessorFailed` if a processor fails and
    /// `DomainError::Infrastructure` if the store is unavailable.
    async fn publish(
        &self,
        event_type: T,
        content: T::Content,
        properties: EventProperties,
    ) -> Result<EventOutcome<T>, DomainError>;

    /// Publishes a prepared event, typically a sub-event built with
    /// [`Event::child_of`].
    ///
    /// # Errors
    ///
    /// See [`EventPublisher::publish`].
    async fn publish_event(&self, event: Event<T>) -> Result<EventOutcome<T>, DomainError>;

    /// Resumes a suspended event.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::EventNotFound` for unknown ids.
    async fn resume(
        &self,
        event_id: Uuid,
        properties: EventProperties,
    ) -> Result<EventOutcome<T>, DomainError>;

    /// Cancels a running or suspended event.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::EventNotFound` for unknown ids.
    async fn cancel(&self, event_id: Uuid) -> Result<CancelOutcome, DomainError>;
}
