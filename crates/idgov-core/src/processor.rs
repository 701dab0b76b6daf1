//! Processor contract.

use async_trait::async_trait;

use crate::error::DomainError;
use crate::event::Event;
use crate::event_type::EventType;

/// Default processor order.
pub const DEFAULT_ORDER: i32 = 0;

/// Continuation token returned by a processor that suspends the chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuspendToken {
    /// Why the event waits (e.g. "awaiting approval").
    pub reason: String,
    /// External reference the resume signal will correlate with, typically a
    /// workflow process instance id.
    pub reference: Option<String>,
}

impl SuspendToken {
    /// Creates a token with a reason and no external reference.
    #[must_use]
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
            reference: None,
        }
    }

    /// Attaches an external reference.
    #[must_use]
    pub fn with_reference(mut self, reference: impl Into<String>) -> Self {
        self.reference = Some(reference.into());
        self
    }
}

/// Non-failing outcome of a processor. Failures are the `Err` arm of
/// [`EntityEventProcessor::process`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessorOutcome {
    /// Continue with the next processor.
    Completed,
    /// Pause the chain until an external signal resumes it.
    Suspended(SuspendToken),
    /// Finish the event successfully without running later processors.
    Closed,
}

/// A unit of business logic attached to one or more event types.
#[async_trait]
pub trait EntityEventProcessor<T: EventType>: Send + Sync {
    /// Identifier, unique within a registry.
    fn id(&self) -> &str;

    /// Event types this processor handles. It is never invoked for others.
    fn supported_types(&self) -> &[T];

    /// Position in the chain; lower runs first.
    fn order(&self) -> i32 {
        DEFAULT_ORDER
    }

    /// Side-effect-free gate evaluated while the chain is built.
    ///
    /// # Errors
    ///
    /// An error fails the whole event, exactly like a failing `process`.
    fn conditional(&self, _event: &Event<T>) -> Result<bool, DomainError> {
        Ok(true)
    }

    /// Deferred processors run on the close sub-chain after the owning event
    /// has executed, never on the main chain.
    fn close_after(&self) -> bool {
        false
    }

    /// Does the work. May mutate `event.content` and `event.properties`.
    ///
    /// # Errors
    ///
    /// Any error halts the chain and moves the event to `EXCEPTION`.
    async fn process(&self, event: &mut Event<T>) -> Result<ProcessorOutcome, DomainError>;
}
