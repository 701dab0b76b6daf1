//! Scripted processors and an invocation journal for chain tests.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use idgov_core::error::DomainError;
use idgov_core::event::Event;
use idgov_core::event_type::EventType;
use idgov_core::processor::{EntityEventProcessor, ProcessorOutcome, SuspendToken};

type Condition<T> = Box<dyn Fn(&Event<T>) -> Result<bool, DomainError> + Send + Sync>;
type Action<T> = Box<dyn Fn(&mut Event<T>) -> Result<ProcessorOutcome, DomainError> + Send + Sync>;

/// Shared, ordered record of processor invocations.
#[derive(Debug, Clone, Default)]
pub struct InvocationJournal(Arc<Mutex<Vec<String>>>);

impl InvocationJournal {
    /// Creates an empty journal.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an entry.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn record(&self, entry: impl Into<String>) {
        self.0.lock().unwrap().push(entry.into());
    }

    /// Returns a snapshot of all entries in invocation order.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    #[must_use]
    pub fn entries(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }

    /// Number of times `entry` was recorded.
    #[must_use]
    pub fn count(&self, entry: &str) -> usize {
        self.entries().iter().filter(|e| e.as_str() == entry).count()
    }

    /// Forgets all entries.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn clear(&self) {
        self.0.lock().unwrap().clear();
    }
}

/// A processor whose condition and behavior are closures. Every `process`
/// call records the processor id in the journal.
pub struct ScriptedProcessor<T: EventType> {
    id: String,
    types: Vec<T>,
    order: i32,
    close_after: bool,
    journal: InvocationJournal,
    condition: Option<Condition<T>>,
    action: Action<T>,
}

impl<T: EventType> ScriptedProcessor<T> {
    /// A processor that completes without touching the event.
    #[must_use]
    pub fn new(id: &str, types: &[T], order: i32, journal: &InvocationJournal) -> Self {
        Self {
            id: id.to_owned(),
            types: types.to_vec(),
            order,
            close_after: false,
            journal: journal.clone(),
            condition: None,
            action: Box::new(|_| Ok(ProcessorOutcome::Completed)),
        }
    }

    /// Replaces the behavior.
    #[must_use]
    pub fn with_action(
        mut self,
        action: impl Fn(&mut Event<T>) -> Result<ProcessorOutcome, DomainError> + Send + Sync + 'static,
    ) -> Self {
        self.action = Box::new(action);
        self
    }

    /// Sets the conditional gate.
    #[must_use]
    pub fn when(
        mut self,
        condition: impl Fn(&Event<T>) -> Result<bool, DomainError> + Send + Sync + 'static,
    ) -> Self {
        self.condition = Some(Box::new(condition));
        self
    }

    /// Suspends the chain with `reason`.
    #[must_use]
    pub fn suspending(self, reason: &str) -> Self {
        let reason = reason.to_owned();
        self.with_action(move |_| Ok(ProcessorOutcome::Suspended(SuspendToken::new(reason.clone()))))
    }

    /// Fails with a validation error carrying `message`.
    #[must_use]
    pub fn failing(self, message: &str) -> Self {
        let message = message.to_owned();
        self.with_action(move |_| Err(DomainError::Validation(message.clone())))
    }

    /// Moves the processor to the close sub-chain.
    #[must_use]
    pub fn closing(mut self) -> Self {
        self.close_after = true;
        self
    }
}

#[async_trait]
impl<T: EventType> EntityEventProcessor<T> for ScriptedProcessor<T> {
    fn id(&self) -> &str {
        &self.id
    }

    fn supported_types(&self) -> &[T] {
        &self.types
    }

    fn order(&self) -> i32 {
        self.order
    }

    fn conditional(&self, event: &Event<T>) -> Result<bool, DomainError> {
        self.condition.as_ref().map_or(Ok(true), |condition| condition(event))
    }

    fn close_after(&self) -> bool {
        self.close_after
    }

    async fn process(&self, event: &mut Event<T>) -> Result<ProcessorOutcome, DomainError> {
        self.journal.record(self.id.clone());
        (self.action)(event)
    }
}
