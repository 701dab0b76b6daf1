//! Execution engine.
//!
//! `publish` runs the whole chain inline in the caller's task. A suspension
//! persists the event row (the continuation) and returns; nothing waits on
//! the external decision. `resume` claims the row with an optimistic version
//! check, rebuilds the chain and continues after the last completed
//! processor.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use async_trait::async_trait;
use idgov_core::clock::Clock;
use idgov_core::error::DomainError;
use idgov_core::event::Event;
use idgov_core::event_type::{EventState, EventType};
use idgov_core::processor::{ProcessorOutcome, SuspendToken};
use idgov_core::properties::{EventProperties, keys};
use idgov_core::publisher::{CancelOutcome, EventOutcome, EventPublisher};
use idgov_core::store::EventStore;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

use crate::chain::build_chain;
use crate::config::EngineConfig;
use crate::lifecycle::{self, CANCELED_MESSAGE};
use crate::registry::ProcessorRegistry;

/// Properties of a suspension round that a close sub-event does not inherit.
const WORKFLOW_KEYS: [&str; 4] = [
    keys::SUSPEND_REASON,
    keys::WORKFLOW_PROCESS_ID,
    keys::WORKFLOW_DEFINITION,
    keys::DECISION,
];

/// Result of persisting a running event.
enum Persisted<T: EventType> {
    Saved,
    /// The row was canceled concurrently; carries the stored event.
    Canceled(Event<T>),
}

/// Publishes, resumes and cancels events of one domain.
pub struct EventEngine<T: EventType> {
    registry: Arc<ProcessorRegistry<T>>,
    store: Arc<dyn EventStore>,
    clock: Arc<dyn Clock>,
    config: EngineConfig,
}

impl<T: EventType> Clone for EventEngine<T> {
    fn clone(&self) -> Self {
        Self {
            registry: Arc::clone(&self.registry),
            store: Arc::clone(&self.store),
            clock: Arc::clone(&self.clock),
            config: self.config.clone(),
        }
    }
}

impl<T: EventType> EventEngine<T> {
    /// Creates an engine over `registry`, persisting into `store`.
    #[must_use]
    pub fn new(
        registry: ProcessorRegistry<T>,
        store: Arc<dyn EventStore>,
        clock: Arc<dyn Clock>,
        config: EngineConfig,
    ) -> Self {
        Self {
            registry: Arc::new(registry),
            store,
            clock,
            config,
        }
    }

    /// The processor registry.
    #[must_use]
    pub fn registry(&self) -> &ProcessorRegistry<T> {
        &self.registry
    }

    /// The engine's clock, for building events.
    #[must_use]
    pub fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }

    /// Builds and publishes a new event.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::ProcessorFailed` if a processor fails (the event
    /// is left in `EXCEPTION`), or a store error if the event cannot be
    /// recorded.
    pub async fn publish(
        &self,
        event_type: T,
        content: T::Content,
        properties: EventProperties,
    ) -> Result<EventOutcome<T>, DomainError> {
        let event = Event::with_properties(event_type, content, properties, self.clock.as_ref());
        self.publish_event(event).await
    }

    /// Publishes a prepared event in state `CREATED`.
    ///
    /// # Errors
    ///
    /// See [`EventEngine::publish`]; additionally
    /// `DomainError::InvalidTransition` if the event was published before.
    #[instrument(skip_all, fields(event_id = %event.id, event_type = %event.event_type.qualified_name()))]
    pub async fn publish_event(
        &self,
        mut event: Event<T>,
    ) -> Result<EventOutcome<T>, DomainError> {
        if event.instance_id.is_empty() {
            event.instance_id.clone_from(&self.config.instance_id);
        }
        event.transition(EventState::Running, self.clock.as_ref())?;
        event.version = 1;
        self.store.insert(&event.to_stored()?).await?;
        debug!(parent_event_id = ?event.parent_event_id, "event published");

        self.run(event).await
    }

    /// Resumes a suspended event, merging `properties` into its bag.
    ///
    /// An event that is not suspended (already resumed, executed, failed or
    /// canceled) is reported as [`EventOutcome::Stale`] and nothing runs.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::EventNotFound` for unknown ids,
    /// `DomainError::TypeMismatch` for events of another domain and
    /// `DomainError::ProcessorFailed` if a remaining processor fails.
    #[instrument(skip(self, properties), fields(owner_type = T::OWNER_TYPE))]
    pub async fn resume(
        &self,
        event_id: Uuid,
        properties: EventProperties,
    ) -> Result<EventOutcome<T>, DomainError> {
        let mut event = self.get(event_id).await?;
        if event.state != EventState::Suspended {
            info!(state = %event.state, "resume ignored, event is not suspended");
            return Ok(EventOutcome::Stale {
                event_id,
                state: event.state,
            });
        }

        event.properties.merge(properties);
        event.transition(EventState::Running, self.clock.as_ref())?;
        // The resuming instance owns the chain from here on; its recovery
        // sweep is the one that must find the row if it dies mid-chain.
        event.instance_id.clone_from(&self.config.instance_id);
        let expected = event.version;
        event.version += 1;
        match self.store.update(&event.to_stored()?, expected).await {
            Ok(()) => {}
            Err(DomainError::ConcurrencyConflict { .. }) => {
                let current = self.get(event_id).await?;
                info!(state = %current.state, "resume lost the claim to a concurrent writer");
                return Ok(EventOutcome::Stale {
                    event_id,
                    state: current.state,
                });
            }
            Err(err) => return Err(err),
        }
        info!(
            next_processor = event.next_processor_index(),
            "event resumed"
        );

        self.run(event).await
    }

    /// Cancels a running or suspended event.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::EventNotFound` for unknown ids and
    /// `DomainError::TypeMismatch` for events of another domain.
    #[instrument(skip(self), fields(owner_type = T::OWNER_TYPE))]
    pub async fn cancel(&self, event_id: Uuid) -> Result<CancelOutcome, DomainError> {
        lifecycle::cancel_event(
            self.store.as_ref(),
            self.clock.as_ref(),
            event_id,
            Some(T::OWNER_TYPE),
            CANCELED_MESSAGE,
        )
        .await
    }

    /// Loads an event of this domain.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::EventNotFound` for unknown ids and
    /// `DomainError::TypeMismatch` for events of another domain.
    pub async fn get(&self, event_id: Uuid) -> Result<Event<T>, DomainError> {
        let stored = self
            .store
            .load(event_id)
            .await?
            .ok_or(DomainError::EventNotFound(event_id))?;
        Event::from_stored(stored)
    }

    /// Loads the direct sub-events of `parent_id` that belong to this domain.
    ///
    /// # Errors
    ///
    /// Returns a store error or a deserialization failure.
    pub async fn children(&self, parent_id: Uuid) -> Result<Vec<Event<T>>, DomainError> {
        self.store
            .find_children(parent_id)
            .await?
            .into_iter()
            .filter(|stored| stored.owner_type == T::OWNER_TYPE)
            .map(Event::from_stored)
            .collect()
    }

    /// Runs the chain of a `RUNNING` event from its next processor.
    async fn run(&self, mut event: Event<T>) -> Result<EventOutcome<T>, DomainError> {
        let chain = match build_chain(&self.registry, &event, &self.config.disabled_processors) {
            Ok(chain) => chain,
            Err(err) => return Err(self.fail(event, err).await),
        };
        let start = event.next_processor_index();
        let last = chain.len().saturating_sub(1);

        for (index, entry) in chain.iter().enumerate().skip(start) {
            debug!(processor = entry.id(), index, order = entry.order, "processing");
            match entry.processor.process(&mut event).await {
                Ok(ProcessorOutcome::Completed) => {
                    event.closed_processor_index = Some(index);
                    if self.config.checkpoint_each_processor && index < last {
                        event.updated_at = self.clock.now();
                        if let Persisted::Canceled(canceled) = self.persist(&mut event).await? {
                            return Ok(EventOutcome::Canceled(canceled));
                        }
                    }
                }
                Ok(ProcessorOutcome::Suspended(token)) => {
                    event.closed_processor_index = Some(index);
                    return self.suspend(event, entry.id(), token).await;
                }
                Ok(ProcessorOutcome::Closed) => {
                    event.closed_processor_index = Some(index);
                    debug!(processor = entry.id(), "processor closed the event");
                    break;
                }
                Err(err) => {
                    let err = err.in_processor(entry.id(), event.id);
                    return Err(self.fail(event, err).await);
                }
            }
        }

        event.transition(EventState::Executed, self.clock.as_ref())?;
        if let Persisted::Canceled(canceled) = self.persist(&mut event).await? {
            return Ok(EventOutcome::Canceled(canceled));
        }
        info!(processors = chain.len(), "event executed");

        if !event.is_close_event() && self.registry.has_close_processors(event.event_type) {
            self.run_close_chain(&event).await;
        }
        Ok(EventOutcome::Executed(event))
    }

    async fn suspend(
        &self,
        mut event: Event<T>,
        processor: &str,
        token: SuspendToken,
    ) -> Result<EventOutcome<T>, DomainError> {
        event.properties.set(keys::SUSPEND_REASON, token.reason.clone());
        if let Some(reference) = &token.reference {
            event.properties.set(keys::WORKFLOW_PROCESS_ID, reference.clone());
        }
        event.transition(EventState::Suspended, self.clock.as_ref())?;
        if let Persisted::Canceled(canceled) = self.persist(&mut event).await? {
            return Ok(EventOutcome::Canceled(canceled));
        }
        info!(
            processor,
            reason = %token.reason,
            reference = ?token.reference,
            closed_processor_index = ?event.closed_processor_index,
            "event suspended"
        );
        Ok(EventOutcome::Suspended(event))
    }

    /// Records `err` on the event and moves it to `EXCEPTION`. Returns the
    /// error for the caller.
    async fn fail(&self, mut event: Event<T>, err: DomainError) -> DomainError {
        error!(error = %err, "event processing failed");
        event.result_message = Some(err.to_string());
        if let Err(transition) = event.transition(EventState::Exception, self.clock.as_ref()) {
            warn!(error = %transition, "could not record failure state");
            return err;
        }
        match self.persist(&mut event).await {
            Ok(Persisted::Saved) => {}
            Ok(Persisted::Canceled(_)) => {
                warn!("event was canceled while its chain was failing");
            }
            Err(persist) => {
                error!(error = %persist, "could not persist failed event");
            }
        }
        err
    }

    /// Writes the event with an optimistic version check. A conflict means a
    /// concurrent cancel won; the canceled row is returned instead.
    async fn persist(&self, event: &mut Event<T>) -> Result<Persisted<T>, DomainError> {
        let expected = event.version;
        event.version = expected + 1;
        let stored = match event.to_stored() {
            Ok(stored) => stored,
            Err(err) => {
                event.version = expected;
                return Err(err);
            }
        };

        match self.store.update(&stored, expected).await {
            Ok(()) => Ok(Persisted::Saved),
            Err(conflict @ DomainError::ConcurrencyConflict { .. }) => {
                event.version = expected;
                let current = self.get(event.id).await?;
                if current.state == EventState::Canceled {
                    warn!(
                        closed_processor_index = ?event.closed_processor_index,
                        "event canceled while running, stopping chain"
                    );
                    Ok(Persisted::Canceled(current))
                } else {
                    Err(conflict)
                }
            }
            Err(err) => {
                event.version = expected;
                Err(err)
            }
        }
    }

    /// Publishes the close sub-event of an executed event. Failures are
    /// recorded on the sub-event and logged; the parent stays executed.
    fn run_close_chain<'a>(
        &'a self,
        parent: &'a Event<T>,
    ) -> Pin<Box<dyn Future<Output = ()> + Send + 'a>> {
        Box::pin(async move {
            let mut close = Event::child_of(
                parent,
                parent.event_type,
                parent.content.clone(),
                self.clock.as_ref(),
            );
            close.properties = parent.properties.clone();
            // Workflow bookkeeping belongs to the parent's approval round.
            for key in WORKFLOW_KEYS {
                close.properties.remove(key);
            }
            close.properties.set(keys::CLOSE, true);
            let close_id = close.id;

            match self.publish_event(close).await {
                Ok(outcome) => {
                    debug!(%close_id, state = %outcome.state(), "close chain finished");
                }
                Err(err) => {
                    error!(%close_id, error = %err, "close chain failed");
                }
            }
        })
    }
}

#[async_trait]
impl<T: EventType> EventPublisher<T> for EventEngine<T> {
    async fn publish(
        &self,
        event_type: T,
        content: T::Content,
        properties: EventProperties,
    ) -> Result<EventOutcome<T>, DomainError> {
        EventEngine::publish(self, event_type, content, properties).await
    }

    async fn publish_event(&self, event: Event<T>) -> Result<EventOutcome<T>, DomainError> {
        EventEngine::publish_event(self, event).await
    }

    async fn resume(
        &self,
        event_id: Uuid,
        properties: EventProperties,
    ) -> Result<EventOutcome<T>, DomainError> {
        EventEngine::resume(self, event_id, properties).await
    }

    async fn cancel(&self, event_id: Uuid) -> Result<CancelOutcome, DomainError> {
        EventEngine::cancel(self, event_id).await
    }
}
