//! Workflow callbacks.
//!
//! The workflow engine reports decisions asynchronously. Each report becomes
//! a [`WorkflowCallback`] message on a bounded channel; the
//! [`CallbackListener`] drains it and hands every message to the
//! [`CallbackRouter`], which looks up the event's owner type and dispatches
//! to the engine of that domain.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use idgov_core::error::DomainError;
use idgov_core::event_type::{EventState, EventType};
use idgov_core::properties::EventProperties;
use idgov_core::publisher::{CancelOutcome, EventOutcome};
use idgov_core::store::EventStore;
use tokio::sync::mpsc;
use tracing::{debug, error, info, instrument};
use uuid::Uuid;

use crate::engine::EventEngine;

/// A decision reported by the workflow engine.
#[derive(Debug, Clone, PartialEq)]
pub enum WorkflowCallback {
    /// Continue the suspended chain, merging `properties` (typically the
    /// `decision`) into the event.
    Resume {
        event_id: Uuid,
        properties: EventProperties,
    },
    /// Abandon the event.
    Cancel { event_id: Uuid },
}

impl WorkflowCallback {
    /// The event the callback targets.
    #[must_use]
    pub fn event_id(&self) -> Uuid {
        match self {
            Self::Resume { event_id, .. } | Self::Cancel { event_id } => *event_id,
        }
    }
}

/// What routing a callback did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallbackOutcome {
    /// The event the callback addressed.
    pub event_id: Uuid,
    /// Domain of the engine that handled it, e.g. `ACCOUNT`.
    pub owner_type: &'static str,
    /// State of the event afterwards.
    pub state: EventState,
    /// `false` when the callback was a duplicate or arrived too late and
    /// nothing changed.
    pub applied: bool,
}

/// Type-erased view of an [`EventEngine`], so engines of different domains
/// can share one router.
#[async_trait]
pub trait EventResumer: Send + Sync {
    /// Owner type of the events this engine handles.
    fn owner_type(&self) -> &'static str;

    /// Resumes a suspended event.
    ///
    /// # Errors
    ///
    /// See [`EventEngine::resume`].
    async fn resume_event(
        &self,
        event_id: Uuid,
        properties: EventProperties,
    ) -> Result<CallbackOutcome, DomainError>;

    /// Cancels an event.
    ///
    /// # Errors
    ///
    /// See [`EventEngine::cancel`].
    async fn cancel_event(&self, event_id: Uuid) -> Result<CallbackOutcome, DomainError>;
}

#[async_trait]
impl<T: EventType> EventResumer for EventEngine<T> {
    fn owner_type(&self) -> &'static str {
        T::OWNER_TYPE
    }

    async fn resume_event(
        &self,
        event_id: Uuid,
        properties: EventProperties,
    ) -> Result<CallbackOutcome, DomainError> {
        let outcome = self.resume(event_id, properties).await?;
        Ok(CallbackOutcome {
            event_id,
            owner_type: T::OWNER_TYPE,
            state: outcome.state(),
            applied: !matches!(outcome, EventOutcome::Stale { .. }),
        })
    }

    async fn cancel_event(&self, event_id: Uuid) -> Result<CallbackOutcome, DomainError> {
        let (state, applied) = match self.cancel(event_id).await? {
            CancelOutcome::Canceled => (EventState::Canceled, true),
            CancelOutcome::AlreadyTerminal(state) => (state, false),
        };
        Ok(CallbackOutcome {
            event_id,
            owner_type: T::OWNER_TYPE,
            state,
            applied,
        })
    }
}

/// Dispatches callbacks to the engine owning the event.
pub struct CallbackRouter {
    store: Arc<dyn EventStore>,
    resumers: HashMap<&'static str, Arc<dyn EventResumer>>,
}

impl CallbackRouter {
    /// Creates a router reading owner types from `store`.
    #[must_use]
    pub fn new(store: Arc<dyn EventStore>) -> Self {
        Self {
            store,
            resumers: HashMap::new(),
        }
    }

    /// Registers the engine of one domain.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if an engine is already registered
    /// for the same owner type.
    pub fn register(&mut self, resumer: Arc<dyn EventResumer>) -> Result<(), DomainError> {
        let owner_type = resumer.owner_type();
        if self.resumers.contains_key(owner_type) {
            return Err(DomainError::Validation(format!(
                "an engine for {owner_type} is already registered"
            )));
        }
        self.resumers.insert(owner_type, resumer);
        Ok(())
    }

    /// Builder-style [`CallbackRouter::register`].
    ///
    /// # Errors
    ///
    /// See [`CallbackRouter::register`].
    pub fn with_resumer(mut self, resumer: Arc<dyn EventResumer>) -> Result<Self, DomainError> {
        self.register(resumer)?;
        Ok(self)
    }

    /// Routes one callback.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::EventNotFound` for unknown events,
    /// `DomainError::Infrastructure` if no engine handles the event's owner
    /// type, and whatever the engine returns.
    #[instrument(skip(self), fields(event_id = %callback.event_id()))]
    pub async fn route(&self, callback: WorkflowCallback) -> Result<CallbackOutcome, DomainError> {
        let event_id = callback.event_id();
        let row = self
            .store
            .load(event_id)
            .await?
            .ok_or(DomainError::EventNotFound(event_id))?;
        let resumer = self.resumers.get(row.owner_type.as_str()).ok_or_else(|| {
            DomainError::Infrastructure(format!(
                "no engine registered for owner type {}",
                row.owner_type
            ))
        })?;
        debug!(owner_type = %row.owner_type, "routing callback");

        match callback {
            WorkflowCallback::Resume {
                event_id,
                properties,
            } => resumer.resume_event(event_id, properties).await,
            WorkflowCallback::Cancel { event_id } => resumer.cancel_event(event_id).await,
        }
    }
}

/// Receiving end of the callback channel.
pub struct CallbackListener {
    receiver: mpsc::Receiver<WorkflowCallback>,
}

impl CallbackListener {
    /// Creates a bounded callback channel.
    #[must_use]
    pub fn channel(buffer: usize) -> (mpsc::Sender<WorkflowCallback>, Self) {
        let (sender, receiver) = mpsc::channel(buffer);
        (sender, Self { receiver })
    }

    /// Handles callbacks one at a time until every sender is dropped.
    /// Routing errors are logged; they never stop the listener.
    pub async fn run(mut self, router: Arc<CallbackRouter>) {
        info!("workflow callback listener started");
        while let Some(callback) = self.receiver.recv().await {
            let event_id = callback.event_id();
            match router.route(callback).await {
                Ok(outcome) if outcome.applied => {
                    info!(
                        %event_id,
                        owner_type = outcome.owner_type,
                        state = %outcome.state,
                        "callback applied"
                    );
                }
                Ok(outcome) => {
                    info!(
                        %event_id,
                        owner_type = outcome.owner_type,
                        state = %outcome.state,
                        "callback ignored, event already settled"
                    );
                }
                Err(err) => {
                    error!(%event_id, error = %err, "callback failed");
                }
            }
        }
        info!("workflow callback listener stopped");
    }
}

#[cfg(test)]
mod tests {
    use idgov_core::properties::keys;
    use idgov_event_store::InMemoryEventStore;
    use idgov_test_support::{FixedClock, InvocationJournal, ScriptedProcessor};

    use super::*;
    use crate::config::EngineConfig;
    use crate::fixtures::{Role, RoleEventType};
    use crate::registry::ProcessorRegistry;

    struct Setup {
        store: Arc<InMemoryEventStore>,
        engine: Arc<EventEngine<RoleEventType>>,
        router: Arc<CallbackRouter>,
        journal: InvocationJournal,
    }

    fn setup() -> Setup {
        let store = Arc::new(InMemoryEventStore::new());
        let journal = InvocationJournal::new();
        let registry = ProcessorRegistry::new()
            .with_processor(
                ScriptedProcessor::new("approve", &[RoleEventType::Create], 0, &journal)
                    .suspending("awaiting approval"),
            )
            .unwrap()
            .with_processor(ScriptedProcessor::new(
                "save",
                &[RoleEventType::Create],
                10,
                &journal,
            ))
            .unwrap();
        let engine = Arc::new(EventEngine::new(
            registry,
            store.clone(),
            Arc::new(FixedClock::default()),
            EngineConfig::default(),
        ));
        let router = CallbackRouter::new(store.clone())
            .with_resumer(engine.clone())
            .unwrap();
        Setup {
            store,
            engine,
            router: Arc::new(router),
            journal,
        }
    }

    async fn suspended_event(setup: &Setup) -> Uuid {
        let outcome = setup
            .engine
            .publish(RoleEventType::Create, Role::new("auditor"), EventProperties::new())
            .await
            .unwrap();
        outcome.event().unwrap().id
    }

    #[tokio::test]
    async fn test_resume_callback_is_routed_by_owner_type() {
        // Arrange
        let setup = setup();
        let event_id = suspended_event(&setup).await;

        // Act
        let outcome = setup
            .router
            .route(WorkflowCallback::Resume {
                event_id,
                properties: EventProperties::new().with(keys::DECISION, "approve"),
            })
            .await
            .unwrap();

        // Assert
        assert_eq!(outcome.owner_type, "ROLE");
        assert_eq!(outcome.state, EventState::Executed);
        assert!(outcome.applied);
        assert_eq!(setup.journal.entries(), vec!["approve", "save"]);
    }

    #[tokio::test]
    async fn test_duplicate_resume_callback_is_not_applied() {
        let setup = setup();
        let event_id = suspended_event(&setup).await;
        let callback = WorkflowCallback::Resume {
            event_id,
            properties: EventProperties::new(),
        };

        setup.router.route(callback.clone()).await.unwrap();
        let second = setup.router.route(callback).await.unwrap();

        assert!(!second.applied);
        assert_eq!(second.state, EventState::Executed);
        assert_eq!(setup.journal.count("save"), 1);
    }

    #[tokio::test]
    async fn test_cancel_callback() {
        let setup = setup();
        let event_id = suspended_event(&setup).await;

        let outcome = setup
            .router
            .route(WorkflowCallback::Cancel { event_id })
            .await
            .unwrap();

        assert!(outcome.applied);
        assert_eq!(outcome.state, EventState::Canceled);
    }

    #[tokio::test]
    async fn test_unknown_event_is_not_found() {
        let setup = setup();

        let result = setup
            .router
            .route(WorkflowCallback::Cancel {
                event_id: Uuid::new_v4(),
            })
            .await;

        assert!(matches!(result, Err(DomainError::EventNotFound(_))));
    }

    #[tokio::test]
    async fn test_unregistered_owner_type_is_reported() {
        let setup = setup();
        let event_id = suspended_event(&setup).await;
        let mut foreign = setup.store.load(event_id).await.unwrap().unwrap();
        foreign.id = Uuid::new_v4();
        foreign.owner_type = "ACCOUNT".into();
        setup.store.insert(&foreign).await.unwrap();

        let result = setup
            .router
            .route(WorkflowCallback::Cancel {
                event_id: foreign.id,
            })
            .await;

        assert!(matches!(result, Err(DomainError::Infrastructure(_))));
    }

    #[test]
    fn test_second_engine_for_same_owner_type_is_rejected() {
        let setup = setup();
        let mut router = CallbackRouter::new(setup.store.clone());
        router.register(setup.engine.clone()).unwrap();

        let result = router.register(setup.engine.clone());

        assert!(matches!(result, Err(DomainError::Validation(_))));
    }

    #[tokio::test]
    async fn test_listener_drains_channel_until_senders_are_dropped() {
        // Arrange
        let setup = setup();
        let event_id = suspended_event(&setup).await;
        let (sender, listener) = CallbackListener::channel(8);

        // Act
        sender
            .send(WorkflowCallback::Resume {
                event_id,
                properties: EventProperties::new(),
            })
            .await
            .unwrap();
        sender
            .send(WorkflowCallback::Cancel {
                event_id: Uuid::new_v4(),
            })
            .await
            .unwrap();
        drop(sender);
        listener.run(setup.router.clone()).await;

        // Assert
        let event = setup.engine.get(event_id).await.unwrap();
        assert_eq!(event.state, EventState::Executed);
    }
}
