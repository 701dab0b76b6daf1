//! Startup recovery sweep.
//!
//! A chain runs inline in the publishing task, so an unclean shutdown leaves
//! its event `RUNNING` with no owner. Before accepting work, an instance
//! cancels the `RUNNING` events it owns. Rows of other instances are never
//! touched. Suspended events survive restarts and stay resumable.

use std::sync::Arc;

use idgov_core::clock::Clock;
use idgov_core::error::DomainError;
use idgov_core::event_type::EventState;
use idgov_core::store::EventStore;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::config::EngineConfig;
use crate::lifecycle::mark_canceled;

/// Result message of events canceled by the sweep.
pub const RECOVERY_MESSAGE: &str = "canceled by recovery sweep";

/// What a sweep did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecoveryReport {
    /// Events moved from `RUNNING` to `CANCELED`.
    pub canceled: Vec<Uuid>,
    /// Rows that changed under the sweep and were left alone.
    pub conflicts: usize,
}

/// Cancels interrupted chains of one instance.
pub struct RecoverySweep {
    store: Arc<dyn EventStore>,
    clock: Arc<dyn Clock>,
    instance_id: String,
}

impl RecoverySweep {
    /// Creates a sweep for `instance_id`.
    #[must_use]
    pub fn new(
        store: Arc<dyn EventStore>,
        clock: Arc<dyn Clock>,
        instance_id: impl Into<String>,
    ) -> Self {
        Self {
            store,
            clock,
            instance_id: instance_id.into(),
        }
    }

    /// Creates a sweep for the instance named in `config`.
    #[must_use]
    pub fn for_config(
        store: Arc<dyn EventStore>,
        clock: Arc<dyn Clock>,
        config: &EngineConfig,
    ) -> Self {
        Self::new(store, clock, config.instance_id.clone())
    }

    /// Runs the sweep once.
    ///
    /// # Errors
    ///
    /// Returns a store error if the `RUNNING` rows cannot be listed or
    /// updated. Version conflicts are counted, not returned.
    #[instrument(skip(self), fields(instance_id = %self.instance_id))]
    pub async fn run(&self) -> Result<RecoveryReport, DomainError> {
        let running = self
            .store
            .find_by_state(EventState::Running, Some(&self.instance_id))
            .await?;
        let mut report = RecoveryReport::default();

        for mut row in running {
            let expected = mark_canceled(&mut row, RECOVERY_MESSAGE, self.clock.as_ref());
            match self.store.update(&row, expected).await {
                Ok(()) => {
                    warn!(
                        event_id = %row.id,
                        owner_type = %row.owner_type,
                        event_type = %row.event_type,
                        closed_processor_index = ?row.closed_processor_index,
                        "canceled event interrupted by shutdown"
                    );
                    report.canceled.push(row.id);
                }
                Err(DomainError::ConcurrencyConflict { .. }) => {
                    report.conflicts += 1;
                }
                Err(err) => return Err(err),
            }
        }

        info!(
            canceled = report.canceled.len(),
            conflicts = report.conflicts,
            "recovery sweep finished"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use idgov_core::event::Event;
    use idgov_core::properties::EventProperties;
    use idgov_event_store::InMemoryEventStore;
    use idgov_test_support::{FailingEventStore, FixedClock, InvocationJournal, ScriptedProcessor};

    use super::*;
    use crate::engine::EventEngine;
    use crate::fixtures::{Role, RoleEventType};
    use crate::registry::ProcessorRegistry;

    async fn insert_running(store: &InMemoryEventStore, instance_id: &str) -> Uuid {
        let mut event = Event::new(RoleEventType::Create, Role::new("auditor"), &FixedClock::default());
        event.transition(EventState::Running, &FixedClock::default()).unwrap();
        event.instance_id = instance_id.to_owned();
        event.version = 1;
        store.insert(&event.to_stored().unwrap()).await.unwrap();
        event.id
    }

    #[tokio::test]
    async fn test_sweep_cancels_running_events_of_own_instance() {
        // Arrange
        let store = Arc::new(InMemoryEventStore::new());
        let own = insert_running(&store, "node-1").await;
        let other = insert_running(&store, "node-2").await;
        let sweep = RecoverySweep::new(store.clone(), Arc::new(FixedClock::default()), "node-1");

        // Act
        let report = sweep.run().await.unwrap();

        // Assert
        assert_eq!(report.canceled, vec![own]);
        assert_eq!(report.conflicts, 0);
        let own_row = store.load(own).await.unwrap().unwrap();
        assert_eq!(own_row.state, EventState::Canceled);
        assert_eq!(own_row.result_message.as_deref(), Some(RECOVERY_MESSAGE));
        let other_row = store.load(other).await.unwrap().unwrap();
        assert_eq!(other_row.state, EventState::Running);
    }

    #[tokio::test]
    async fn test_interrupted_event_cannot_be_resumed_after_sweep() {
        // Arrange: a chain was interrupted mid-run by a crash
        let store = Arc::new(InMemoryEventStore::new());
        let event_id = insert_running(&store, "default").await;
        let journal = InvocationJournal::new();
        let registry = ProcessorRegistry::new()
            .with_processor(ScriptedProcessor::new(
                "save",
                &[RoleEventType::Create],
                0,
                &journal,
            ))
            .unwrap();
        let engine = EventEngine::new(
            registry,
            store.clone(),
            Arc::new(FixedClock::default()),
            EngineConfig::default(),
        );
        let sweep = RecoverySweep::for_config(
            store.clone(),
            Arc::new(FixedClock::default()),
            &EngineConfig::default(),
        );

        // Act
        sweep.run().await.unwrap();
        let resumed = engine.resume(event_id, EventProperties::new()).await.unwrap();

        // Assert
        assert!(resumed.is_stale());
        assert_eq!(resumed.state(), EventState::Canceled);
        assert!(journal.entries().is_empty());
    }

    #[tokio::test]
    async fn test_suspended_events_survive_the_sweep() {
        let store = Arc::new(InMemoryEventStore::new());
        let mut event = Event::new(RoleEventType::Create, Role::new("auditor"), &FixedClock::default());
        event.transition(EventState::Running, &FixedClock::default()).unwrap();
        event.transition(EventState::Suspended, &FixedClock::default()).unwrap();
        event.instance_id = "default".into();
        event.version = 2;
        store.insert(&event.to_stored().unwrap()).await.unwrap();
        let sweep = RecoverySweep::new(store.clone(), Arc::new(FixedClock::default()), "default");

        let report = sweep.run().await.unwrap();

        assert!(report.canceled.is_empty());
        let row = store.load(event.id).await.unwrap().unwrap();
        assert_eq!(row.state, EventState::Suspended);
    }

    #[tokio::test]
    async fn test_sweep_reports_store_failure() {
        let sweep = RecoverySweep::new(
            Arc::new(FailingEventStore),
            Arc::new(FixedClock::default()),
            "default",
        );

        let result = sweep.run().await;

        assert!(matches!(result, Err(DomainError::Infrastructure(_))));
    }
}
