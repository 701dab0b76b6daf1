//! Type-agnostic lifecycle transitions on stored rows.
//!
//! Cancellation and the recovery sweep do not need the event content, so
//! they operate on [`StoredEvent`] rows of any domain.

use idgov_core::clock::Clock;
use idgov_core::error::DomainError;
use idgov_core::event_type::EventState;
use idgov_core::publisher::CancelOutcome;
use idgov_core::store::{EventStore, StoredEvent};
use tracing::{debug, info};
use uuid::Uuid;

/// Result message of administratively canceled events.
pub const CANCELED_MESSAGE: &str = "canceled";

/// Attempts before a cancel racing with a running chain gives up.
const MAX_CANCEL_ATTEMPTS: usize = 8;

/// Prepares `row` for an optimistic update to `CANCELED`.
///
/// Returns the version the update must expect.
pub(crate) fn mark_canceled(row: &mut StoredEvent, reason: &str, clock: &dyn Clock) -> i64 {
    let expected = row.version;
    row.state = EventState::Canceled;
    row.result_message = Some(reason.to_owned());
    row.version = expected + 1;
    row.updated_at = clock.now();
    expected
}

/// Cancels the event `event_id`.
///
/// Only `RUNNING` and `SUSPENDED` events are canceled; a terminal event is
/// left untouched and reported as [`CancelOutcome::AlreadyTerminal`]. When a
/// concurrent writer (a resume claim or a chain checkpoint) wins the version
/// race, the row is reloaded and the decision is taken again, so the loser
/// always observes the winner's state.
///
/// # Errors
///
/// Returns `DomainError::EventNotFound` for unknown ids,
/// `DomainError::TypeMismatch` if `owner_type` is given and differs, and
/// `DomainError::ConcurrencyConflict` if the row keeps changing.
pub async fn cancel_event(
    store: &dyn EventStore,
    clock: &dyn Clock,
    event_id: Uuid,
    owner_type: Option<&str>,
    reason: &str,
) -> Result<CancelOutcome, DomainError> {
    let mut last_conflict = None;

    for attempt in 1..=MAX_CANCEL_ATTEMPTS {
        let mut row = store
            .load(event_id)
            .await?
            .ok_or(DomainError::EventNotFound(event_id))?;
        if let Some(expected) = owner_type {
            if row.owner_type != expected {
                return Err(DomainError::TypeMismatch {
                    event_id,
                    expected: expected.to_owned(),
                    actual: row.owner_type,
                });
            }
        }
        if row.state.is_terminal() {
            debug!(%event_id, state = %row.state, "cancel ignored, event already terminal");
            return Ok(CancelOutcome::AlreadyTerminal(row.state));
        }
        if !row.state.can_transition_to(EventState::Canceled) {
            return Err(DomainError::InvalidTransition {
                event_id,
                from: row.state,
                to: EventState::Canceled,
            });
        }

        let previous = row.state;
        let expected = mark_canceled(&mut row, reason, clock);
        match store.update(&row, expected).await {
            Ok(()) => {
                info!(%event_id, from = %previous, owner_type = %row.owner_type, "event canceled");
                return Ok(CancelOutcome::Canceled);
            }
            Err(conflict @ DomainError::ConcurrencyConflict { .. }) => {
                debug!(%event_id, attempt, "cancel lost a version race, retrying");
                last_conflict = Some(conflict);
            }
            Err(err) => return Err(err),
        }
    }

    Err(last_conflict.unwrap_or_else(|| {
        DomainError::Infrastructure(format!("cancel of event {event_id} did not settle"))
    }))
}

#[cfg(test)]
mod tests {
    use idgov_core::store::EventStore;
    use idgov_event_store::InMemoryEventStore;
    use idgov_test_support::{FixedClock, fixed_now};
    use serde_json::json;

    use super::*;

    fn row(state: EventState) -> StoredEvent {
        StoredEvent {
            id: Uuid::new_v4(),
            event_type: "CREATE".into(),
            owner_type: "ROLE".into(),
            owner_id: None,
            content: json!({}),
            original_content: None,
            properties: json!({}),
            state,
            closed_processor_index: Some(0),
            parent_event_id: None,
            root_event_id: None,
            instance_id: "default".into(),
            result_message: None,
            version: 3,
            created_at: fixed_now(),
            updated_at: fixed_now(),
        }
    }

    #[tokio::test]
    async fn test_cancel_suspended_event() {
        // Arrange
        let store = InMemoryEventStore::new();
        let suspended = row(EventState::Suspended);
        store.insert(&suspended).await.unwrap();

        // Act
        let outcome = cancel_event(&store, &FixedClock::default(), suspended.id, None, "admin")
            .await
            .unwrap();

        // Assert
        assert_eq!(outcome, CancelOutcome::Canceled);
        let stored = store.load(suspended.id).await.unwrap().unwrap();
        assert_eq!(stored.state, EventState::Canceled);
        assert_eq!(stored.version, 4);
        assert_eq!(stored.result_message.as_deref(), Some("admin"));
    }

    #[tokio::test]
    async fn test_cancel_terminal_event_is_a_no_op() {
        let store = InMemoryEventStore::new();
        let executed = row(EventState::Executed);
        store.insert(&executed).await.unwrap();

        let outcome = cancel_event(&store, &FixedClock::default(), executed.id, None, "admin")
            .await
            .unwrap();

        assert_eq!(outcome, CancelOutcome::AlreadyTerminal(EventState::Executed));
        let stored = store.load(executed.id).await.unwrap().unwrap();
        assert_eq!(stored.version, 3);
    }

    #[tokio::test]
    async fn test_cancel_unknown_event_is_not_found() {
        let store = InMemoryEventStore::new();
        let id = Uuid::new_v4();

        let result = cancel_event(&store, &FixedClock::default(), id, None, "admin").await;

        assert!(matches!(result, Err(DomainError::EventNotFound(found)) if found == id));
    }

    #[tokio::test]
    async fn test_cancel_checks_owner_type() {
        let store = InMemoryEventStore::new();
        let suspended = row(EventState::Suspended);
        store.insert(&suspended).await.unwrap();

        let result = cancel_event(
            &store,
            &FixedClock::default(),
            suspended.id,
            Some("ACCOUNT"),
            "admin",
        )
        .await;

        assert!(matches!(result, Err(DomainError::TypeMismatch { .. })));
    }
}
