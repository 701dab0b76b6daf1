//! In-memory implementation of the `EventStore` trait.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use uuid::Uuid;

use idgov_core::error::DomainError;
use idgov_core::event_type::EventState;
use idgov_core::store::{EventStore, StoredEvent};

/// Event store keeping rows in a process-local map.
///
/// Honors the same optimistic-version contract as [`crate::PgEventStore`],
/// but nothing survives a restart.
#[derive(Debug, Default)]
pub struct InMemoryEventStore {
    rows: Mutex<HashMap<Uuid, StoredEvent>>,
}

impl InMemoryEventStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a snapshot of every row, oldest first.
    pub fn snapshot(&self) -> Vec<StoredEvent> {
        let mut rows: Vec<StoredEvent> = self
            .rows
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .cloned()
            .collect();
        rows.sort_by_key(|row| (row.created_at, row.id));
        rows
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<Uuid, StoredEvent>>, DomainError> {
        self.rows
            .lock()
            .map_err(|_| DomainError::Infrastructure("event store lock poisoned".into()))
    }

    fn select(
        &self,
        predicate: impl Fn(&StoredEvent) -> bool,
    ) -> Result<Vec<StoredEvent>, DomainError> {
        let mut rows: Vec<StoredEvent> = self
            .lock()?
            .values()
            .filter(|row| predicate(row))
            .cloned()
            .collect();
        rows.sort_by_key(|row| (row.created_at, row.id));
        Ok(rows)
    }
}

#[async_trait]
impl EventStore for InMemoryEventStore {
    async fn insert(&self, event: &StoredEvent) -> Result<(), DomainError> {
        let mut rows = self.lock()?;
        if let Some(existing) = rows.get(&event.id) {
            return Err(DomainError::ConcurrencyConflict {
                event_id: event.id,
                expected: event.version,
                actual: existing.version,
            });
        }
        rows.insert(event.id, event.clone());
        Ok(())
    }

    async fn load(&self, event_id: Uuid) -> Result<Option<StoredEvent>, DomainError> {
        Ok(self.lock()?.get(&event_id).cloned())
    }

    async fn update(&self, event: &StoredEvent, expected_version: i64) -> Result<(), DomainError> {
        let mut rows = self.lock()?;
        let existing = rows
            .get_mut(&event.id)
            .ok_or(DomainError::EventNotFound(event.id))?;
        if existing.version != expected_version {
            return Err(DomainError::ConcurrencyConflict {
                event_id: event.id,
                expected: expected_version,
                actual: existing.version,
            });
        }
        *existing = event.clone();
        Ok(())
    }

    async fn find_by_state(
        &self,
        state: EventState,
        instance_id: Option<&str>,
    ) -> Result<Vec<StoredEvent>, DomainError> {
        self.select(|row| {
            row.state == state && instance_id.is_none_or(|instance| row.instance_id == instance)
        })
    }

    async fn find_children(&self, parent_id: Uuid) -> Result<Vec<StoredEvent>, DomainError> {
        self.select(|row| row.parent_event_id == Some(parent_id))
    }
}
