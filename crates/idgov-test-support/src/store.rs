//! Test stores: mock `EventStore` implementations for tests.

use async_trait::async_trait;
use idgov_core::error::DomainError;
use idgov_core::event_type::EventState;
use idgov_core::store::{EventStore, StoredEvent};
use uuid::Uuid;

/// An event store that always returns an infrastructure error. Useful for
/// testing error-handling paths.
#[derive(Debug)]
pub struct FailingEventStore;

#[async_trait]
impl EventStore for FailingEventStore {
    async fn insert(&self, _event: &StoredEvent) -> Result<(), DomainError> {
        Err(DomainError::Infrastructure("connection refused".into()))
    }

    async fn load(&self, _event_id: Uuid) -> Result<Option<StoredEvent>, DomainError> {
        Err(DomainError::Infrastructure("connection refused".into()))
    }

    async fn update(&self, _event: &StoredEvent, _expected_version: i64) -> Result<(), DomainError> {
        Err(DomainError::Infrastructure("connection refused".into()))
    }

    async fn find_by_state(
        &self,
        _state: EventState,
        _instance_id: Option<&str>,
    ) -> Result<Vec<StoredEvent>, DomainError> {
        Err(DomainError::Infrastructure("connection refused".into()))
    }

    async fn find_children(&self, _parent_id: Uuid) -> Result<Vec<StoredEvent>, DomainError> {
        Err(DomainError::Infrastructure("connection refused".into()))
    }
}
