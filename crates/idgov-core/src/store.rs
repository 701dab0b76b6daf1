//! Event store abstraction.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::DomainError;
use crate::event_type::EventState;

/// Stored representation of an entity event.
///
/// This is the durable continuation of a suspended event: together with the
/// processor registry it is all the engine needs to resume the chain.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredEvent {
    /// Unique event identifier, stable across suspend/resume.
    pub id: Uuid,
    /// Operation name without the domain prefix (e.g. `"CREATE"`).
    pub event_type: String,
    /// Domain of the event (e.g. `"IDENTITY"`).
    pub owner_type: String,
    /// Identifier of the mutated entity, if it has one yet.
    pub owner_id: Option<Uuid>,
    /// Current working content.
    pub content: serde_json::Value,
    /// Snapshot of the content taken at publish time.
    pub original_content: Option<serde_json::Value>,
    /// Serialized property bag.
    pub properties: serde_json::Value,
    /// Lifecycle state.
    pub state: EventState,
    /// Index of the last completed processor in the ordered chain.
    pub closed_processor_index: Option<i32>,
    /// Parent event for sub-events.
    pub parent_event_id: Option<Uuid>,
    /// Top-most ancestor for sub-events.
    pub root_event_id: Option<Uuid>,
    /// Process instance that owns the event.
    pub instance_id: String,
    /// Failure or cancellation reason.
    pub result_message: Option<String>,
    /// Optimistic lock version.
    pub version: i64,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last modification timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Durable store of in-flight and finished events.
///
/// Rows are keyed by `id` and mutated only through optimistic, single-row
/// updates, which makes the store the single-writer arbiter for concurrent
/// `resume`/`cancel` calls on the same event.
#[async_trait]
pub trait EventStore: Send + Sync {
    /// Inserts a new row.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::ConcurrencyConflict` if the id already exists.
    async fn insert(&self, event: &StoredEvent) -> Result<(), DomainError>;

    /// Loads a row by id.
    async fn load(&self, event_id: Uuid) -> Result<Option<StoredEvent>, DomainError>;

    /// Replaces a row if its stored version equals `expected_version`.
    /// `event.version` is written as the new version.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::ConcurrencyConflict` on a version mismatch and
    /// `DomainError::EventNotFound` if the row does not exist.
    async fn update(&self, event: &StoredEvent, expected_version: i64) -> Result<(), DomainError>;

    /// Finds rows in `state`, optionally restricted to one process instance.
    async fn find_by_state(
        &self,
        state: EventState,
        instance_id: Option<&str>,
    ) -> Result<Vec<StoredEvent>, DomainError>;

    /// Finds the direct sub-events of `parent_id`, oldest first.
    async fn find_children(&self, parent_id: Uuid) -> Result<Vec<StoredEvent>, DomainError>;
}
