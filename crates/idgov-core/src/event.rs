//! Entity event envelope.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::clock::Clock;
use crate::error::DomainError;
use crate::event_type::{EventContent, EventState, EventType};
use crate::properties::{EventProperties, keys};
use crate::store::StoredEvent;

/// One domain mutation attempt and its progress through the processor chain.
///
/// Processors mutate `content` and `properties` in place; everything else is
/// managed by the engine.
#[derive(Debug, Clone)]
pub struct Event<T: EventType> {
    /// Unique event identifier, stable across suspend/resume.
    pub id: Uuid,
    /// The operation.
    pub event_type: T,
    /// Current working content.
    pub content: T::Content,
    /// Snapshot of the content taken at construction time.
    pub original_content: Option<T::Content>,
    /// Cross-processor context.
    pub properties: EventProperties,
    /// Parent event for sub-events.
    pub parent_event_id: Option<Uuid>,
    /// Top-most ancestor for sub-events.
    pub root_event_id: Option<Uuid>,
    /// Lifecycle state.
    pub state: EventState,
    /// Index of the last completed processor in the ordered chain.
    pub closed_processor_index: Option<usize>,
    /// Optimistic lock version; `0` until first persisted.
    pub version: i64,
    /// Process instance that owns the event.
    pub instance_id: String,
    /// Failure or cancellation reason.
    pub result_message: Option<String>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last modification timestamp.
    pub updated_at: DateTime<Utc>,
}

impl<T: EventType> Event<T> {
    /// Creates a new event with an empty property bag.
    #[must_use]
    pub fn new(event_type: T, content: T::Content, clock: &dyn Clock) -> Self {
        Self::with_properties(event_type, content, EventProperties::new(), clock)
    }

    /// Creates a new event carrying `properties`.
    #[must_use]
    pub fn with_properties(
        event_type: T,
        content: T::Content,
        properties: EventProperties,
        clock: &dyn Clock,
    ) -> Self {
        let now = clock.now();
        Self {
            id: Uuid::now_v7(),
            event_type,
            original_content: Some(content.clone()),
            content,
            properties,
            parent_event_id: None,
            root_event_id: None,
            state: EventState::Created,
            closed_processor_index: None,
            version: 0,
            instance_id: String::new(),
            result_message: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Creates a sub-event of `parent`, possibly of another domain.
    #[must_use]
    pub fn child_of<P: EventType>(
        parent: &Event<P>,
        event_type: T,
        content: T::Content,
        clock: &dyn Clock,
    ) -> Self {
        let mut child = Self::new(event_type, content, clock);
        child.parent_event_id = Some(parent.id);
        child.root_event_id = Some(parent.root_event_id.unwrap_or(parent.id));
        child.instance_id.clone_from(&parent.instance_id);
        child
    }

    /// Index of the next processor to run.
    #[must_use]
    pub fn next_processor_index(&self) -> usize {
        self.closed_processor_index.map_or(0, |index| index + 1)
    }

    /// Returns `true` for close sub-events.
    #[must_use]
    pub fn is_close_event(&self) -> bool {
        self.properties.is_set(keys::CLOSE)
    }

    /// Moves the event to `next`, enforcing the lifecycle state machine.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidTransition` if `state -> next` is not
    /// allowed.
    pub fn transition(&mut self, next: EventState, clock: &dyn Clock) -> Result<(), DomainError> {
        if !self.state.can_transition_to(next) {
            return Err(DomainError::InvalidTransition {
                event_id: self.id,
                from: self.state,
                to: next,
            });
        }
        self.state = next;
        self.updated_at = clock.now();
        Ok(())
    }

    /// Converts the event to its persisted form.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Infrastructure` if the content cannot be
    /// serialized or the processor cursor does not fit the column.
    pub fn to_stored(&self) -> Result<StoredEvent, DomainError> {
        let closed_processor_index = self
            .closed_processor_index
            .map(i32::try_from)
            .transpose()
            .map_err(|_| DomainError::Infrastructure("processor index overflow".into()))?;
        let original_content = self
            .original_content
            .as_ref()
            .map(serde_json::to_value)
            .transpose()?;

        Ok(StoredEvent {
            id: self.id,
            event_type: self.event_type.name().to_owned(),
            owner_type: T::OWNER_TYPE.to_owned(),
            owner_id: self.content.owner_id(),
            content: serde_json::to_value(&self.content)?,
            original_content,
            properties: self.properties.to_json(),
            state: self.state,
            closed_processor_index,
            parent_event_id: self.parent_event_id,
            root_event_id: self.root_event_id,
            instance_id: self.instance_id.clone(),
            result_message: self.result_message.clone(),
            version: self.version,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }

    /// Rebuilds an event from its persisted form.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::TypeMismatch` if the row belongs to another
    /// domain, and `DomainError::Infrastructure` if the event type is unknown
    /// or the content does not deserialize.
    pub fn from_stored(stored: StoredEvent) -> Result<Self, DomainError> {
        if stored.owner_type != T::OWNER_TYPE {
            return Err(DomainError::TypeMismatch {
                event_id: stored.id,
                expected: T::OWNER_TYPE.to_owned(),
                actual: stored.owner_type,
            });
        }
        let event_type = T::parse(&stored.event_type).ok_or_else(|| {
            DomainError::Infrastructure(format!(
                "unknown event type {}.{}",
                T::OWNER_TYPE,
                stored.event_type
            ))
        })?;
        let closed_processor_index = stored
            .closed_processor_index
            .map(usize::try_from)
            .transpose()
            .map_err(|_| DomainError::Infrastructure("negative processor index".into()))?;
        let original_content = stored
            .original_content
            .map(serde_json::from_value)
            .transpose()?;

        Ok(Self {
            id: stored.id,
            event_type,
            content: serde_json::from_value(stored.content)?,
            original_content,
            properties: EventProperties::from_json(stored.properties)?,
            parent_event_id: stored.parent_event_id,
            root_event_id: stored.root_event_id,
            state: stored.state,
            closed_processor_index,
            version: stored.version,
            instance_id: stored.instance_id,
            result_message: stored.result_message,
            created_at: stored.created_at,
            updated_at: stored.updated_at,
        })
    }
}
