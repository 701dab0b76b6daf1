//! `PostgreSQL` implementation of the `EventStore` trait.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use tracing::{debug, instrument};
use uuid::Uuid;

use idgov_core::error::DomainError;
use idgov_core::event_type::EventState;
use idgov_core::store::{EventStore, StoredEvent};

use crate::schema::EVENT_COLUMNS;

/// PostgreSQL-backed event store.
#[derive(Debug, Clone)]
pub struct PgEventStore {
    pool: PgPool,
}

impl PgEventStore {
    /// Creates a new `PgEventStore`.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn current_version(&self, event_id: Uuid) -> Result<Option<i64>, DomainError> {
        let version: Option<(i64,)> =
            sqlx::query_as("SELECT version FROM entity_events WHERE id = $1")
                .bind(event_id)
                .fetch_optional(&self.pool)
                .await
                .map_err(infrastructure)?;
        Ok(version.map(|(v,)| v))
    }
}

#[derive(Debug, FromRow)]
struct EventRow {
    id: Uuid,
    event_type: String,
    owner_type: String,
    owner_id: Option<Uuid>,
    content: serde_json::Value,
    original_content: Option<serde_json::Value>,
    properties: serde_json::Value,
    state: String,
    closed_processor_index: Option<i32>,
    parent_event_id: Option<Uuid>,
    root_event_id: Option<Uuid>,
    instance_id: String,
    result_message: Option<String>,
    version: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<EventRow> for StoredEvent {
    type Error = DomainError;

    fn try_from(row: EventRow) -> Result<Self, Self::Error> {
        Ok(StoredEvent {
            id: row.id,
            event_type: row.event_type,
            owner_type: row.owner_type,
            owner_id: row.owner_id,
            content: row.content,
            original_content: row.original_content,
            properties: row.properties,
            state: row.state.parse()?,
            closed_processor_index: row.closed_processor_index,
            parent_event_id: row.parent_event_id,
            root_event_id: row.root_event_id,
            instance_id: row.instance_id,
            result_message: row.result_message,
            version: row.version,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

fn infrastructure(err: sqlx::Error) -> DomainError {
    DomainError::Infrastructure(err.to_string())
}

fn into_stored(rows: Vec<EventRow>) -> Result<Vec<StoredEvent>, DomainError> {
    rows.into_iter().map(StoredEvent::try_from).collect()
}

#[async_trait]
impl EventStore for PgEventStore {
    #[instrument(skip(self, event), fields(event_id = %event.id, owner_type = %event.owner_type))]
    async fn insert(&self, event: &StoredEvent) -> Result<(), DomainError> {
        let result = sqlx::query(
            r"
            INSERT INTO entity_events (
                id, event_type, owner_type, owner_id, content, original_content,
                properties, state, closed_processor_index, parent_event_id,
                root_event_id, instance_id, result_message, version, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)
            ",
        )
        .bind(event.id)
        .bind(&event.event_type)
        .bind(&event.owner_type)
        .bind(event.owner_id)
        .bind(&event.content)
        .bind(&event.original_content)
        .bind(&event.properties)
        .bind(event.state.as_str())
        .bind(event.closed_processor_index)
        .bind(event.parent_event_id)
        .bind(event.root_event_id)
        .bind(&event.instance_id)
        .bind(&event.result_message)
        .bind(event.version)
        .bind(event.created_at)
        .bind(event.updated_at)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => {
                debug!(state = %event.state, "inserted entity event");
                Ok(())
            }
            Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
                let actual = self.current_version(event.id).await?.unwrap_or_default();
                Err(DomainError::ConcurrencyConflict {
                    event_id: event.id,
                    expected: event.version,
                    actual,
                })
            }
            Err(err) => Err(infrastructure(err)),
        }
    }

    #[instrument(skip(self))]
    async fn load(&self, event_id: Uuid) -> Result<Option<StoredEvent>, DomainError> {
        let sql = format!("SELECT {EVENT_COLUMNS} FROM entity_events WHERE id = $1");
        let row: Option<EventRow> = sqlx::query_as(&sql)
            .bind(event_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(infrastructure)?;

        row.map(StoredEvent::try_from).transpose()
    }

    #[instrument(skip(self, event), fields(event_id = %event.id, state = %event.state))]
    async fn update(&self, event: &StoredEvent, expected_version: i64) -> Result<(), DomainError> {
        let result = sqlx::query(
            r"
            UPDATE entity_events
            SET owner_id = $3,
                content = $4,
                properties = $5,
                state = $6,
                closed_processor_index = $7,
                result_message = $8,
                version = $9,
                updated_at = $10,
                instance_id = $11
            WHERE id = $1 AND version = $2
            ",
        )
        .bind(event.id)
        .bind(expected_version)
        .bind(event.owner_id)
        .bind(&event.content)
        .bind(&event.properties)
        .bind(event.state.as_str())
        .bind(event.closed_processor_index)
        .bind(&event.result_message)
        .bind(event.version)
        .bind(event.updated_at)
        .bind(&event.instance_id)
        .execute(&self.pool)
        .await
        .map_err(infrastructure)?;

        if result.rows_affected() == 1 {
            debug!(version = event.version, "updated entity event");
            return Ok(());
        }

        match self.current_version(event.id).await? {
            None => Err(DomainError::EventNotFound(event.id)),
            Some(actual) => Err(DomainError::ConcurrencyConflict {
                event_id: event.id,
                expected: expected_version,
                actual,
            }),
        }
    }

    #[instrument(skip(self))]
    async fn find_by_state(
        &self,
        state: EventState,
        instance_id: Option<&str>,
    ) -> Result<Vec<StoredEvent>, DomainError> {
        let sql = format!(
            "SELECT {EVENT_COLUMNS} FROM entity_events \
             WHERE state = $1 AND ($2::VARCHAR IS NULL OR instance_id = $2) \
             ORDER BY created_at, id"
        );
        let rows: Vec<EventRow> = sqlx::query_as(&sql)
            .bind(state.as_str())
            .bind(instance_id)
            .fetch_all(&self.pool)
            .await
            .map_err(infrastructure)?;

        into_stored(rows)
    }

    #[instrument(skip(self))]
    async fn find_children(&self, parent_id: Uuid) -> Result<Vec<StoredEvent>, DomainError> {
        let sql = format!(
            "SELECT {EVENT_COLUMNS} FROM entity_events \
             WHERE parent_event_id = $1 ORDER BY created_at, id"
        );
        let rows: Vec<EventRow> = sqlx::query_as(&sql)
            .bind(parent_id)
            .fetch_all(&self.pool)
            .await
            .map_err(infrastructure)?;

        into_stored(rows)
    }
}
