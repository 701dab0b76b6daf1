//! Read-only inspection of stored events.

use axum::extract::{Path, State};
use axum::{Json, Router, routing::get};
use chrono::{DateTime, Utc};
use idgov_core::error::DomainError;
use idgov_core::event_type::EventState;
use idgov_core::store::StoredEvent;
use serde::Serialize;
use tracing::instrument;
use uuid::Uuid;

use crate::error::ApiError;
use crate::state::AppState;

/// Summary of a stored event.
#[derive(Debug, Serialize)]
pub struct EventSummary {
    pub id: Uuid,
    /// Qualified type, e.g. `IDENTITY.CREATE`.
    pub event_type: String,
    pub state: EventState,
    /// Index of the last completed processor.
    pub closed_processor_index: Option<i32>,
    pub parent_event_id: Option<Uuid>,
    pub root_event_id: Option<Uuid>,
    pub instance_id: String,
    pub result_message: Option<String>,
    pub version: i64,
    pub properties: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<StoredEvent> for EventSummary {
    fn from(row: StoredEvent) -> Self {
        Self {
            id: row.id,
            event_type: format!("{}.{}", row.owner_type, row.event_type),
            state: row.state,
            closed_processor_index: row.closed_processor_index,
            parent_event_id: row.parent_event_id,
            root_event_id: row.root_event_id,
            instance_id: row.instance_id,
            result_message: row.result_message,
            version: row.version,
            properties: row.properties,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// GET /events/{id}
#[instrument(skip(state))]
async fn get_event(
    State(state): State<AppState>,
    Path(event_id): Path<Uuid>,
) -> Result<Json<EventSummary>, ApiError> {
    let row = state
        .store
        .load(event_id)
        .await?
        .ok_or(DomainError::EventNotFound(event_id))?;
    Ok(Json(row.into()))
}

/// GET /events/{id}/children
#[instrument(skip(state))]
async fn get_children(
    State(state): State<AppState>,
    Path(event_id): Path<Uuid>,
) -> Result<Json<Vec<EventSummary>>, ApiError> {
    if state.store.load(event_id).await?.is_none() {
        return Err(DomainError::EventNotFound(event_id).into());
    }
    let children = state.store.find_children(event_id).await?;
    Ok(Json(children.into_iter().map(EventSummary::from).collect()))
}

/// Returns the router for event inspection.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/{id}", get(get_event))
        .route("/{id}/children", get(get_children))
}
