//! Inbound workflow callbacks.
//!
//! The workflow engine posts its decisions here. The handler only checks
//! that the event exists and enqueues a [`WorkflowCallback`]; the callback
//! listener applies it.

use axum::extract::State;
use axum::http::StatusCode;
use axum::{Json, Router, routing::post};
use idgov_core::error::DomainError;
use idgov_core::properties::EventProperties;
use idgov_engine::WorkflowCallback;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::error::ApiError;
use crate::state::AppState;

/// What the workflow engine asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallbackAction {
    Resume,
    Cancel,
}

/// Request body for POST /workflow/callbacks.
#[derive(Debug, Deserialize)]
pub struct CallbackRequest {
    /// The suspended event.
    pub event_id: Uuid,
    pub action: CallbackAction,
    /// Properties merged into the event on resume, e.g. `{"decision": "approve"}`.
    #[serde(default)]
    pub properties: Option<serde_json::Value>,
}

/// Response body for an accepted callback.
#[derive(Debug, Serialize)]
pub struct CallbackAccepted {
    pub event_id: Uuid,
    pub status: &'static str,
}

/// POST /workflow/callbacks
#[instrument(skip(state, request), fields(event_id = %request.event_id, action = ?request.action))]
async fn post_callback(
    State(state): State<AppState>,
    Json(request): Json<CallbackRequest>,
) -> Result<(StatusCode, Json<CallbackAccepted>), ApiError> {
    let callback = match request.action {
        CallbackAction::Resume => {
            let properties = match request.properties {
                Some(value) => EventProperties::from_json(value).map_err(|e| {
                    DomainError::Validation(format!("properties must be a JSON object: {e}"))
                })?,
                None => EventProperties::new(),
            };
            WorkflowCallback::Resume {
                event_id: request.event_id,
                properties,
            }
        }
        CallbackAction::Cancel => WorkflowCallback::Cancel {
            event_id: request.event_id,
        },
    };

    if state.store.load(request.event_id).await?.is_none() {
        return Err(DomainError::EventNotFound(request.event_id).into());
    }

    state
        .callbacks
        .send(callback)
        .await
        .map_err(|_| DomainError::Infrastructure("callback listener is not running".into()))?;

    info!("workflow callback enqueued");

    Ok((
        StatusCode::ACCEPTED,
        Json(CallbackAccepted {
            event_id: request.event_id,
            status: "accepted",
        }),
    ))
}

/// Returns the router for workflow callbacks.
pub fn router() -> Router<AppState> {
    Router::new().route("/callbacks", post(post_callback))
}
