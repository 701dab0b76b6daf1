//! Health check endpoint.

use axum::extract::State;
use axum::{Json, Router, routing::get};
use serde::Serialize;

use crate::state::AppState;

/// Health check response.
#[derive(Serialize)]
pub struct HealthResponse {
    /// `ok`, or `degraded` once the callback listener has stopped.
    pub status: &'static str,
    /// Service version.
    pub version: &'static str,
    /// Free slots in the callback channel.
    pub callback_capacity: usize,
}

/// GET /health
async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let status = if state.callbacks.is_closed() {
        "degraded"
    } else {
        "ok"
    };
    Json(HealthResponse {
        status,
        version: env!("CARGO_PKG_VERSION"),
        callback_capacity: state.callbacks.capacity(),
    })
}

/// Returns the health check router.
pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
