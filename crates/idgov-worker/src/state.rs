//! Shared application state.

use std::sync::Arc;

use idgov_core::store::EventStore;
use idgov_engine::WorkflowCallback;
use tokio::sync::mpsc;

/// Application state shared across all request handlers.
#[derive(Clone)]
pub struct AppState {
    /// Event store, read by the inspection endpoints.
    pub store: Arc<dyn EventStore>,
    /// Sending side of the workflow callback channel.
    pub callbacks: mpsc::Sender<WorkflowCallback>,
}

impl AppState {
    /// Create new application state.
    #[must_use]
    pub fn new(store: Arc<dyn EventStore>, callbacks: mpsc::Sender<WorkflowCallback>) -> Self {
        Self { store, callbacks }
    }
}
