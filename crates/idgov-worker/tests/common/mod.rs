//! Shared test helpers for worker integration tests.
#![allow(dead_code)]

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use idgov_account::domain::connector::LoggingConnector;
use idgov_core::clock::Clock;
use idgov_core::store::EventStore;
use idgov_engine::{CallbackListener, CallbackRouter, EngineConfig};
use idgov_event_store::InMemoryEventStore;
use idgov_identity::domain::repository::InMemoryIdentityRepository;
use idgov_test_support::{FixedClock, RecordingWorkflowService};
use tower::ServiceExt;

use idgov_worker::app::{Collaborators, Engines, build_router};
use idgov_worker::state::AppState;

/// A worker wired on an in-memory store.
pub struct TestWorker {
    pub store: Arc<InMemoryEventStore>,
    pub workflow: Arc<RecordingWorkflowService>,
    pub engines: Engines,
    pub app: Router,
    listener: CallbackListener,
    callback_router: Arc<CallbackRouter>,
}

impl TestWorker {
    /// Drains the callback channel. Completes once every clone of `app`
    /// has been dropped.
    pub async fn drain_callbacks(self) {
        drop(self.app);
        self.listener.run(self.callback_router).await;
    }
}

/// Build the app with the same wiring as `main.rs`, on an
/// `InMemoryEventStore` and a deterministic clock.
pub fn build_test_worker(target_systems: &[&str]) -> TestWorker {
    let store = Arc::new(InMemoryEventStore::new());
    let clock: Arc<dyn Clock> = Arc::new(FixedClock::default());
    let workflow = Arc::new(RecordingWorkflowService::new());
    let engines = Engines::build(
        Collaborators {
            store: store.clone(),
            clock,
            workflow: workflow.clone(),
            connector: Arc::new(LoggingConnector),
            repository: Arc::new(InMemoryIdentityRepository::new()),
        },
        &EngineConfig::default(),
        target_systems.iter().map(|s| (*s).to_owned()).collect(),
    )
    .unwrap();

    let (callbacks, listener) = CallbackListener::channel(8);
    let dyn_store: Arc<dyn EventStore> = store.clone();
    let callback_router = Arc::new(engines.callback_router(Arc::clone(&dyn_store)).unwrap());
    let app = build_router(AppState::new(dyn_store, callbacks));

    TestWorker {
        store,
        workflow,
        engines,
        app,
        listener,
        callback_router,
    }
}

/// Send a POST request with a JSON body and return the response.
pub async fn post_json(
    app: Router,
    uri: &str,
    body: &serde_json::Value,
) -> (StatusCode, serde_json::Value) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_vec(body).unwrap()))
        .unwrap();

    send(app, request).await
}

/// Send a GET request and return the response.
pub async fn get_json(app: Router, uri: &str) -> (StatusCode, serde_json::Value) {
    let request = Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap();

    send(app, request).await
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, serde_json::Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let body_bytes = response.into_body().collect().await.unwrap().to_bytes();
    // Extractor rejections answer with plain text.
    let json = serde_json::from_slice(&body_bytes).unwrap_or_else(|_| {
        serde_json::Value::String(String::from_utf8_lossy(&body_bytes).into_owned())
    });

    (status, json)
}
