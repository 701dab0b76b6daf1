//! Integration tests for the workflow callback endpoint.

mod common;

use axum::http::StatusCode;
use idgov_account::domain::account::Account;
use idgov_account::domain::event_type::AccountEventType;
use idgov_core::event_type::EventState;
use idgov_core::properties::EventProperties;
use idgov_core::store::EventStore;
use serde_json::json;
use uuid::Uuid;

const CALLBACKS: &str = "/api/v1/workflow/callbacks";

async fn suspended_account_event(worker: &common::TestWorker) -> Uuid {
    let outcome = worker
        .engines
        .accounts
        .publish(
            AccountEventType::Create,
            Account::new("ldap", "jdoe"),
            EventProperties::new(),
        )
        .await
        .unwrap();
    assert_eq!(outcome.state(), EventState::Suspended);
    outcome.event().unwrap().id
}

#[tokio::test]
async fn test_approve_callback_resumes_the_suspended_event() {
    // Arrange
    let worker = common::build_test_worker(&[]);
    let event_id = suspended_account_event(&worker).await;
    let store = worker.store.clone();

    // Act
    let (status, json) = common::post_json(
        worker.app.clone(),
        CALLBACKS,
        &json!({
            "event_id": event_id,
            "action": "resume",
            "properties": { "decision": "approve" }
        }),
    )
    .await;
    worker.drain_callbacks().await;

    // Assert
    assert_eq!(status, StatusCode::ACCEPTED);
    assert_eq!(json["status"], "accepted");
    let stored = store.load(event_id).await.unwrap().unwrap();
    assert_eq!(stored.state, EventState::Executed);
    assert_eq!(stored.content["provisioned"], true);
}

#[tokio::test]
async fn test_cancel_callback_cancels_the_suspended_event() {
    let worker = common::build_test_worker(&[]);
    let event_id = suspended_account_event(&worker).await;
    let store = worker.store.clone();

    let (status, _) = common::post_json(
        worker.app.clone(),
        CALLBACKS,
        &json!({ "event_id": event_id, "action": "cancel" }),
    )
    .await;
    worker.drain_callbacks().await;

    assert_eq!(status, StatusCode::ACCEPTED);
    let stored = store.load(event_id).await.unwrap().unwrap();
    assert_eq!(stored.state, EventState::Canceled);
}

#[tokio::test]
async fn test_duplicate_callback_is_accepted_and_ignored() {
    // Arrange
    let worker = common::build_test_worker(&[]);
    let event_id = suspended_account_event(&worker).await;
    let store = worker.store.clone();
    let body = json!({
        "event_id": event_id,
        "action": "resume",
        "properties": { "decision": "approve" }
    });

    // Act
    let (first, _) = common::post_json(worker.app.clone(), CALLBACKS, &body).await;
    let (second, _) = common::post_json(worker.app.clone(), CALLBACKS, &body).await;
    worker.drain_callbacks().await;

    // Assert
    assert_eq!(first, StatusCode::ACCEPTED);
    assert_eq!(second, StatusCode::ACCEPTED);
    let stored = store.load(event_id).await.unwrap().unwrap();
    assert_eq!(stored.state, EventState::Executed);
}

#[tokio::test]
async fn test_callback_for_unknown_event_returns_404() {
    let worker = common::build_test_worker(&[]);

    let (status, json) = common::post_json(
        worker.app.clone(),
        CALLBACKS,
        &json!({ "event_id": Uuid::new_v4(), "action": "cancel" }),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["error"], "event_not_found");
}

#[tokio::test]
async fn test_non_object_properties_return_400() {
    let worker = common::build_test_worker(&[]);
    let event_id = suspended_account_event(&worker).await;

    let (status, json) = common::post_json(
        worker.app.clone(),
        CALLBACKS,
        &json!({ "event_id": event_id, "action": "resume", "properties": ["approve"] }),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "validation_error");
}

#[tokio::test]
async fn test_unknown_action_is_rejected() {
    let worker = common::build_test_worker(&[]);
    let event_id = suspended_account_event(&worker).await;

    let (status, _) = common::post_json(
        worker.app.clone(),
        CALLBACKS,
        &json!({ "event_id": event_id, "action": "pause" }),
    )
    .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}
