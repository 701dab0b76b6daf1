//! Integration tests for `PgEventStore`.
//!
//! These need a PostgreSQL instance reachable through `DATABASE_URL`; run
//! them with `cargo test -- --ignored`.

use chrono::{TimeZone, Utc};
use idgov_core::error::DomainError;
use idgov_core::event_type::EventState;
use idgov_core::store::{EventStore, StoredEvent};
use idgov_event_store::PgEventStore;
use sqlx::PgPool;
use uuid::Uuid;

/// Helper to build a `StoredEvent` with sensible defaults.
fn make_stored_event(state: EventState, instance_id: &str) -> StoredEvent {
    let now = Utc.with_ymd_and_hms(2026, 1, 15, 10, 0, 0).unwrap();
    StoredEvent {
        id: Uuid::new_v4(),
        event_type: "CREATE".to_string(),
        owner_type: "ACCOUNT".to_string(),
        owner_id: Some(Uuid::new_v4()),
        content: serde_json::json!({"uid": "jdoe"}),
        original_content: Some(serde_json::json!({"uid": "jdoe"})),
        properties: serde_json::json!({"check_right": true}),
        state,
        closed_processor_index: None,
        parent_event_id: None,
        root_event_id: None,
        instance_id: instance_id.to_string(),
        result_message: None,
        version: 1,
        created_at: now,
        updated_at: now,
    }
}

// --- load ---

#[sqlx::test(migrations = "../../migrations")]
#[ignore = "requires DATABASE_URL"]
async fn test_load_returns_none_for_unknown_event(pool: PgPool) {
    let store = PgEventStore::new(pool);

    let loaded = store.load(Uuid::new_v4()).await.unwrap();

    assert!(loaded.is_none());
}

// --- insert + load round-trip ---

#[sqlx::test(migrations = "../../migrations")]
#[ignore = "requires DATABASE_URL"]
async fn test_insert_and_load_suspended_continuation(pool: PgPool) {
    let store = PgEventStore::new(pool);
    let mut event = make_stored_event(EventState::Suspended, "node-a");
    event.closed_processor_index = Some(1);

    store.insert(&event).await.unwrap();

    let loaded = store.load(event.id).await.unwrap().unwrap();
    assert_eq!(loaded, event);
}

#[sqlx::test(migrations = "../../migrations")]
#[ignore = "requires DATABASE_URL"]
async fn test_duplicate_insert_is_a_concurrency_conflict(pool: PgPool) {
    let store = PgEventStore::new(pool);
    let event = make_stored_event(EventState::Running, "node-a");
    store.insert(&event).await.unwrap();

    let result = store.insert(&event).await;

    assert!(matches!(result, Err(DomainError::ConcurrencyConflict { .. })));
}

// --- optimistic update ---

#[sqlx::test(migrations = "../../migrations")]
#[ignore = "requires DATABASE_URL"]
async fn test_update_bumps_version(pool: PgPool) {
    let store = PgEventStore::new(pool);
    let event = make_stored_event(EventState::Suspended, "node-a");
    store.insert(&event).await.unwrap();

    let mut resumed = event.clone();
    resumed.state = EventState::Running;
    resumed.version = 2;
    store.update(&resumed, 1).await.unwrap();

    let loaded = store.load(event.id).await.unwrap().unwrap();
    assert_eq!(loaded.state, EventState::Running);
    assert_eq!(loaded.version, 2);
}

#[sqlx::test(migrations = "../../migrations")]
#[ignore = "requires DATABASE_URL"]
async fn test_second_writer_with_same_expected_version_conflicts(pool: PgPool) {
    let store = PgEventStore::new(pool);
    let event = make_stored_event(EventState::Suspended, "node-a");
    store.insert(&event).await.unwrap();

    let mut resumed = event.clone();
    resumed.state = EventState::Running;
    resumed.version = 2;
    store.update(&resumed, 1).await.unwrap();

    let mut canceled = event.clone();
    canceled.state = EventState::Canceled;
    canceled.version = 2;
    let result = store.update(&canceled, 1).await;

    match result {
        Err(DomainError::ConcurrencyConflict {
            event_id,
            expected,
            actual,
        }) => {
            assert_eq!(event_id, event.id);
            assert_eq!(expected, 1);
            assert_eq!(actual, 2);
        }
        other => panic!("expected ConcurrencyConflict, got {other:?}"),
    }
}

#[sqlx::test(migrations = "../../migrations")]
#[ignore = "requires DATABASE_URL"]
async fn test_update_unknown_event_is_not_found(pool: PgPool) {
    let store = PgEventStore::new(pool);
    let event = make_stored_event(EventState::Running, "node-a");

    let result = store.update(&event, 0).await;

    assert!(matches!(result, Err(DomainError::EventNotFound(id)) if id == event.id));
}

// --- queries ---

#[sqlx::test(migrations = "../../migrations")]
#[ignore = "requires DATABASE_URL"]
async fn test_find_by_state_is_scoped_to_instance(pool: PgPool) {
    let store = PgEventStore::new(pool);
    let own = make_stored_event(EventState::Running, "node-a");
    let foreign = make_stored_event(EventState::Running, "node-b");
    let suspended = make_stored_event(EventState::Suspended, "node-a");
    for event in [&own, &foreign, &suspended] {
        store.insert(event).await.unwrap();
    }

    let running_here = store
        .find_by_state(EventState::Running, Some("node-a"))
        .await
        .unwrap();
    let running_anywhere = store.find_by_state(EventState::Running, None).await.unwrap();

    assert_eq!(running_here.len(), 1);
    assert_eq!(running_here[0].id, own.id);
    assert_eq!(running_anywhere.len(), 2);
}

#[sqlx::test(migrations = "../../migrations")]
#[ignore = "requires DATABASE_URL"]
async fn test_find_children_returns_sub_events(pool: PgPool) {
    let store = PgEventStore::new(pool);
    let parent = make_stored_event(EventState::Executed, "node-a");
    let mut child = make_stored_event(EventState::Executed, "node-a");
    child.parent_event_id = Some(parent.id);
    child.root_event_id = Some(parent.id);
    store.insert(&parent).await.unwrap();
    store.insert(&child).await.unwrap();

    let children = store.find_children(parent.id).await.unwrap();

    assert_eq!(children.len(), 1);
    assert_eq!(children[0].id, child.id);
}
