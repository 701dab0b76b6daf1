//! Query handlers for the ACCOUNT context.

use idgov_core::error::DomainError;
use idgov_core::event_type::{EventState, EventType};
use idgov_core::properties::keys;
use idgov_engine::EventEngine;
use serde::Serialize;
use uuid::Uuid;

use crate::domain::account::Account;
use crate::domain::event_type::AccountEventType;

/// Read-only view of an account change.
#[derive(Debug, Serialize)]
pub struct AccountEventView {
    pub event_id: Uuid,
    /// Qualified type, e.g. `ACCOUNT.CREATE`.
    pub event_type: String,
    pub state: EventState,
    /// Why the change waits, while suspended.
    pub waiting_for: Option<String>,
    /// Workflow process deciding the change.
    pub process_id: Option<String>,
    /// Failure or cancellation reason.
    pub result_message: Option<String>,
    pub account: Account,
}

/// Retrieves an account change by its event id.
///
/// # Errors
///
/// Returns `DomainError::EventNotFound` if no such event exists and
/// `DomainError::TypeMismatch` if the event is not an account change.
pub async fn get_account_event(
    event_id: Uuid,
    engine: &EventEngine<AccountEventType>,
) -> Result<AccountEventView, DomainError> {
    let event = engine.get(event_id).await?;
    let waiting_for = if event.state == EventState::Suspended {
        event.properties.get_str(keys::SUSPEND_REASON).map(str::to_owned)
    } else {
        None
    };

    Ok(AccountEventView {
        event_id: event.id,
        event_type: event.event_type.qualified_name(),
        state: event.state,
        waiting_for,
        process_id: event
            .properties
            .get_str(keys::WORKFLOW_PROCESS_ID)
            .map(str::to_owned),
        result_message: event.result_message,
        account: event.content,
    })
}
