//! Command handlers for the IDENTITY context.

use idgov_core::error::DomainError;
use idgov_core::event_type::EventState;
use idgov_core::properties::EventProperties;
use idgov_core::publisher::{EventOutcome, EventPublisher};
use tracing::instrument;
use uuid::Uuid;

use crate::domain::commands::{CreateIdentity, DeleteIdentity, DisableIdentity, UpdateIdentity};
use crate::domain::event_type::IdentityEventType;
use crate::domain::identity::Identity;

/// Result of a successfully handled command.
#[derive(Debug)]
pub struct IdentityCommandResult {
    /// The event carrying the change.
    pub event_id: Uuid,
    pub state: EventState,
    /// The identity as the chain left it.
    pub identity: Option<Identity>,
}

impl From<EventOutcome<IdentityEventType>> for IdentityCommandResult {
    fn from(outcome: EventOutcome<IdentityEventType>) -> Self {
        match outcome {
            EventOutcome::Executed(event)
            | EventOutcome::Suspended(event)
            | EventOutcome::Canceled(event) => Self {
                event_id: event.id,
                state: event.state,
                identity: Some(event.content),
            },
            EventOutcome::Stale { event_id, state } => Self {
                event_id,
                state,
                identity: None,
            },
        }
    }
}

/// Handles the `CreateIdentity` command.
///
/// # Errors
///
/// Returns `DomainError::ProcessorFailed` if validation or saving fails.
#[instrument(skip_all, fields(username = %command.username))]
pub async fn handle_create_identity(
    command: &CreateIdentity,
    publisher: &dyn EventPublisher<IdentityEventType>,
) -> Result<IdentityCommandResult, DomainError> {
    publisher
        .publish(
            IdentityEventType::Create,
            command.to_identity(),
            command.properties(),
        )
        .await
        .map(IdentityCommandResult::from)
}

/// Handles the `UpdateIdentity` command.
///
/// # Errors
///
/// See [`handle_create_identity`].
#[instrument(skip_all, fields(identity_id = %command.identity.id))]
pub async fn handle_update_identity(
    command: &UpdateIdentity,
    publisher: &dyn EventPublisher<IdentityEventType>,
) -> Result<IdentityCommandResult, DomainError> {
    publisher
        .publish(
            IdentityEventType::Update,
            command.identity.clone(),
            EventProperties::new(),
        )
        .await
        .map(IdentityCommandResult::from)
}

/// Handles the `DisableIdentity` command.
///
/// # Errors
///
/// See [`handle_create_identity`].
#[instrument(skip_all, fields(identity_id = %command.identity.id))]
pub async fn handle_disable_identity(
    command: &DisableIdentity,
    publisher: &dyn EventPublisher<IdentityEventType>,
) -> Result<IdentityCommandResult, DomainError> {
    publisher
        .publish(
            IdentityEventType::Disable,
            command.identity.clone(),
            EventProperties::new(),
        )
        .await
        .map(IdentityCommandResult::from)
}

/// Handles the `DeleteIdentity` command. The result is `SUSPENDED` until the
/// deletion is approved.
///
/// # Errors
///
/// See [`handle_create_identity`].
#[instrument(skip_all, fields(identity_id = %command.identity.id))]
pub async fn handle_delete_identity(
    command: &DeleteIdentity,
    publisher: &dyn EventPublisher<IdentityEventType>,
) -> Result<IdentityCommandResult, DomainError> {
    publisher
        .publish(
            IdentityEventType::Delete,
            command.identity.clone(),
            EventProperties::new(),
        )
        .await
        .map(IdentityCommandResult::from)
}
