//! Command handlers for the ACCOUNT context.
//!
//! Each handler turns a command into an `ACCOUNT.*` event and publishes it.
//! A handler returning a `SUSPENDED` result has not failed: the change is
//! accepted and waits for its approval.

use idgov_core::error::DomainError;
use idgov_core::event_type::EventState;
use idgov_core::properties::{EventProperties, keys};
use idgov_core::publisher::{EventOutcome, EventPublisher};
use idgov_engine::{DECISION_APPROVE, DECISION_REJECT};
use tracing::instrument;
use uuid::Uuid;

use crate::domain::account::Account;
use crate::domain::commands::{
    CreateAccount, DecideApproval, DeleteAccount, UpdateAccount, approval_properties,
};
use crate::domain::event_type::AccountEventType;

/// Result of a successfully handled command.
#[derive(Debug)]
pub struct AccountCommandResult {
    /// The event carrying the change.
    pub event_id: Uuid,
    /// Where the event stands after the call.
    pub state: EventState,
    /// The account as the chain left it; `None` for a stale decision.
    pub account: Option<Account>,
}

impl AccountCommandResult {
    fn from_outcome(outcome: EventOutcome<AccountEventType>) -> Self {
        match outcome {
            EventOutcome::Executed(event)
            | EventOutcome::Suspended(event)
            | EventOutcome::Canceled(event) => Self {
                event_id: event.id,
                state: event.state,
                account: Some(event.content),
            },
            EventOutcome::Stale { event_id, state } => Self {
                event_id,
                state,
                account: None,
            },
        }
    }

    /// Returns `true` while the change waits for approval.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.state == EventState::Suspended
    }
}

/// Handles the `CreateAccount` command.
///
/// # Errors
///
/// Returns `DomainError::ProcessorFailed` if validation or provisioning
/// fails.
#[instrument(skip_all, fields(system = %command.system_code, uid = %command.uid))]
pub async fn handle_create_account(
    command: &CreateAccount,
    publisher: &dyn EventPublisher<AccountEventType>,
) -> Result<AccountCommandResult, DomainError> {
    let outcome = publisher
        .publish(
            AccountEventType::Create,
            command.to_account(),
            approval_properties(command.skip_approval),
        )
        .await?;
    Ok(AccountCommandResult::from_outcome(outcome))
}

/// Handles the `UpdateAccount` command.
///
/// # Errors
///
/// See [`handle_create_account`].
#[instrument(skip_all, fields(account_id = %command.account.id))]
pub async fn handle_update_account(
    command: &UpdateAccount,
    publisher: &dyn EventPublisher<AccountEventType>,
) -> Result<AccountCommandResult, DomainError> {
    let outcome = publisher
        .publish(
            AccountEventType::Update,
            command.account.clone(),
            approval_properties(command.skip_approval),
        )
        .await?;
    Ok(AccountCommandResult::from_outcome(outcome))
}

/// Handles the `DeleteAccount` command. Deletions always go through
/// approval.
///
/// # Errors
///
/// See [`handle_create_account`].
#[instrument(skip_all, fields(account_id = %command.account.id))]
pub async fn handle_delete_account(
    command: &DeleteAccount,
    publisher: &dyn EventPublisher<AccountEventType>,
) -> Result<AccountCommandResult, DomainError> {
    let outcome = publisher
        .publish(
            AccountEventType::Delete,
            command.account.clone(),
            EventProperties::new(),
        )
        .await?;
    Ok(AccountCommandResult::from_outcome(outcome))
}

/// Handles the `DecideApproval` command: resumes the suspended event with
/// the approver's decision.
///
/// # Errors
///
/// Returns `DomainError::EventNotFound` for unknown events and
/// `DomainError::ProcessorFailed` wrapping `DomainError::Rejected` when the
/// change is rejected.
#[instrument(skip_all, fields(event_id = %command.event_id, approve = command.approve))]
pub async fn handle_decide_approval(
    command: &DecideApproval,
    publisher: &dyn EventPublisher<AccountEventType>,
) -> Result<AccountCommandResult, DomainError> {
    let decision = if command.approve {
        DECISION_APPROVE
    } else {
        DECISION_REJECT
    };
    let outcome = publisher
        .resume(
            command.event_id,
            EventProperties::new().with(keys::DECISION, decision),
        )
        .await?;
    Ok(AccountCommandResult::from_outcome(outcome))
}
