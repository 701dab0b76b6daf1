//! Processors of the IDENTITY chain.
//!
//! Main chain: validate (0), approval and decision (50, 55; deletes only),
//! save or delete (100). Close chain: account provisioning, which publishes
//! one `ACCOUNT.*` sub-event per target system.

use std::sync::Arc;

use async_trait::async_trait;
use idgov_account::domain::account::Account;
use idgov_account::domain::event_type::AccountEventType;
use idgov_core::clock::Clock;
use idgov_core::error::DomainError;
use idgov_core::event::Event;
use idgov_core::event_type::EventType;
use idgov_core::processor::{EntityEventProcessor, ProcessorOutcome};
use idgov_core::properties::keys;
use idgov_core::publisher::{EventOutcome, EventPublisher};
use idgov_core::workflow::WorkflowService;
use idgov_engine::{ApprovalDecisionProcessor, ProcessorRegistry, WorkflowApprovalProcessor};
use tracing::{debug, info};

use crate::domain::event_type::IdentityEventType;
use crate::domain::identity::IdentityState;
use crate::domain::repository::IdentityRepository;

pub const VALIDATE_ID: &str = "identity-validate";
pub const APPROVAL_ID: &str = "identity-delete-approval";
pub const DECISION_ID: &str = "identity-delete-decision";
pub const SAVE_ID: &str = "identity-save";
pub const DELETE_ID: &str = "identity-delete";
pub const PROVISIONING_ID: &str = "identity-account-provisioning";

/// Workflow process definition approving identity deletions.
pub const DELETE_APPROVAL_DEFINITION: &str = "identity-delete-approval";

/// Checks username and email. Excluded when the event carries
/// `skip_validation`.
#[derive(Debug, Default)]
pub struct ValidateIdentityProcessor;

#[async_trait]
impl EntityEventProcessor<IdentityEventType> for ValidateIdentityProcessor {
    fn id(&self) -> &str {
        VALIDATE_ID
    }

    fn supported_types(&self) -> &[IdentityEventType] {
        &[IdentityEventType::Create, IdentityEventType::Update]
    }

    fn conditional(&self, event: &Event<IdentityEventType>) -> Result<bool, DomainError> {
        Ok(!event.properties.is_set(keys::SKIP_VALIDATION))
    }

    async fn process(
        &self,
        event: &mut Event<IdentityEventType>,
    ) -> Result<ProcessorOutcome, DomainError> {
        let identity = &mut event.content;
        identity.username = identity.username.trim().to_lowercase();

        if identity.username.is_empty() {
            return Err(DomainError::Validation("username must not be empty".into()));
        }
        if !identity
            .username
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_'))
        {
            return Err(DomainError::Validation(format!(
                "username contains invalid characters: {}",
                identity.username
            )));
        }
        if identity.last_name.trim().is_empty() {
            return Err(DomainError::Validation("last name must not be empty".into()));
        }
        if let Some(email) = &identity.email {
            if !email.contains('@') {
                return Err(DomainError::Validation(format!("invalid email: {email}")));
            }
        }
        Ok(ProcessorOutcome::Completed)
    }
}

/// Persists created, updated and disabled identities.
pub struct SaveIdentityProcessor {
    repository: Arc<dyn IdentityRepository>,
}

impl SaveIdentityProcessor {
    #[must_use]
    pub fn new(repository: Arc<dyn IdentityRepository>) -> Self {
        Self { repository }
    }
}

#[async_trait]
impl EntityEventProcessor<IdentityEventType> for SaveIdentityProcessor {
    fn id(&self) -> &str {
        SAVE_ID
    }

    fn supported_types(&self) -> &[IdentityEventType] {
        &[
            IdentityEventType::Create,
            IdentityEventType::Update,
            IdentityEventType::Disable,
        ]
    }

    fn order(&self) -> i32 {
        100
    }

    async fn process(
        &self,
        event: &mut Event<IdentityEventType>,
    ) -> Result<ProcessorOutcome, DomainError> {
        if event.event_type == IdentityEventType::Disable {
            event.content.state = IdentityState::Disabled;
        }
        self.repository.save(&event.content).await?;
        debug!(identity_id = %event.content.id, "identity saved");
        Ok(ProcessorOutcome::Completed)
    }
}

/// Removes deleted identities.
pub struct DeleteIdentityProcessor {
    repository: Arc<dyn IdentityRepository>,
}

impl DeleteIdentityProcessor {
    #[must_use]
    pub fn new(repository: Arc<dyn IdentityRepository>) -> Self {
        Self { repository }
    }
}

#[async_trait]
impl EntityEventProcessor<IdentityEventType> for DeleteIdentityProcessor {
    fn id(&self) -> &str {
        DELETE_ID
    }

    fn supported_types(&self) -> &[IdentityEventType] {
        &[IdentityEventType::Delete]
    }

    fn order(&self) -> i32 {
        100
    }

    async fn process(
        &self,
        event: &mut Event<IdentityEventType>,
    ) -> Result<ProcessorOutcome, DomainError> {
        self.repository.delete(event.content.id).await?;
        event.content.state = IdentityState::Deleted;
        debug!(identity_id = %event.content.id, "identity deleted");
        Ok(ProcessorOutcome::Completed)
    }
}

/// Close processor publishing one account sub-event per target system.
///
/// Sub-events skip account approval: the identity change they derive from
/// has already been approved or did not need it.
pub struct AccountProvisioningProcessor {
    accounts: Arc<dyn EventPublisher<AccountEventType>>,
    clock: Arc<dyn Clock>,
    target_systems: Vec<String>,
}

impl AccountProvisioningProcessor {
    #[must_use]
    pub fn new(
        accounts: Arc<dyn EventPublisher<AccountEventType>>,
        clock: Arc<dyn Clock>,
        target_systems: Vec<String>,
    ) -> Self {
        Self {
            accounts,
            clock,
            target_systems,
        }
    }
}

#[async_trait]
impl EntityEventProcessor<IdentityEventType> for AccountProvisioningProcessor {
    fn id(&self) -> &str {
        PROVISIONING_ID
    }

    fn supported_types(&self) -> &[IdentityEventType] {
        &[
            IdentityEventType::Create,
            IdentityEventType::Update,
            IdentityEventType::Disable,
            IdentityEventType::Delete,
        ]
    }

    fn close_after(&self) -> bool {
        true
    }

    async fn process(
        &self,
        event: &mut Event<IdentityEventType>,
    ) -> Result<ProcessorOutcome, DomainError> {
        let account_event_type = match event.event_type {
            IdentityEventType::Create => AccountEventType::Create,
            IdentityEventType::Update | IdentityEventType::Disable => {
                AccountEventType::Provisioning
            }
            IdentityEventType::Delete => AccountEventType::Delete,
        };

        for system in &self.target_systems {
            let mut account = Account::for_identity(
                event.content.id,
                system.clone(),
                event.content.username.clone(),
            );
            account.enabled = event.content.is_active();

            let mut child =
                Event::child_of(event, account_event_type, account, self.clock.as_ref());
            child.properties.set(keys::SKIP_APPROVAL, true);
            let child_id = child.id;

            match self.accounts.publish_event(child).await? {
                EventOutcome::Executed(_) => {
                    info!(
                        identity_id = %event.content.id,
                        %child_id,
                        system = %system,
                        account_event = %account_event_type.qualified_name(),
                        "account sub-event executed"
                    );
                }
                other => {
                    info!(
                        identity_id = %event.content.id,
                        %child_id,
                        system = %system,
                        state = %other.state(),
                        "account sub-event did not execute"
                    );
                }
            }
        }
        Ok(ProcessorOutcome::Completed)
    }
}

/// Collaborators of the IDENTITY chain.
pub struct IdentityCollaborators {
    pub repository: Arc<dyn IdentityRepository>,
    pub workflow: Arc<dyn WorkflowService>,
    /// Engine of the ACCOUNT domain, receiving provisioning sub-events.
    pub accounts: Arc<dyn EventPublisher<AccountEventType>>,
    pub clock: Arc<dyn Clock>,
    /// Systems every identity gets an account on.
    pub target_systems: Vec<String>,
}

/// Assembles the IDENTITY registry.
///
/// # Errors
///
/// Returns `DomainError::Validation` if a processor id is registered twice.
pub fn identity_registry(
    collaborators: IdentityCollaborators,
) -> Result<ProcessorRegistry<IdentityEventType>, DomainError> {
    let IdentityCollaborators {
        repository,
        workflow,
        accounts,
        clock,
        target_systems,
    } = collaborators;

    ProcessorRegistry::new()
        .with_processor(ValidateIdentityProcessor)?
        .with_processor(WorkflowApprovalProcessor::new(
            APPROVAL_ID,
            &[IdentityEventType::Delete],
            50,
            DELETE_APPROVAL_DEFINITION,
            workflow,
        ))?
        .with_processor(ApprovalDecisionProcessor::new(
            DECISION_ID,
            &[IdentityEventType::Delete],
            55,
        ))?
        .with_processor(SaveIdentityProcessor::new(Arc::clone(&repository)))?
        .with_processor(DeleteIdentityProcessor::new(repository))?
        .with_processor(AccountProvisioningProcessor::new(
            accounts,
            clock,
            target_systems,
        ))
}

#[cfg(test)]
mod tests {
    use idgov_test_support::FixedClock;

    use super::*;
    use crate::domain::identity::Identity;

    fn event(identity: Identity) -> Event<IdentityEventType> {
        Event::new(IdentityEventType::Create, identity, &FixedClock::default())
    }

    #[tokio::test]
    async fn test_validate_normalizes_username() {
        // Arrange
        let mut event = event(Identity::new("  JDoe ", "Doe"));

        // Act
        let outcome = ValidateIdentityProcessor.process(&mut event).await.unwrap();

        // Assert
        assert_eq!(outcome, ProcessorOutcome::Completed);
        assert_eq!(event.content.username, "jdoe");
    }

    #[tokio::test]
    async fn test_validate_rejects_bad_input() {
        let mut spaces = event(Identity::new("john doe", "Doe"));
        let mut no_last_name = event(Identity::new("jdoe", " "));
        let mut bad_email = event(Identity {
            email: Some("jdoe.example.com".into()),
            ..Identity::new("jdoe", "Doe")
        });

        for event in [&mut spaces, &mut no_last_name, &mut bad_email] {
            let result = ValidateIdentityProcessor.process(event).await;
            assert!(matches!(result, Err(DomainError::Validation(_))));
        }
    }

    #[test]
    fn test_skip_validation_is_a_conditional() {
        let mut event = event(Identity::new("jdoe", "Doe"));
        event.properties.set(keys::SKIP_VALIDATION, true);

        assert!(!ValidateIdentityProcessor.conditional(&event).unwrap());
    }
}
