//! Processors of the ACCOUNT chain.
//!
//! | order | id | types |
//! |---|---|---|
//! | 10 | `account-validate` | create, update |
//! | 20 | `account-approval` | create, update, delete |
//! | 25 | `account-approval-decision` | create, update, delete |
//! | 30 | `account-provision` | all |

use std::sync::Arc;

use async_trait::async_trait;
use idgov_core::error::DomainError;
use idgov_core::event::Event;
use idgov_core::event_type::EventType;
use idgov_core::processor::{EntityEventProcessor, ProcessorOutcome};
use idgov_core::properties::keys;
use idgov_core::workflow::WorkflowService;
use idgov_engine::{ApprovalDecisionProcessor, ProcessorRegistry, WorkflowApprovalProcessor};
use tracing::info;

use crate::domain::connector::{ProvisioningConnector, ProvisioningOperation};
use crate::domain::event_type::AccountEventType;

pub const VALIDATE_ID: &str = "account-validate";
pub const APPROVAL_ID: &str = "account-approval";
pub const DECISION_ID: &str = "account-approval-decision";
pub const PROVISION_ID: &str = "account-provision";

pub const VALIDATE_ORDER: i32 = 10;
pub const APPROVAL_ORDER: i32 = 20;
pub const DECISION_ORDER: i32 = 25;
pub const PROVISION_ORDER: i32 = 30;

/// Workflow process definition approving account changes.
pub const APPROVAL_DEFINITION: &str = "account-change-approval";

const APPROVED_TYPES: &[AccountEventType] = &[
    AccountEventType::Create,
    AccountEventType::Update,
    AccountEventType::Delete,
];

/// Normalizes and checks the account before anything else touches it.
/// Excluded from the chain when the event carries `skip_validation`.
#[derive(Debug, Default)]
pub struct ValidateAccountProcessor;

#[async_trait]
impl EntityEventProcessor<AccountEventType> for ValidateAccountProcessor {
    fn id(&self) -> &str {
        VALIDATE_ID
    }

    fn supported_types(&self) -> &[AccountEventType] {
        &[AccountEventType::Create, AccountEventType::Update]
    }

    fn order(&self) -> i32 {
        VALIDATE_ORDER
    }

    fn conditional(&self, event: &Event<AccountEventType>) -> Result<bool, DomainError> {
        Ok(!event.properties.is_set(keys::SKIP_VALIDATION))
    }

    async fn process(
        &self,
        event: &mut Event<AccountEventType>,
    ) -> Result<ProcessorOutcome, DomainError> {
        let account = &mut event.content;
        account.system_code = account.system_code.trim().to_owned();
        account.uid = account.uid.trim().to_owned();

        if account.system_code.is_empty() {
            return Err(DomainError::Validation(
                "account system code must not be empty".into(),
            ));
        }
        if account.uid.is_empty() {
            return Err(DomainError::Validation("account uid must not be empty".into()));
        }
        if account.uid.chars().any(char::is_whitespace) {
            return Err(DomainError::Validation(format!(
                "account uid must not contain whitespace: {:?}",
                account.uid
            )));
        }
        Ok(ProcessorOutcome::Completed)
    }
}

/// Pushes the account to its target system.
pub struct ProvisionAccountProcessor {
    connector: Arc<dyn ProvisioningConnector>,
}

impl ProvisionAccountProcessor {
    #[must_use]
    pub fn new(connector: Arc<dyn ProvisioningConnector>) -> Self {
        Self { connector }
    }
}

#[async_trait]
impl EntityEventProcessor<AccountEventType> for ProvisionAccountProcessor {
    fn id(&self) -> &str {
        PROVISION_ID
    }

    fn supported_types(&self) -> &[AccountEventType] {
        AccountEventType::all()
    }

    fn order(&self) -> i32 {
        PROVISION_ORDER
    }

    async fn process(
        &self,
        event: &mut Event<AccountEventType>,
    ) -> Result<ProcessorOutcome, DomainError> {
        let operation = match event.event_type {
            AccountEventType::Create => ProvisioningOperation::Create,
            AccountEventType::Update | AccountEventType::Provisioning => {
                ProvisioningOperation::Update
            }
            AccountEventType::Delete => ProvisioningOperation::Delete,
        };
        self.connector.provision(operation, &event.content).await?;
        event.content.provisioned = operation != ProvisioningOperation::Delete;

        info!(
            event_id = %event.id,
            account_id = %event.content.id,
            operation = operation.as_str(),
            "account provisioned"
        );
        Ok(ProcessorOutcome::Completed)
    }
}

/// Assembles the ACCOUNT registry.
///
/// # Errors
///
/// Returns `DomainError::Validation` if a processor id is registered twice.
pub fn account_registry(
    workflow: Arc<dyn WorkflowService>,
    connector: Arc<dyn ProvisioningConnector>,
) -> Result<ProcessorRegistry<AccountEventType>, DomainError> {
    ProcessorRegistry::new()
        .with_processor(ValidateAccountProcessor)?
        .with_processor(WorkflowApprovalProcessor::new(
            APPROVAL_ID,
            APPROVED_TYPES,
            APPROVAL_ORDER,
            APPROVAL_DEFINITION,
            workflow,
        ))?
        .with_processor(ApprovalDecisionProcessor::new(
            DECISION_ID,
            APPROVED_TYPES,
            DECISION_ORDER,
        ))?
        .with_processor(ProvisionAccountProcessor::new(connector))
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use idgov_core::properties::EventProperties;
    use idgov_engine::chain::build_chain;
    use idgov_test_support::{FixedClock, RecordingWorkflowService};

    use super::*;
    use crate::domain::account::Account;
    use crate::domain::connector::LoggingConnector;

    fn event(event_type: AccountEventType, account: Account) -> Event<AccountEventType> {
        Event::new(event_type, account, &FixedClock::default())
    }

    fn registry() -> ProcessorRegistry<AccountEventType> {
        account_registry(
            Arc::new(RecordingWorkflowService::new()),
            Arc::new(LoggingConnector),
        )
        .unwrap()
    }

    fn chain_ids(event: &Event<AccountEventType>) -> Vec<String> {
        build_chain(&registry(), event, &HashSet::new())
            .unwrap()
            .iter()
            .map(|entry| entry.id().to_owned())
            .collect()
    }

    #[test]
    fn test_create_chain_order() {
        let event = event(AccountEventType::Create, Account::new("ldap", "jdoe"));

        assert_eq!(
            chain_ids(&event),
            vec![VALIDATE_ID, APPROVAL_ID, DECISION_ID, PROVISION_ID]
        );
    }

    #[test]
    fn test_provisioning_chain_has_no_approval() {
        let event = event(AccountEventType::Provisioning, Account::new("ldap", "jdoe"));

        assert_eq!(chain_ids(&event), vec![PROVISION_ID]);
    }

    #[test]
    fn test_skip_validation_removes_validate_step() {
        let mut event = event(AccountEventType::Update, Account::new("ldap", "jdoe"));
        event.properties = EventProperties::new().with(keys::SKIP_VALIDATION, true);

        assert_eq!(chain_ids(&event), vec![APPROVAL_ID, DECISION_ID, PROVISION_ID]);
    }

    #[tokio::test]
    async fn test_validate_trims_fields() {
        // Arrange
        let mut event = event(AccountEventType::Create, Account::new(" ldap ", " jdoe"));

        // Act
        let outcome = ValidateAccountProcessor.process(&mut event).await.unwrap();

        // Assert
        assert_eq!(outcome, ProcessorOutcome::Completed);
        assert_eq!(event.content.system_code, "ldap");
        assert_eq!(event.content.uid, "jdoe");
    }

    #[tokio::test]
    async fn test_validate_rejects_blank_uid() {
        let mut event = event(AccountEventType::Create, Account::new("ldap", "  "));

        let result = ValidateAccountProcessor.process(&mut event).await;

        assert!(matches!(result, Err(DomainError::Validation(_))));
    }

    #[tokio::test]
    async fn test_validate_rejects_uid_with_spaces() {
        let mut event = event(AccountEventType::Create, Account::new("ldap", "john doe"));

        let result = ValidateAccountProcessor.process(&mut event).await;

        assert!(matches!(result, Err(DomainError::Validation(_))));
    }

    #[tokio::test]
    async fn test_provision_marks_account_provisioned() {
        let processor = ProvisionAccountProcessor::new(Arc::new(LoggingConnector));
        let mut create = event(AccountEventType::Create, Account::new("ldap", "jdoe"));
        let mut delete = event(AccountEventType::Delete, create.content.clone());

        processor.process(&mut create).await.unwrap();
        processor.process(&mut delete).await.unwrap();

        assert!(create.content.provisioned);
        assert!(!delete.content.provisioned);
    }
}
