//! Approval processors shared by every domain.
//!
//! [`WorkflowApprovalProcessor`] asks the workflow engine for an approval
//! process and suspends the chain while it runs. The workflow engine resumes
//! the event with a `decision` property, which [`ApprovalDecisionProcessor`]
//! (ordered right after it) turns into a rejection or lets through.

use std::sync::Arc;

use async_trait::async_trait;
use idgov_core::error::DomainError;
use idgov_core::event::Event;
use idgov_core::event_type::EventType;
use idgov_core::processor::{EntityEventProcessor, ProcessorOutcome, SuspendToken};
use idgov_core::properties::keys;
use idgov_core::workflow::{ApprovalRequest, WorkflowService};
use tracing::{debug, info};

/// Suspend reason of events waiting for a workflow decision.
pub const AWAITING_APPROVAL: &str = "awaiting approval";

/// Decision value approving an event.
pub const DECISION_APPROVE: &str = "approve";
/// Decision value rejecting an event.
pub const DECISION_REJECT: &str = "reject";

/// Starts an approval process and suspends until it decides.
///
/// Skipped at run time when the event carries `skip_approval`. The check is
/// made in `process` rather than in `conditional`, so the chain keeps the
/// same shape whatever properties a later resume merges in.
pub struct WorkflowApprovalProcessor<T: EventType> {
    id: String,
    types: Vec<T>,
    order: i32,
    definition_key: String,
    workflow: Arc<dyn WorkflowService>,
}

impl<T: EventType> WorkflowApprovalProcessor<T> {
    /// Creates an approval step running process `definition_key`.
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        types: &[T],
        order: i32,
        definition_key: impl Into<String>,
        workflow: Arc<dyn WorkflowService>,
    ) -> Self {
        Self {
            id: id.into(),
            types: types.to_vec(),
            order,
            definition_key: definition_key.into(),
            workflow,
        }
    }
}

#[async_trait]
impl<T: EventType> EntityEventProcessor<T> for WorkflowApprovalProcessor<T> {
    fn id(&self) -> &str {
        &self.id
    }

    fn supported_types(&self) -> &[T] {
        &self.types
    }

    fn order(&self) -> i32 {
        self.order
    }

    async fn process(&self, event: &mut Event<T>) -> Result<ProcessorOutcome, DomainError> {
        if event.properties.is_set(keys::SKIP_APPROVAL) {
            debug!(event_id = %event.id, "approval skipped");
            return Ok(ProcessorOutcome::Completed);
        }

        let request = ApprovalRequest {
            event_id: event.id,
            event_type: event.event_type.qualified_name(),
            definition_key: self.definition_key.clone(),
            content: serde_json::to_value(&event.content)?,
            properties: event.properties.clone(),
        };
        let start = self.workflow.start_approval_process(request).await?;

        match (start.started, start.process_instance_id) {
            (true, Some(process_id)) => {
                info!(
                    event_id = %event.id,
                    definition = %self.definition_key,
                    process_id = %process_id,
                    "approval process started"
                );
                event
                    .properties
                    .set(keys::WORKFLOW_DEFINITION, self.definition_key.clone());
                Ok(ProcessorOutcome::Suspended(
                    SuspendToken::new(AWAITING_APPROVAL).with_reference(process_id),
                ))
            }
            (true, None) => Err(DomainError::Infrastructure(format!(
                "workflow started {} without a process instance id",
                self.definition_key
            ))),
            (false, _) => {
                debug!(event_id = %event.id, "no approval required");
                Ok(ProcessorOutcome::Completed)
            }
        }
    }
}

/// Applies the decision delivered by the resume signal.
///
/// `reject` fails the event with [`DomainError::Rejected`] and `approve` lets
/// the chain go on. Without a decision the chain goes on only if no approval
/// process was started; a resume of a started process must carry one.
pub struct ApprovalDecisionProcessor<T: EventType> {
    id: String,
    types: Vec<T>,
    order: i32,
}

impl<T: EventType> ApprovalDecisionProcessor<T> {
    /// Creates a decision step; order it right after the approval step.
    #[must_use]
    pub fn new(id: impl Into<String>, types: &[T], order: i32) -> Self {
        Self {
            id: id.into(),
            types: types.to_vec(),
            order,
        }
    }
}

#[async_trait]
impl<T: EventType> EntityEventProcessor<T> for ApprovalDecisionProcessor<T> {
    fn id(&self) -> &str {
        &self.id
    }

    fn supported_types(&self) -> &[T] {
        &self.types
    }

    fn order(&self) -> i32 {
        self.order
    }

    async fn process(&self, event: &mut Event<T>) -> Result<ProcessorOutcome, DomainError> {
        match event.properties.get_str(keys::DECISION) {
            Some(DECISION_APPROVE) => Ok(ProcessorOutcome::Completed),
            Some(DECISION_REJECT) => Err(DomainError::Rejected(format!(
                "{} rejected by approver",
                event.event_type.qualified_name()
            ))),
            Some(other) => Err(DomainError::Validation(format!(
                "unknown approval decision: {other}"
            ))),
            None => match event.properties.get_str(keys::WORKFLOW_PROCESS_ID) {
                Some(process_id) => Err(DomainError::Validation(format!(
                    "approval process {process_id} resumed without a decision"
                ))),
                None => Ok(ProcessorOutcome::Completed),
            },
        }
    }
}
