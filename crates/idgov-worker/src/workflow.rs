//! Workflow service used by the worker process.

use async_trait::async_trait;
use idgov_core::error::DomainError;
use idgov_core::workflow::{ApprovalRequest, ApprovalStart, WorkflowService};
use tracing::info;

/// Hands approvals to an external approver who answers through
/// `POST /api/v1/workflow/callbacks`.
///
/// Every request starts a process whose instance id is derived from the
/// definition key and the event id, so a retried request names the same
/// process.
#[derive(Debug, Default)]
pub struct CallbackWorkflowService;

#[async_trait]
impl WorkflowService for CallbackWorkflowService {
    async fn start_approval_process(
        &self,
        request: ApprovalRequest,
    ) -> Result<ApprovalStart, DomainError> {
        let process_instance_id = format!("{}:{}", request.definition_key, request.event_id);
        info!(
            event_id = %request.event_id,
            event_type = %request.event_type,
            %process_instance_id,
            "approval process started, awaiting callback"
        );
        Ok(ApprovalStart::started(process_instance_id))
    }
}

#[cfg(test)]
mod tests {
    use idgov_core::properties::EventProperties;
    use uuid::Uuid;

    use super::*;

    #[tokio::test]
    async fn test_process_id_is_derived_from_definition_and_event() {
        // Arrange
        let event_id = Uuid::new_v4();
        let request = ApprovalRequest {
            event_id,
            event_type: "ACCOUNT.CREATE".into(),
            definition_key: "account-change-approval".into(),
            content: serde_json::json!({}),
            properties: EventProperties::new(),
        };

        // Act
        let start = CallbackWorkflowService
            .start_approval_process(request)
            .await
            .unwrap();

        // Assert
        assert!(start.started);
        assert_eq!(
            start.process_instance_id,
            Some(format!("account-change-approval:{event_id}"))
        );
    }
}
