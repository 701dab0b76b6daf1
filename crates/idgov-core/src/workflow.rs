//! Workflow engine seam.
//!
//! The workflow (BPMN) engine is an external collaborator. The core asks it
//! to start approval processes; the workflow engine reports decisions back
//! as resume commands carrying the event id.

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::DomainError;
use crate::properties::EventProperties;

/// Request to start an approval process for an event.
#[derive(Debug, Clone)]
pub struct ApprovalRequest {
    /// The event awaiting approval; echoed back on resume.
    pub event_id: Uuid,
    /// Qualified event type, e.g. `"ACCOUNT.CREATE"`.
    pub event_type: String,
    /// Workflow process definition key.
    pub definition_key: String,
    /// Serialized content submitted for approval.
    pub content: serde_json::Value,
    /// Event properties at the time of the request.
    pub properties: EventProperties,
}

/// Answer of the workflow engine to an [`ApprovalRequest`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApprovalStart {
    /// `false` if no approval is needed and the chain may continue.
    pub started: bool,
    /// Identifier of the started process instance.
    pub process_instance_id: Option<String>,
}

impl ApprovalStart {
    /// A started process.
    #[must_use]
    pub fn started(process_instance_id: impl Into<String>) -> Self {
        Self {
            started: true,
            process_instance_id: Some(process_instance_id.into()),
        }
    }

    /// No process was needed.
    #[must_use]
    pub fn not_required() -> Self {
        Self {
            started: false,
            process_instance_id: None,
        }
    }
}

/// Client of the external workflow engine.
#[async_trait]
pub trait WorkflowService: Send + Sync {
    /// Starts an approval process for `request`.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Infrastructure` if the workflow engine cannot be
    /// reached.
    async fn start_approval_process(
        &self,
        request: ApprovalRequest,
    ) -> Result<ApprovalStart, DomainError>;
}
