//! Test workflow services.

use std::sync::Mutex;

use async_trait::async_trait;
use idgov_core::error::DomainError;
use idgov_core::workflow::{ApprovalRequest, ApprovalStart, WorkflowService};

/// A workflow service that records every approval request. Starts a process
/// named `process-<n>` for each request unless built with
/// [`RecordingWorkflowService::not_required`].
#[derive(Debug)]
pub struct RecordingWorkflowService {
    start_processes: bool,
    requests: Mutex<Vec<ApprovalRequest>>,
}

impl RecordingWorkflowService {
    /// A service that starts an approval process for every request.
    #[must_use]
    pub fn new() -> Self {
        Self {
            start_processes: true,
            requests: Mutex::new(Vec::new()),
        }
    }

    /// A service that never needs an approval.
    #[must_use]
    pub fn not_required() -> Self {
        Self {
            start_processes: false,
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Returns a snapshot of all recorded requests.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn requests(&self) -> Vec<ApprovalRequest> {
        self.requests.lock().unwrap().clone()
    }
}

impl Default for RecordingWorkflowService {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl WorkflowService for RecordingWorkflowService {
    async fn start_approval_process(
        &self,
        request: ApprovalRequest,
    ) -> Result<ApprovalStart, DomainError> {
        let mut requests = self.requests.lock().unwrap();
        requests.push(request);
        if self.start_processes {
            Ok(ApprovalStart::started(format!("process-{}", requests.len())))
        } else {
            Ok(ApprovalStart::not_required())
        }
    }
}

/// A workflow service whose engine is unreachable.
#[derive(Debug)]
pub struct FailingWorkflowService;

#[async_trait]
impl WorkflowService for FailingWorkflowService {
    async fn start_approval_process(
        &self,
        _request: ApprovalRequest,
    ) -> Result<ApprovalStart, DomainError> {
        Err(DomainError::Infrastructure("workflow engine unavailable".into()))
    }
}
