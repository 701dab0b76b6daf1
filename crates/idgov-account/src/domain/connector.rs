//! Provisioning connector seam.
//!
//! The wire protocol to target systems lives outside this workspace; the
//! connector only receives what has to change.

use async_trait::async_trait;
use idgov_core::error::DomainError;
use tracing::info;

use super::account::Account;

/// What a connector must do with an account.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProvisioningOperation {
    Create,
    Update,
    Delete,
}

impl ProvisioningOperation {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
        }
    }
}

/// Client of a target system.
#[async_trait]
pub trait ProvisioningConnector: Send + Sync {
    /// Applies `operation` for `account` on its target system.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Infrastructure` if the target system cannot be
    /// reached or refuses the change.
    async fn provision(
        &self,
        operation: ProvisioningOperation,
        account: &Account,
    ) -> Result<(), DomainError>;
}

/// Connector that only logs the requested changes. Used when no target
/// system is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingConnector;

#[async_trait]
impl ProvisioningConnector for LoggingConnector {
    async fn provision(
        &self,
        operation: ProvisioningOperation,
        account: &Account,
    ) -> Result<(), DomainError> {
        info!(
            operation = operation.as_str(),
            account_id = %account.id,
            system = %account.system_code,
            uid = %account.uid,
            "provisioning request"
        );
        Ok(())
    }
}
