//! Account content.

use idgov_core::event_type::EventContent;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An account of an identity on one target system.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    /// Account identifier.
    pub id: Uuid,
    /// Owning identity, if the account is not a shared one.
    pub identity_id: Option<Uuid>,
    /// Code of the target system.
    pub system_code: String,
    /// Login on the target system.
    pub uid: String,
    /// Whether the account may be used.
    pub enabled: bool,
    /// Set once the target system has acknowledged the account.
    pub provisioned: bool,
}

impl Account {
    /// Creates an enabled, not yet provisioned account.
    #[must_use]
    pub fn new(system_code: impl Into<String>, uid: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            identity_id: None,
            system_code: system_code.into(),
            uid: uid.into(),
            enabled: true,
            provisioned: false,
        }
    }

    /// The account of `identity_id` on `system_code`. The id is derived from
    /// both, so every change to that account targets the same row.
    #[must_use]
    pub fn for_identity(
        identity_id: Uuid,
        system_code: impl Into<String>,
        uid: impl Into<String>,
    ) -> Self {
        let system_code = system_code.into();
        Self {
            id: Uuid::new_v5(&identity_id, system_code.as_bytes()),
            identity_id: Some(identity_id),
            system_code,
            uid: uid.into(),
            enabled: true,
            provisioned: false,
        }
    }

    /// Assigns the account to an identity.
    #[must_use]
    pub fn owned_by(mut self, identity_id: Uuid) -> Self {
        self.identity_id = Some(identity_id);
        self
    }
}

impl EventContent for Account {
    fn owner_id(&self) -> Option<Uuid> {
        Some(self.id)
    }
}
