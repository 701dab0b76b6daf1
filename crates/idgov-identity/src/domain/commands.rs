//! Commands for the IDENTITY context.

use idgov_core::properties::{EventProperties, keys};

use super::identity::Identity;

/// Command to register a new identity.
#[derive(Debug, Clone)]
pub struct CreateIdentity {
    pub username: String,
    pub first_name: Option<String>,
    pub last_name: String,
    pub email: Option<String>,
    /// Trusted sources (e.g. an HR import) bypass validation.
    pub skip_validation: bool,
}

impl CreateIdentity {
    /// Builds the identity the command asks for.
    #[must_use]
    pub fn to_identity(&self) -> Identity {
        let mut identity = Identity::new(self.username.clone(), self.last_name.clone());
        identity.first_name.clone_from(&self.first_name);
        identity.email.clone_from(&self.email);
        identity
    }

    pub(crate) fn properties(&self) -> EventProperties {
        if self.skip_validation {
            EventProperties::new().with(keys::SKIP_VALIDATION, true)
        } else {
            EventProperties::new()
        }
    }
}

/// Command to change an identity.
#[derive(Debug, Clone)]
pub struct UpdateIdentity {
    /// The identity in its desired state.
    pub identity: Identity,
}

/// Command to disable an identity and its accounts.
#[derive(Debug, Clone)]
pub struct DisableIdentity {
    pub identity: Identity,
}

/// Command to delete an identity. Requires approval.
#[derive(Debug, Clone)]
pub struct DeleteIdentity {
    pub identity: Identity,
}
