//! Identity content.

use idgov_core::event_type::EventContent;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lifecycle of an identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IdentityState {
    Valid,
    Disabled,
    Deleted,
}

/// A person known to the platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub id: Uuid,
    /// Unique login, also used as the account uid on target systems.
    pub username: String,
    pub first_name: Option<String>,
    pub last_name: String,
    pub email: Option<String>,
    pub state: IdentityState,
}

impl Identity {
    /// Creates a valid identity.
    #[must_use]
    pub fn new(username: impl Into<String>, last_name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            username: username.into(),
            first_name: None,
            last_name: last_name.into(),
            email: None,
            state: IdentityState::Valid,
        }
    }

    /// Returns `true` if accounts of the identity may be used.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.state == IdentityState::Valid
    }
}

impl EventContent for Identity {
    fn owner_id(&self) -> Option<Uuid> {
        Some(self.id)
    }
}
