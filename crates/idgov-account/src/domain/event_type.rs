//! ACCOUNT event types.

use idgov_core::event_type::EventType;

use super::account::Account;

/// Operations on accounts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AccountEventType {
    Create,
    Update,
    Delete,
    /// Pushes the current account state to the target system again.
    Provisioning,
}

impl EventType for AccountEventType {
    const OWNER_TYPE: &'static str = "ACCOUNT";
    type Content = Account;

    fn name(&self) -> &'static str {
        match self {
            Self::Create => "CREATE",
            Self::Update => "UPDATE",
            Self::Delete => "DELETE",
            Self::Provisioning => "PROVISIONING",
        }
    }

    fn all() -> &'static [Self] {
        &[Self::Create, Self::Update, Self::Delete, Self::Provisioning]
    }
}
