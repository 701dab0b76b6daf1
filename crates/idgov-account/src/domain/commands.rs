//! Commands for the ACCOUNT context.

use idgov_core::properties::{EventProperties, keys};
use uuid::Uuid;

use super::account::Account;

/// Command to create an account.
#[derive(Debug, Clone)]
pub struct CreateAccount {
    /// Owning identity.
    pub identity_id: Option<Uuid>,
    /// Target system code.
    pub system_code: String,
    /// Login on the target system.
    pub uid: String,
    /// Bypass the approval workflow.
    pub skip_approval: bool,
}

impl CreateAccount {
    /// Builds the account the command asks for.
    #[must_use]
    pub fn to_account(&self) -> Account {
        let account = Account::new(self.system_code.clone(), self.uid.clone());
        match self.identity_id {
            Some(identity_id) => account.owned_by(identity_id),
            None => account,
        }
    }
}

/// Command to change an existing account.
#[derive(Debug, Clone)]
pub struct UpdateAccount {
    /// The account in its desired state.
    pub account: Account,
    /// Bypass the approval workflow.
    pub skip_approval: bool,
}

/// Command to remove an account from its target system.
#[derive(Debug, Clone)]
pub struct DeleteAccount {
    pub account: Account,
}

/// Command carrying an approver's decision on a suspended account event.
#[derive(Debug, Clone)]
pub struct DecideApproval {
    /// The suspended event.
    pub event_id: Uuid,
    /// `true` to approve, `false` to reject.
    pub approve: bool,
}

pub(crate) fn approval_properties(skip_approval: bool) -> EventProperties {
    if skip_approval {
        EventProperties::new().with(keys::SKIP_APPROVAL, true)
    } else {
        EventProperties::new()
    }
}
