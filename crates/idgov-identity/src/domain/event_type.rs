//! IDENTITY event types.

use idgov_core::event_type::EventType;

use super::identity::Identity;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IdentityEventType {
    Create,
    Update,
    Delete,
    Disable,
}

impl EventType for IdentityEventType {
    const OWNER_TYPE: &'static str = "IDENTITY";
    type Content = Identity;

    fn name(&self) -> &'static str {
        match self {
            Self::Create => "CREATE",
            Self::Update => "UPDATE",
            Self::Delete => "DELETE",
            Self::Disable => "DISABLE",
        }
    }

    fn all() -> &'static [Self] {
        &[Self::Create, Self::Update, Self::Delete, Self::Disable]
    }
}
