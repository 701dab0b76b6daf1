//! Test domain shared by the engine's unit tests.

use idgov_core::event_type::{EventContent, EventType};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A role definition, the content of `ROLE` events.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Role {
    pub id: Uuid,
    pub code: String,
    pub trail: Vec<String>,
}

impl Role {
    pub fn new(code: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            code: code.to_owned(),
            trail: Vec::new(),
        }
    }
}

impl EventContent for Role {
    fn owner_id(&self) -> Option<Uuid> {
        Some(self.id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RoleEventType {
    Create,
    Update,
    Delete,
}

impl EventType for RoleEventType {
    const OWNER_TYPE: &'static str = "ROLE";
    type Content = Role;

    fn name(&self) -> &'static str {
        match self {
            Self::Create => "CREATE",
            Self::Update => "UPDATE",
            Self::Delete => "DELETE",
        }
    }

    fn all() -> &'static [Self] {
        &[Self::Create, Self::Update, Self::Delete]
    }
}
