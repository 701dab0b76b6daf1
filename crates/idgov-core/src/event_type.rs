//! Event type, event state and content abstractions.

use std::fmt;
use std::hash::Hash;
use std::str::FromStr;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::DomainError;

/// Entity content carried by an event.
pub trait EventContent:
    Serialize + DeserializeOwned + Clone + fmt::Debug + Send + Sync + 'static
{
    /// Identifier of the owning entity, persisted as `owner_id`.
    fn owner_id(&self) -> Option<Uuid>;
}

/// Enumerable operation identifiers of one domain.
///
/// The associated `Content` binds the domain's entity type to its event
/// types, so an `Event<T>` can never carry content of another domain.
pub trait EventType: Copy + Eq + Hash + fmt::Debug + Send + Sync + 'static {
    /// Domain name, persisted as `owner_type` (e.g. `"IDENTITY"`).
    const OWNER_TYPE: &'static str;

    /// The entity content bound to this domain.
    type Content: EventContent;

    /// Operation name without the domain prefix (e.g. `"CREATE"`).
    fn name(&self) -> &'static str;

    /// All enumerants of this domain.
    fn all() -> &'static [Self];

    /// Looks an enumerant up by its operation name.
    fn parse(name: &str) -> Option<Self> {
        Self::all().iter().copied().find(|t| t.name() == name)
    }

    /// Fully qualified name, e.g. `"IDENTITY.CREATE"`.
    fn qualified_name(&self) -> String {
        format!("{}.{}", Self::OWNER_TYPE, self.name())
    }
}

/// Lifecycle state of an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventState {
    /// Constructed, not yet handed to the engine.
    Created,
    /// The chain is executing.
    Running,
    /// Waiting for an external decision.
    Suspended,
    /// All processors completed.
    Executed,
    /// A processor failed.
    Exception,
    /// Canceled administratively or by the recovery sweep.
    Canceled,
}

impl EventState {
    /// Returns `true` for states an event never leaves.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Executed | Self::Exception | Self::Canceled)
    }

    /// Returns `true` if the state machine allows `self -> next`.
    #[must_use]
    pub fn can_transition_to(self, next: Self) -> bool {
        match self {
            Self::Created => next == Self::Running,
            Self::Running => matches!(
                next,
                Self::Suspended | Self::Executed | Self::Exception | Self::Canceled
            ),
            Self::Suspended => matches!(next, Self::Running | Self::Canceled),
            Self::Executed | Self::Exception | Self::Canceled => false,
        }
    }

    /// Persistence representation.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Created => "CREATED",
            Self::Running => "RUNNING",
            Self::Suspended => "SUSPENDED",
            Self::Executed => "EXECUTED",
            Self::Exception => "EXCEPTION",
            Self::Canceled => "CANCELED",
        }
    }
}

impl fmt::Display for EventState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventState {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "CREATED" => Ok(Self::Created),
            "RUNNING" => Ok(Self::Running),
            "SUSPENDED" => Ok(Self::Suspended),
            "EXECUTED" => Ok(Self::Executed),
            "EXCEPTION" => Ok(Self::Exception),
            "CANCELED" => Ok(Self::Canceled),
            other => Err(DomainError::Infrastructure(format!(
                "unknown event state: {other}"
            ))),
        }
    }
}
