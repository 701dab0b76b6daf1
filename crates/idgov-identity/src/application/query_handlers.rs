//! Query handlers for the IDENTITY context.

use idgov_core::error::DomainError;
use serde::Serialize;
use uuid::Uuid;

use crate::domain::identity::IdentityState;
use crate::domain::repository::IdentityRepository;

/// Read-only view of an identity.
#[derive(Debug, Serialize)]
pub struct IdentityView {
    pub identity_id: Uuid,
    pub username: String,
    /// First and last name joined for display.
    pub display_name: String,
    pub email: Option<String>,
    pub state: IdentityState,
}

/// Retrieves an identity by its id.
///
/// # Errors
///
/// Returns `DomainError::Validation` if no identity has that id.
pub async fn get_identity(
    identity_id: Uuid,
    repository: &dyn IdentityRepository,
) -> Result<IdentityView, DomainError> {
    let identity = repository
        .find(identity_id)
        .await?
        .ok_or_else(|| DomainError::Validation(format!("identity {identity_id} not found")))?;

    let display_name = match &identity.first_name {
        Some(first_name) => format!("{first_name} {}", identity.last_name),
        None => identity.last_name.clone(),
    };
    Ok(IdentityView {
        identity_id: identity.id,
        username: identity.username,
        display_name,
        email: identity.email,
        state: identity.state,
    })
}
