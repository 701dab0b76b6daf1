//! Identity persistence seam.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use idgov_core::error::DomainError;
use uuid::Uuid;

use super::identity::Identity;

/// Storage of identities.
#[async_trait]
pub trait IdentityRepository: Send + Sync {
    /// Inserts or replaces `identity`.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if another identity already uses the
    /// username, or `DomainError::Infrastructure` on storage failure.
    async fn save(&self, identity: &Identity) -> Result<(), DomainError>;

    /// Loads an identity.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Infrastructure` on storage failure.
    async fn find(&self, id: Uuid) -> Result<Option<Identity>, DomainError>;

    /// Removes an identity. Removing an unknown identity is not an error.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Infrastructure` on storage failure.
    async fn delete(&self, id: Uuid) -> Result<(), DomainError>;
}

/// Process-local identity storage.
#[derive(Debug, Default)]
pub struct InMemoryIdentityRepository {
    identities: Mutex<HashMap<Uuid, Identity>>,
}

impl InMemoryIdentityRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<Uuid, Identity>>, DomainError> {
        self.identities
            .lock()
            .map_err(|_| DomainError::Infrastructure("identity repository lock poisoned".into()))
    }
}

#[async_trait]
impl IdentityRepository for InMemoryIdentityRepository {
    async fn save(&self, identity: &Identity) -> Result<(), DomainError> {
        let mut identities = self.lock()?;
        let taken = identities
            .values()
            .any(|other| other.id != identity.id && other.username == identity.username);
        if taken {
            return Err(DomainError::Validation(format!(
                "username {} is already taken",
                identity.username
            )));
        }
        identities.insert(identity.id, identity.clone());
        Ok(())
    }

    async fn find(&self, id: Uuid) -> Result<Option<Identity>, DomainError> {
        Ok(self.lock()?.get(&id).cloned())
    }

    async fn delete(&self, id: Uuid) -> Result<(), DomainError> {
        self.lock()?.remove(&id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_save_find_delete() {
        let repo = InMemoryIdentityRepository::new();
        let identity = Identity::new("jdoe", "Doe");

        repo.save(&identity).await.unwrap();
        let found = repo.find(identity.id).await.unwrap();
        repo.delete(identity.id).await.unwrap();

        assert_eq!(found, Some(identity.clone()));
        assert_eq!(repo.find(identity.id).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_username_must_be_unique() {
        let repo = InMemoryIdentityRepository::new();
        repo.save(&Identity::new("jdoe", "Doe")).await.unwrap();

        let result = repo.save(&Identity::new("jdoe", "Dough")).await;

        assert!(matches!(result, Err(DomainError::Validation(_))));
    }
}
