//! Engine wiring and router assembly, shared by `main` and the tests.

use std::sync::Arc;

use axum::Router;
use idgov_account::application::processors::account_registry;
use idgov_account::domain::connector::ProvisioningConnector;
use idgov_account::domain::event_type::AccountEventType;
use idgov_core::clock::Clock;
use idgov_core::error::DomainError;
use idgov_core::store::EventStore;
use idgov_core::workflow::WorkflowService;
use idgov_engine::{CallbackRouter, EngineConfig, EventEngine};
use idgov_identity::application::processors::{IdentityCollaborators, identity_registry};
use idgov_identity::domain::event_type::IdentityEventType;
use idgov_identity::domain::repository::IdentityRepository;

use crate::routes;
use crate::state::AppState;

/// Everything the engines depend on.
pub struct Collaborators {
    pub store: Arc<dyn EventStore>,
    pub clock: Arc<dyn Clock>,
    pub workflow: Arc<dyn WorkflowService>,
    pub connector: Arc<dyn ProvisioningConnector>,
    pub repository: Arc<dyn IdentityRepository>,
}

/// The engines hosted by the worker.
pub struct Engines {
    pub accounts: Arc<EventEngine<AccountEventType>>,
    pub identities: Arc<EventEngine<IdentityEventType>>,
}

impl Engines {
    /// Builds both registries and their engines on the shared store.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if a registry rejects a processor.
    pub fn build(
        collaborators: Collaborators,
        config: &EngineConfig,
        target_systems: Vec<String>,
    ) -> Result<Self, DomainError> {
        let Collaborators {
            store,
            clock,
            workflow,
            connector,
            repository,
        } = collaborators;

        let accounts = Arc::new(EventEngine::new(
            account_registry(Arc::clone(&workflow), connector)?,
            Arc::clone(&store),
            Arc::clone(&clock),
            config.clone(),
        ));
        let identities = Arc::new(EventEngine::new(
            identity_registry(IdentityCollaborators {
                repository,
                workflow,
                accounts: accounts.clone(),
                clock: Arc::clone(&clock),
                target_systems,
            })?,
            store,
            clock,
            config.clone(),
        ));

        Ok(Self {
            accounts,
            identities,
        })
    }

    /// A callback router dispatching to both engines.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if two engines share an owner type.
    pub fn callback_router(
        &self,
        store: Arc<dyn EventStore>,
    ) -> Result<CallbackRouter, DomainError> {
        CallbackRouter::new(store)
            .with_resumer(self.accounts.clone())?
            .with_resumer(self.identities.clone())
    }
}

/// Assembles the HTTP routes. Layers are added by the caller.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(routes::health::router())
        .nest("/api/v1/workflow", routes::callbacks::router())
        .nest("/api/v1/events", routes::events::router())
        .with_state(state)
}
