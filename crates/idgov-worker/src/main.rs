//! idgov worker entry point.

use std::sync::Arc;

use idgov_account::domain::connector::LoggingConnector;
use idgov_core::clock::{Clock, SystemClock};
use idgov_core::store::EventStore;
use idgov_engine::{CallbackListener, RecoverySweep};
use idgov_event_store::PgEventStore;
use idgov_identity::domain::repository::InMemoryIdentityRepository;
use idgov_worker::app::{Collaborators, Engines, build_router};
use idgov_worker::config::WorkerConfig;
use idgov_worker::error::AppError;
use idgov_worker::state::AppState;
use idgov_worker::workflow::CallbackWorkflowService;
use sqlx::postgres::PgPoolOptions;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), AppError> {
    // Initialize tracing subscriber.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .json()
        .init();

    let config = WorkerConfig::from_env()?;
    tracing::info!(instance_id = %config.engine.instance_id, "starting idgov worker");

    let pool = PgPoolOptions::new()
        .max_connections(config.database_max_connections)
        .connect(&config.database_url)
        .await?;
    sqlx::migrate!("../../migrations").run(&pool).await?;

    let store: Arc<dyn EventStore> = Arc::new(PgEventStore::new(pool));
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    // Chains this instance left RUNNING cannot be continued.
    let report = RecoverySweep::for_config(Arc::clone(&store), Arc::clone(&clock), &config.engine)
        .run()
        .await?;
    tracing::info!(
        canceled = report.canceled.len(),
        conflicts = report.conflicts,
        "recovery sweep finished"
    );

    let engines = Engines::build(
        Collaborators {
            store: Arc::clone(&store),
            clock,
            workflow: Arc::new(CallbackWorkflowService),
            connector: Arc::new(LoggingConnector),
            repository: Arc::new(InMemoryIdentityRepository::new()),
        },
        &config.engine,
        config.target_systems.clone(),
    )?;

    let (callbacks, listener) = CallbackListener::channel(config.callback_buffer);
    let callback_router = Arc::new(engines.callback_router(Arc::clone(&store))?);
    tokio::spawn(listener.run(callback_router));

    // TODO: Replace CorsLayer::permissive() with the workflow engine's origin.
    let app = build_router(AppState::new(store, callbacks))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr = config.socket_addr()?;
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app).await?;

    Ok(())
}
