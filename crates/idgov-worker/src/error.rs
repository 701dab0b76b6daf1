//! Worker error types.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use idgov_core::error::DomainError;
use idgov_engine::ConfigError;
use serde::Serialize;
use thiserror::Error;

/// Startup and runtime errors of the worker process.
#[derive(Debug, Error)]
pub enum AppError {
    /// A required environment variable is missing or invalid.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Database connection or pool error.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Schema migration failed.
    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// Wiring the engines or the startup sweep failed.
    #[error("startup error: {0}")]
    Domain(#[from] DomainError),

    /// Network binding or I/O error.
    #[error("server error: {0}")]
    Server(#[from] std::io::Error),
}

/// JSON body returned for error responses.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    /// Machine-readable error code.
    pub error: &'static str,
    /// Human-readable error message.
    pub message: String,
}

/// HTTP-layer wrapper around `DomainError` that implements `IntoResponse`.
#[derive(Debug)]
pub struct ApiError(pub DomainError);

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        Self(err)
    }
}

fn classify(err: &DomainError) -> (StatusCode, &'static str) {
    match err {
        DomainError::EventNotFound(_) => (StatusCode::NOT_FOUND, "event_not_found"),
        DomainError::ConcurrencyConflict { .. } => (StatusCode::CONFLICT, "concurrency_conflict"),
        DomainError::InvalidTransition { .. } => (StatusCode::CONFLICT, "invalid_transition"),
        DomainError::TypeMismatch { .. } => (StatusCode::BAD_REQUEST, "type_mismatch"),
        DomainError::Validation(_) => (StatusCode::BAD_REQUEST, "validation_error"),
        DomainError::Rejected(_) => (StatusCode::UNPROCESSABLE_ENTITY, "rejected"),
        DomainError::ProcessorFailed { source, .. } => match classify(source) {
            (StatusCode::INTERNAL_SERVER_ERROR, code) => (StatusCode::INTERNAL_SERVER_ERROR, code),
            _ => (StatusCode::UNPROCESSABLE_ENTITY, "processor_failed"),
        },
        DomainError::Infrastructure(_) => {
            (StatusCode::INTERNAL_SERVER_ERROR, "infrastructure_error")
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code) = classify(&self.0);

        let body = ErrorBody {
            error: error_code,
            message: self.0.to_string(),
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use idgov_core::event_type::EventState;
    use uuid::Uuid;

    fn status_of(err: DomainError) -> StatusCode {
        let response = ApiError(err).into_response();
        response.status()
    }

    #[test]
    fn test_event_not_found_maps_to_404() {
        let id = Uuid::new_v4();
        assert_eq!(
            status_of(DomainError::EventNotFound(id)),
            StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn test_concurrency_conflict_maps_to_409() {
        assert_eq!(
            status_of(DomainError::ConcurrencyConflict {
                event_id: Uuid::new_v4(),
                expected: 1,
                actual: 2,
            }),
            StatusCode::CONFLICT
        );
    }

    #[test]
    fn test_invalid_transition_maps_to_409() {
        assert_eq!(
            status_of(DomainError::InvalidTransition {
                event_id: Uuid::new_v4(),
                from: EventState::Executed,
                to: EventState::Running,
            }),
            StatusCode::CONFLICT
        );
    }

    #[test]
    fn test_validation_maps_to_400() {
        assert_eq!(
            status_of(DomainError::Validation("bad input".into())),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn test_processor_failure_maps_to_422_unless_infrastructure() {
        let event_id = Uuid::new_v4();
        let rejected = DomainError::Rejected("no".into()).in_processor("approval", event_id);
        let broken =
            DomainError::Infrastructure("ldap down".into()).in_processor("provision", event_id);

        assert_eq!(status_of(rejected), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(status_of(broken), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_infrastructure_maps_to_500() {
        assert_eq!(
            status_of(DomainError::Infrastructure("db down".into())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
