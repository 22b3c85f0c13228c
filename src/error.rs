//! Service failures and their HTTP rendering.

use axum::{Json, http::StatusCode, response::IntoResponse};
use serde::Serialize;
use thiserror::Error;
use validator::ValidationErrors;

use crate::{dao::storage::StorageError, state::match_state::InvalidTableId};

/// Failures of the relay services, independent of the transport.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// The match store failed.
    #[error(transparent)]
    Storage(#[from] StorageError),
    /// Saves and saved-game lookups need a store and none is installed.
    #[error("no match store configured")]
    NoMatchStore,
    /// The table id is malformed.
    #[error(transparent)]
    InvalidTable(#[from] InvalidTableId),
    /// The relay already follows as many tables as it is configured for.
    #[error("already following {0} tables")]
    TooManyTables(usize),
    /// Nothing recorded yet for the requested table or game.
    #[error("{0}")]
    NotFound(String),
    /// A store call outlived the configured save timeout.
    #[error("operation timed out")]
    Timeout,
}

/// Errors returned by HTTP handlers.
#[derive(Debug, Error)]
pub enum AppError {
    /// 400, the request is malformed.
    #[error("bad request: {0}")]
    BadRequest(String),
    /// 404.
    #[error("not found: {0}")]
    NotFound(String),
    /// 503, a collaborator or a limit is in the way.
    #[error("service unavailable: {0}")]
    ServiceUnavailable(String),
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        let message = err.to_string();
        match err {
            ServiceError::InvalidTable(_) => AppError::BadRequest(message),
            ServiceError::NotFound(_) => AppError::NotFound(message),
            ServiceError::Storage(_)
            | ServiceError::NoMatchStore
            | ServiceError::Timeout
            | ServiceError::TooManyTables(_) => AppError::ServiceUnavailable(message),
        }
    }
}

impl From<ValidationErrors> for AppError {
    fn from(err: ValidationErrors) -> Self {
        AppError::BadRequest(format!("validation failed: {err}"))
    }
}

#[derive(Serialize)]
struct ErrorBody {
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status();
        let body = Json(ErrorBody {
            message: self.to_string(),
        });
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn service_errors_map_to_http_statuses() {
        let cases = [
            (ServiceError::NotFound("x".into()), StatusCode::NOT_FOUND),
            (
                ServiceError::InvalidTable(InvalidTableId("a b".into())),
                StatusCode::BAD_REQUEST,
            ),
            (ServiceError::NoMatchStore, StatusCode::SERVICE_UNAVAILABLE),
            (ServiceError::Timeout, StatusCode::SERVICE_UNAVAILABLE),
        ];
        for (err, status) in cases {
            let response = AppError::from(err).into_response();
            assert_eq!(response.status(), status);
        }
    }

    #[test]
    fn messages_survive_the_conversion() {
        let err = AppError::from(ServiceError::NotFound("no saved game".into()));
        assert_eq!(err.to_string(), "not found: no saved game");

        let err: ServiceError = InvalidTableId("a b".into()).into();
        assert!(AppError::from(err).to_string().starts_with("bad request: invalid table id"));
    }
}
