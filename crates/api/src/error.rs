//! API error types with HTTP response mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use domain::{ErrorKind, ResultCode};
use saga::SagaError;

/// API-level error type that maps to HTTP responses.
#[derive(Debug)]
pub enum ApiError {
    /// The caller identity header is missing or malformed.
    InvalidCaller(String),
    /// The caller asked for another member's data.
    CallerMismatch(String),
    /// Saga execution error.
    Saga(SagaError),
}

impl ApiError {
    /// Result code carried in the response body.
    pub fn code(&self) -> i32 {
        match self {
            ApiError::InvalidCaller(_) | ApiError::CallerMismatch(_) => {
                ResultCode::ParameterError.as_i32()
            }
            ApiError::Saga(err) => err.code(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let code = self.code();
        let (status, message) = match self {
            ApiError::InvalidCaller(msg) | ApiError::CallerMismatch(msg) => {
                (StatusCode::BAD_REQUEST, msg)
            }
            ApiError::Saga(err) => saga_error_to_response(err),
        };

        let body = serde_json::json!({ "code": code, "error": message });
        (status, axum::Json(body)).into_response()
    }
}

fn saga_error_to_response(err: SagaError) -> (StatusCode, String) {
    match &err {
        SagaError::Domain(domain_err) => match domain_err.kind() {
            ErrorKind::Parameter => (StatusCode::BAD_REQUEST, err.to_string()),
            ErrorKind::StateConflict => (StatusCode::CONFLICT, err.to_string()),
            ErrorKind::NotFound => (StatusCode::NOT_FOUND, err.to_string()),
        },
        SagaError::RemoteFailure { .. } => (StatusCode::BAD_GATEWAY, err.to_string()),
        SagaError::Store(_) | SagaError::Scheduler(_) | SagaError::Unavailable(_) => {
            tracing::error!(error = %err, "internal server error");
            (StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
        }
    }
}

impl From<SagaError> for ApiError {
    fn from(err: SagaError) -> Self {
        ApiError::Saga(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::DomainError;

    fn status_of(err: SagaError) -> StatusCode {
        ApiError::from(err).into_response().status()
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            status_of(DomainError::Parameter(ResultCode::ParameterEmpty).into()),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(DomainError::StateConflict(ResultCode::FriendAlreadyAdded).into()),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status_of(DomainError::NotFound(ResultCode::ParameterErrorOne).into()),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_of(SagaError::RemoteFailure {
                call: "block_member",
                code: 9,
                message: None
            }),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            status_of(SagaError::Scheduler("lane closed".into())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_codes() {
        assert_eq!(ApiError::InvalidCaller("missing".into()).code(), 100);
        let err = ApiError::from(SagaError::from(DomainError::StateConflict(
            ResultCode::FriendAlreadyApply,
        )));
        assert_eq!(err.code(), 303);
    }
}
