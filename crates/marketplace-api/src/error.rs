//! API error types

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use marketplace_auth::AuthError;
use marketplace_db::DbError;
use thiserror::Error;
use tracing::error;

use crate::response::Envelope;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    /// `reason` is the machine-readable code placed in the envelope's `error`
    #[error("Unauthorized ({reason}): {message}")]
    Unauthorized {
        reason: &'static str,
        message: String,
    },

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Method not allowed")]
    MethodNotAllowed,

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn unauthorized(reason: &'static str, message: impl Into<String>) -> Self {
        ApiError::Unauthorized {
            reason,
            message: message.into(),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) | ApiError::Conflict(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized { .. } => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound(what) => ApiError::NotFound(format!("{} not found", what)),
            DbError::Duplicate(what) => ApiError::Conflict(what),
            DbError::InvalidInput(msg) => ApiError::BadRequest(msg),
            DbError::Forbidden(what) => {
                ApiError::Forbidden(format!("{} belongs to another seller", what))
            }
            DbError::Conflict(msg) => ApiError::Conflict(msg),
            DbError::Connection(e) => ApiError::Internal(e.to_string()),
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        if let Some(reason) = err.reason() {
            return ApiError::unauthorized(reason, err.to_string());
        }
        match err {
            AuthError::Storage(db) => db.into(),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let (message, detail) = match self {
            ApiError::BadRequest(msg) => ("Invalid request".to_string(), msg),
            ApiError::Conflict(msg) => ("Conflict".to_string(), msg),
            ApiError::Unauthorized { reason, message } => (message, reason.to_string()),
            ApiError::Forbidden(msg) => ("Forbidden".to_string(), msg),
            ApiError::NotFound(msg) => ("Not found".to_string(), msg),
            ApiError::MethodNotAllowed => (
                "Method not allowed".to_string(),
                "method not allowed".to_string(),
            ),
            ApiError::Internal(msg) => {
                error!("Internal error: {}", msg);
                (
                    "Internal server error".to_string(),
                    "internal error".to_string(),
                )
            }
        };

        let body = Json(Envelope::<()> {
            message,
            status_code: status.as_u16(),
            error: Some(detail),
            data: None,
        });

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_db_error_mapping() {
        let cases = [
            (DbError::NotFound("Order 3".to_string()), StatusCode::NOT_FOUND),
            (DbError::Duplicate("a@x.com".to_string()), StatusCode::BAD_REQUEST),
            (DbError::InvalidInput("Cart is empty".to_string()), StatusCode::BAD_REQUEST),
            (DbError::Forbidden("Order 3".to_string()), StatusCode::FORBIDDEN),
            (DbError::Conflict("Order 3".to_string()), StatusCode::BAD_REQUEST),
        ];
        for (err, status) in cases {
            assert_eq!(ApiError::from(err).status(), status);
        }
    }

    #[test]
    fn test_auth_error_mapping() {
        let err = ApiError::from(AuthError::RevokedToken);
        assert!(matches!(err, ApiError::Unauthorized { reason: "revoked", .. }));

        let err = ApiError::from(AuthError::PasswordHash("boom".to_string()));
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let err = ApiError::from(AuthError::Storage(DbError::NotFound("x".to_string())));
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_internal_detail_is_generic() {
        let response = ApiError::Internal("disk on fire".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
