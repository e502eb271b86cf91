//! Gate Error Types
//!
//! Domain-specific error variants that integrate with the unified
//! `kernel::error::AppError` system.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use kernel::error::{app_error::AppError, kind::ErrorKind};
use thiserror::Error;

/// Gate-specific result type alias
pub type GateResult<T> = Result<T, GateError>;

/// Gate-specific error variants
///
/// Business-rule violations map to 4xx statuses; store failures are logged
/// and surfaced as opaque 5xx responses.
#[derive(Debug, Error)]
pub enum GateError {
    /// No active site with available quota
    #[error("No eligible destination site available")]
    NoEligibleDestination,

    /// Task lookup failed or the fingerprint does not own it.
    /// Deliberately indistinguishable so other devices' tasks never leak.
    #[error("Task not found")]
    TaskNotFound,

    /// Code requested before the countdown was started
    #[error("Countdown has not been started for this task")]
    TaskNotStarted,

    /// Code submitted while the countdown is still running
    #[error("Countdown on the destination page is not finished")]
    NotReady,

    /// Code does not match any live task for this fingerprint
    #[error("Invalid verification code")]
    InvalidCode,

    /// Rate limit exceeded
    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    /// Malformed input, rejected before touching the store
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl GateError {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            GateError::NoEligibleDestination => StatusCode::SERVICE_UNAVAILABLE,
            GateError::TaskNotFound => StatusCode::NOT_FOUND,
            GateError::TaskNotStarted | GateError::NotReady | GateError::InvalidCode => {
                StatusCode::CONFLICT
            }
            GateError::RateLimitExceeded => StatusCode::TOO_MANY_REQUESTS,
            GateError::Validation(_) => StatusCode::BAD_REQUEST,
            GateError::Database(_) | GateError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the ErrorKind for this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            GateError::NoEligibleDestination => ErrorKind::ServiceUnavailable,
            GateError::TaskNotFound => ErrorKind::NotFound,
            GateError::TaskNotStarted | GateError::NotReady | GateError::InvalidCode => {
                ErrorKind::Conflict
            }
            GateError::RateLimitExceeded => ErrorKind::TooManyRequests,
            GateError::Validation(_) => ErrorKind::BadRequest,
            GateError::Database(_) | GateError::Internal(_) => ErrorKind::InternalServerError,
        }
    }

    /// Log the error with appropriate level
    fn log(&self) {
        match self {
            GateError::Database(e) => {
                tracing::error!(error = %e, "Gate database error");
            }
            GateError::Internal(msg) => {
                tracing::error!(message = %msg, "Gate internal error");
            }
            GateError::InvalidCode => {
                tracing::warn!("Invalid verification code attempt");
            }
            GateError::RateLimitExceeded => {
                tracing::warn!("Gate rate limit exceeded");
            }
            GateError::NoEligibleDestination => {
                tracing::warn!("No eligible destination site");
            }
            _ => {
                tracing::debug!(error = %self, "Gate error");
            }
        }
    }
}

impl From<GateError> for AppError {
    fn from(err: GateError) -> Self {
        let kind = err.kind();
        // Store failures keep their detail in the logs, not the response
        let message = match &err {
            GateError::Database(_) | GateError::Internal(_) => "Internal server error".to_string(),
            other => other.to_string(),
        };
        AppError::new(kind, message)
    }
}

impl IntoResponse for GateError {
    fn into_response(self) -> Response {
        self.log();
        // Database/internal details stay out of the body
        AppError::from(self).into_response()
    }
}
