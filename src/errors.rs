use crate::datasets::EntitlementDenied;
use crate::models::ApiEnvelope;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use std::fmt;

/// Errors returned by the dashboard API handlers.
#[derive(Debug, Clone)]
pub enum AppError {
    /// Malformed input, including an unknown plan header.
    BadRequest(String),
    /// The caller's plan does not include the feature.
    Forbidden(String),
    /// Resource not found.
    NotFound(String),
    /// Internal server error.
    InternalError(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            AppError::Forbidden(msg) => write!(f, "Forbidden: {}", msg),
            AppError::NotFound(msg) => write!(f, "Not found: {}", msg),
            AppError::InternalError(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for AppError {}

impl IntoResponse for AppError {
    /// Maps each variant to a status code and a `{success: false, error}` body.
    fn into_response(self) -> Response {
        let (status, error_message) = match &self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::Forbidden(msg) => {
                tracing::debug!("Entitlement check failed: {}", msg);
                (StatusCode::FORBIDDEN, msg.clone())
            }
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            AppError::InternalError(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        (status, Json(ApiEnvelope::failure(error_message))).into_response()
    }
}

impl From<EntitlementDenied> for AppError {
    fn from(err: EntitlementDenied) -> Self {
        AppError::Forbidden(err.to_string())
    }
}

/// Why a dataset fetch failed. Every variant surfaces as a widget error
/// state with a retry affordance; none is fatal to the dashboard.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchError {
    /// Network, DNS or timeout failure before a response arrived.
    #[error("transport error: {0}")]
    Transport(String),
    /// Non-2xx status or a body that is not a valid envelope.
    #[error("protocol error{}: {message}", .status.map(|s| format!(" ({})", s)).unwrap_or_default())]
    Protocol {
        status: Option<u16>,
        message: String,
    },
    /// A 2xx envelope with `success: false`.
    #[error("application error: {0}")]
    Application(String),
}

impl FetchError {
    /// Transport failures and server-side (5xx) failures are worth another
    /// attempt; client errors and application errors are not.
    pub fn is_retryable(&self) -> bool {
        match self {
            FetchError::Transport(_) => true,
            FetchError::Protocol {
                status: Some(status),
                ..
            } => *status >= 500,
            FetchError::Protocol { status: None, .. } => false,
            FetchError::Application(_) => false,
        }
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            FetchError::Protocol {
                status: err.status().map(|s| s.as_u16()),
                message: format!("malformed envelope: {}", err),
            }
        } else {
            FetchError::Transport(err.to_string())
        }
    }
}

/// Plan storage failures. The plan store degrades to memory on any of these.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("storage JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("storage unavailable: {0}")]
    Unavailable(String),
}
