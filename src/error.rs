//! Typed errors and HTTP mapping.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("missing required setting {0}")]
    Missing(&'static str),
    #[error("invalid setting {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}

/// Coarse classification of a failure, used for logging and status mapping.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    /// Backend unreachable or misconfigured.
    Connectivity,
    /// Foreign-key, uniqueness or check violation on write.
    Constraint,
    /// Malformed statement, parameter mismatch, or any other store failure.
    Query,
    /// Wrong shared secret.
    AuthMismatch,
    NotFound,
    BadRequest,
    Config,
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// Store failure surfaced by a handler; `message` is what the client sees.
    #[error("{message}")]
    Store {
        message: String,
        #[source]
        source: sqlx::Error,
    },
    #[error("store unavailable: {0}")]
    Connectivity(#[source] sqlx::Error),
    #[error("invalid password")]
    Unauthorized,
    #[error("not found: {0}")]
    NotFound(String),
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

impl AppError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AppError::Config(_) => ErrorKind::Config,
            AppError::Store { source, .. } => classify(source),
            AppError::Connectivity(_) | AppError::Io(_) => ErrorKind::Connectivity,
            AppError::Unauthorized => ErrorKind::AuthMismatch,
            AppError::NotFound(_) => ErrorKind::NotFound,
            AppError::BadRequest(_) => ErrorKind::BadRequest,
        }
    }
}

/// Map a raw store error onto the error taxonomy.
pub fn classify(err: &sqlx::Error) -> ErrorKind {
    match err {
        sqlx::Error::Database(db) => match db.kind() {
            sqlx::error::ErrorKind::UniqueViolation
            | sqlx::error::ErrorKind::ForeignKeyViolation
            | sqlx::error::ErrorKind::NotNullViolation
            | sqlx::error::ErrorKind::CheckViolation => ErrorKind::Constraint,
            _ => ErrorKind::Query,
        },
        sqlx::Error::Io(_)
        | sqlx::Error::Tls(_)
        | sqlx::Error::PoolTimedOut
        | sqlx::Error::PoolClosed
        | sqlx::Error::Configuration(_) => ErrorKind::Connectivity,
        _ => ErrorKind::Query,
    }
}

/// Attach a client-facing message to a raw store result.
pub trait StoreResultExt<T> {
    fn context(self, message: &str) -> Result<T, AppError>;
}

impl<T> StoreResultExt<T> for Result<T, sqlx::Error> {
    fn context(self, message: &str) -> Result<T, AppError> {
        self.map_err(|source| AppError::Store {
            message: message.to_string(),
            source,
        })
    }
}

#[derive(Serialize)]
pub struct ErrorBody {
    pub error: String,
}

#[derive(Serialize)]
struct AuthFailureBody {
    success: bool,
    error: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let kind = self.kind();
        match &self {
            AppError::Store { message, source } => {
                tracing::error!(kind = ?kind, error = %source, "{}", message);
            }
            AppError::Unauthorized | AppError::NotFound(_) | AppError::BadRequest(_) => {
                tracing::debug!(kind = ?kind, error = %self, "request rejected");
            }
            _ => tracing::error!(kind = ?kind, error = %self, "request failed"),
        }

        match self {
            AppError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                Json(AuthFailureBody {
                    success: false,
                    error: "Invalid password".into(),
                }),
            )
                .into_response(),
            AppError::NotFound(what) => (
                StatusCode::NOT_FOUND,
                Json(ErrorBody {
                    error: format!("{} not found", what),
                }),
            )
                .into_response(),
            AppError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, Json(ErrorBody { error: msg })).into_response()
            }
            AppError::Store { message, .. } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorBody { error: message }),
            )
                .into_response(),
            _ => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorBody {
                    error: "Internal server error".into(),
                }),
            )
                .into_response(),
        }
    }
}
