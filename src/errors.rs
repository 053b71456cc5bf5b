//! Unified error types and result handling.
//!
//! Every catalog operation returns [`Result`]. Store failures are classified
//! when they are converted from [`DbErr`] so that constraint violations reach
//! the caller as [`Error::Conflict`] or [`Error::NotFound`] instead of a bare
//! database error. The HTTP boundary turns each variant into a status code.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use sea_orm::{DbErr, SqlErr};
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// Application error type shared by the core, config and API layers
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration could not be loaded or parsed
    #[error("Configuration error: {message}")]
    Config {
        /// What went wrong
        message: String,
    },

    /// Malformed or missing required input
    #[error("{message}")]
    BadRequest {
        /// Human-readable description of the invalid input
        message: String,
    },

    /// Product with the given ID does not exist
    #[error("Product not found: {id}")]
    ProductNotFound {
        /// Requested product ID
        id: i64,
    },

    /// A name search matched nothing
    #[error("No products found matching '{pattern}'")]
    NoProductsMatch {
        /// The search pattern
        pattern: String,
    },

    /// Any other referenced entity is absent
    #[error("{message}")]
    NotFound {
        /// Which entity was missing
        message: String,
    },

    /// A uniqueness constraint would be violated
    #[error("Conflict: {message}")]
    Conflict {
        /// Store-provided detail
        message: String,
    },

    /// Unexpected store failure
    #[error("Database error: {0}")]
    Database(DbErr),

    /// I/O failure (reading config files, binding sockets)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Missing or malformed environment variable
    #[error("Environment variable error: {0}")]
    EnvVar(#[from] std::env::VarError),
}

impl Error {
    /// Shorthand for [`Error::BadRequest`]
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest {
            message: message.into(),
        }
    }

    /// Shorthand for [`Error::NotFound`]
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    /// HTTP status this error maps to
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::BadRequest { .. } => StatusCode::BAD_REQUEST,
            Self::ProductNotFound { .. } | Self::NoProductsMatch { .. } | Self::NotFound { .. } => {
                StatusCode::NOT_FOUND
            }
            Self::Conflict { .. } => StatusCode::CONFLICT,
            Self::Config { .. } | Self::Database(_) | Self::Io(_) | Self::EnvVar(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl From<DbErr> for Error {
    fn from(err: DbErr) -> Self {
        match err.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(message)) => Self::Conflict { message },
            Some(SqlErr::ForeignKeyConstraintViolation(message)) => Self::NotFound {
                message: format!("Referenced entity does not exist: {message}"),
            },
            _ => Self::Database(err),
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = if status.is_server_error() {
            error!(error = %self, "Request failed");
            json!({ "error": self.to_string() })
        } else {
            json!({ "message": self.to_string() })
        };

        (status, Json(body)).into_response()
    }
}

/// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;
