//! Unified error type for the application.
//!
//! Every fallible operation returns [`Result`]. The error taxonomy distinguishes
//! validation problems (caller's fault, specific message), authorization
//! failures, missing records, and upstream/internal failures. The axum
//! `IntoResponse` impl at the bottom is the single place where errors become
//! HTTP responses; upstream and internal errors are logged server-side and
//! answered with a generic message so no driver or stack detail leaks out.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;
use tracing::error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Malformed or missing input. The message is safe to show to the caller.
    #[error("{message}")]
    Validation { message: String },

    /// Uniform login failure: unknown username and wrong password are
    /// deliberately indistinguishable to prevent username enumeration.
    #[error("Invalid username or password")]
    InvalidCredentials,

    #[error("{message}")]
    Unauthorized { message: String },

    #[error("Access denied")]
    Forbidden,

    #[error("This feature is currently unavailable")]
    FeatureDisabled,

    #[error("Transaction not found")]
    TransactionNotFound,

    #[error("Unknown tool: {name}")]
    UnknownTool { name: String },

    #[error("Too many requests, please try again later")]
    RateLimited,

    /// The model kept requesting tool calls past the round-trip bound, or
    /// returned a response we could not interpret.
    #[error("Model error: {message}")]
    Model { message: String },

    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    #[error("Upstream request failed: {0}")]
    Upstream(#[from] reqwest::Error),

    #[error("Password hashing error: {0}")]
    Hash(#[from] bcrypt::BcryptError),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Shorthand for a validation error with a caller-facing message.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            Self::Validation { .. } | Self::UnknownTool { .. } => {
                (StatusCode::BAD_REQUEST, self.to_string())
            }
            Self::InvalidCredentials | Self::Unauthorized { .. } => {
                (StatusCode::UNAUTHORIZED, self.to_string())
            }
            Self::Forbidden | Self::FeatureDisabled => (StatusCode::FORBIDDEN, self.to_string()),
            Self::TransactionNotFound => (StatusCode::NOT_FOUND, self.to_string()),
            Self::RateLimited => (StatusCode::TOO_MANY_REQUESTS, self.to_string()),
            Self::Config { .. }
            | Self::Model { .. }
            | Self::Database(_)
            | Self::Upstream(_)
            | Self::Hash(_)
            | Self::Json(_)
            | Self::Io(_) => {
                error!("Internal error while handling request: {self}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        (
            status,
            Json(serde_json::json!({ "success": false, "message": message })),
        )
            .into_response()
    }
}

// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;
