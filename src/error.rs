//! Domain error types for the School Insights server.
//!
//! Uses thiserror for ergonomic error handling with automatic Display implementations.

use actix_web::{HttpResponse, ResponseError};
use std::fmt;

/// Application-level errors.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Database operation failed
    #[error("Database error: {0}")]
    Database(String),

    /// Resource not found
    #[error("{0} not found")]
    NotFound(String),

    /// Invalid input data
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Operation conflicts with an import in progress
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Uploaded file exceeds the configured limit
    #[error("Payload too large: {0}")]
    PayloadTooLarge(String),
}

impl ResponseError for AppError {
    fn error_response(&self) -> HttpResponse {
        let (status, error_code, response_message) = match self {
            AppError::Database(err_str) => {
                tracing::error!("Database error: {}", err_str);
                (
                    actix_web::http::StatusCode::INTERNAL_SERVER_ERROR,
                    "DATABASE_ERROR",
                    "An internal database error occurred".to_string(),
                )
            }
            AppError::NotFound(_) => (
                actix_web::http::StatusCode::NOT_FOUND,
                "NOT_FOUND",
                self.to_string(),
            ),
            AppError::InvalidInput(_) => (
                actix_web::http::StatusCode::BAD_REQUEST,
                "INVALID_INPUT",
                self.to_string(),
            ),
            AppError::Conflict(_) => (
                actix_web::http::StatusCode::CONFLICT,
                "CONFLICT",
                self.to_string(),
            ),
            AppError::PayloadTooLarge(_) => (
                actix_web::http::StatusCode::PAYLOAD_TOO_LARGE,
                "PAYLOAD_TOO_LARGE",
                self.to_string(),
            ),
        };

        HttpResponse::build(status).json(ErrorResponse {
            error: error_code.to_string(),
            message: response_message,
        })
    }
}

/// Error response body.
#[derive(Debug, serde::Serialize, serde::Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

impl fmt::Display for ErrorResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.error, self.message)
    }
}

/// Convenience type alias for Results with AppError.
pub type AppResult<T> = Result<T, AppError>;

/// Failure reported by the record store.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct PersistenceError {
    pub message: String,
}

impl PersistenceError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl From<sea_orm::DbErr> for PersistenceError {
    fn from(err: sea_orm::DbErr) -> Self {
        PersistenceError::new(err.to_string())
    }
}

/// Why a single uploaded file ended in the error state.
///
/// Every variant is terminal for the affected file. `Persistence` additionally
/// halts the rest of the batch it occurred in.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ImportError {
    /// Extension is neither `.csv` nor `.xlsx`, or the format is not processed yet.
    #[error("{0}")]
    Format(String),

    /// The tabular parse (or a strict numeric coercion) failed.
    #[error("Error processing the file: {0}")]
    Parse(String),

    /// Required columns are missing or the file kind is unsupported.
    #[error("{0}")]
    Validation(String),

    /// A performance file was submitted while no school is known.
    #[error(
        "No schools found in the database. Import school data before importing performance data."
    )]
    ReferenceGap,

    /// The record store rejected the insert.
    #[error("Failed to save to database: {0}")]
    Persistence(#[from] PersistenceError),
}

impl ImportError {
    /// Short machine-readable code, used in events and logs.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Format(_) => "FORMAT_ERROR",
            Self::Parse(_) => "PARSE_ERROR",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::ReferenceGap => "REFERENCE_GAP",
            Self::Persistence(_) => "PERSISTENCE_ERROR",
        }
    }
}

// Conversion implementations for common error types

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::InvalidInput(format!("JSON parsing error: {}", err))
    }
}

impl From<sea_orm::DbErr> for AppError {
    fn from(err: sea_orm::DbErr) -> Self {
        AppError::Database(err.to_string())
    }
}
