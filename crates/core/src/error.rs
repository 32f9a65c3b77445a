// Central Error Type for the Application

use thiserror::Error;

/// Application-level error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Host query error: {0}")]
    Query(#[from] crate::port::QueryError),
}

/// Result type alias using AppError
pub type Result<T> = std::result::Result<T, AppError>;
