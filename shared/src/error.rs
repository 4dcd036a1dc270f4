//! Error types for the salon booking Lambda functions.

use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while handling a booking request or job.
#[derive(Error, Debug)]
pub enum Error {
    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// AWS SDK error (SES, Secrets Manager)
    #[error("AWS error: {0}")]
    Aws(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Request validation error. The message is returned to the caller as-is.
    #[error("{0}")]
    Validation(String),

    /// Not found error. The message is returned to the caller as-is.
    #[error("{0}")]
    NotFound(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Get HTTP status code for this error.
    pub fn status_code(&self) -> u16 {
        match self {
            Error::Validation(_) => 400,
            Error::NotFound(_) => 404,
            _ => 500,
        }
    }

    /// Message safe to put in a response body.
    pub fn public_message(&self) -> String {
        match self {
            Error::Validation(msg) | Error::NotFound(msg) => msg.clone(),
            _ => "server error".to_string(),
        }
    }

    /// True when the database rejected a write on a unique constraint.
    pub fn is_unique_violation(&self) -> bool {
        match self {
            Error::Database(sqlx::Error::Database(db)) => db.is_unique_violation(),
            _ => false,
        }
    }
}
