/// Domain error type shared by the resource managers
///
/// Managers return [`BoardError`]; the HTTP layer maps each variant to a status
/// code. Database, hashing and token failures are wrapped transparently so `?`
/// works across layers.

use crate::auth::jwt::JwtError;
use crate::auth::password::PasswordError;

/// Failure raised by a resource manager
#[derive(Debug, thiserror::Error)]
pub enum BoardError {
    /// Referenced entity does not exist
    #[error("{0} not found")]
    NotFound(&'static str),

    /// Caller is authenticated but not allowed to do this
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Missing, invalid or expired credentials
    #[error("Authentication required")]
    Unauthenticated,

    /// Login failed; deliberately says nothing about which part was wrong
    #[error("Invalid email or password")]
    InvalidCredentials,

    /// Uniqueness violation
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Input rejected by the domain layer
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Required seed data is missing
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error(transparent)]
    Database(#[from] sqlx::Error),

    #[error(transparent)]
    Password(#[from] PasswordError),

    #[error(transparent)]
    Token(#[from] JwtError),
}

impl BoardError {
    pub fn forbidden(message: impl Into<String>) -> Self {
        BoardError::Forbidden(message.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        BoardError::Conflict(message.into())
    }
}

/// Result alias used by the managers
pub type BoardResult<T> = Result<T, BoardError>;

/// True for a PostgreSQL unique constraint violation
pub fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.is_unique_violation())
}

/// True for a PostgreSQL foreign key violation
pub fn is_foreign_key_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.is_foreign_key_violation())
}
