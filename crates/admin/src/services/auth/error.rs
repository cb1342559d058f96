//! Admin authentication error types.

use thiserror::Error;

use freshmart_db::RepositoryError;

/// Errors that can occur during admin authentication operations.
#[derive(Debug, Error)]
pub enum AdminAuthError {
    /// Invalid email format.
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] freshmart_core::EmailError),

    /// Wrong email or password, not an admin, or deactivated.
    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("admin user not found")]
    UserNotFound,

    #[error("a user with this email already exists")]
    UserAlreadyExists,

    /// Password does not meet requirements.
    #[error("weak password: {0}")]
    WeakPassword(String),

    /// Password hashing failed.
    #[error("password hashing error")]
    PasswordHash,

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}
