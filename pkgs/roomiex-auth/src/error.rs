//! Error types for account operations

use sea_orm::DbErr;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, AuthError>;

/// Errors that can occur while signing up or signing in
#[derive(Error, Debug)]
pub enum AuthError {
    #[error("An account already exists for {0}")]
    AccountExists(String),
    #[error("Invalid email or password")]
    InvalidCredentials,
    #[error("Invalid email address: {0}")]
    InvalidEmail(String),
    #[error("Password must be at least {0} characters")]
    WeakPassword(usize),
    #[error("Password hashing failed: {0}")]
    Hashing(String),
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}
