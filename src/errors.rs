//! Unified error type for the hostel allocation service.
//!
//! Authorization failures never surface here: the web gate turns them into a redirect before
//! any core function runs. Missing ids and exhausted capacity are ordinary outcomes, not errors.

use thiserror::Error;

/// All errors produced by core operations, configuration and startup.
#[derive(Debug, Error)]
pub enum Error {
    /// The relational store failed. This is the only fatal class during request handling.
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// Settings could not be read or parsed.
    #[error("Configuration error: {message}")]
    Config {
        /// What went wrong
        message: String,
    },

    /// Filesystem failure, e.g. while writing an uploaded blob.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Caller input was rejected before any state changed.
    #[error("Validation failed: {message}")]
    Validation {
        /// Human-readable reason shown to the caller
        message: String,
    },

    /// Registration used a username that already exists.
    #[error("Username '{username}' is already taken")]
    UsernameTaken {
        /// The rejected username
        username: String,
    },

    /// Unknown username or wrong password.
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// Correct credentials, but the account has not been approved yet.
    #[error("Account waiting for approval")]
    ApprovalPending,

    /// The password hasher rejected its input or a stored hash is malformed.
    #[error("Password hashing failed: {message}")]
    PasswordHash {
        /// Underlying hasher message
        message: String,
    },

    /// A multipart upload could not be read.
    #[error("Upload error: {message}")]
    Upload {
        /// Underlying reason
        message: String,
    },
}

impl Error {
    /// Shorthand for building a [`Error::Validation`].
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }
}

impl From<argon2::password_hash::Error> for Error {
    fn from(value: argon2::password_hash::Error) -> Self {
        Self::PasswordHash {
            message: value.to_string(),
        }
    }
}

/// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;
