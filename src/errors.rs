//! Unified error type for the ledger core.
//!
//! Three kinds are recoverable and always surfaced to the caller: [`Error::NotFound`],
//! [`Error::Validation`] and [`Error::Conflict`]. Store failures arrive as
//! [`Error::Database`] and are never retried here.

use thiserror::Error;

/// Every failure the ledger core can report.
#[derive(Debug, Error)]
pub enum Error {
    /// The id is unknown, or it belongs to another user.
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: i64 },

    /// Malformed input or a broken invariant. `reason` names the rule that failed.
    #[error("Validation failed: {reason}")]
    Validation { reason: String },

    /// Uniqueness violation, or a delete blocked by rows that still reference the target.
    #[error("Conflict: {message}")]
    Conflict { message: String },

    /// A settings or category catalogue file is missing a value or holds a bad one.
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// The store rejected a query or could not be reached.
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// An operating-system I/O failure outside the store.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Shorthand for a [`Error::Validation`] with the given reason.
    pub fn validation(reason: impl Into<String>) -> Self {
        Self::Validation {
            reason: reason.into(),
        }
    }

    /// Shorthand for a [`Error::Conflict`] with the given message.
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict {
            message: message.into(),
        }
    }

    /// HTTP-style status for the error kind, for whatever transport sits in front of the core.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::NotFound { .. } => 404,
            Self::Validation { .. } => 400,
            Self::Conflict { .. } => 409,
            Self::Config { .. } | Self::Database(_) | Self::Io(_) => 500,
        }
    }
}

/// Result alias used by every fallible operation in the crate.
pub type Result<T> = std::result::Result<T, Error>;
