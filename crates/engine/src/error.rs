//! The module contains the errors the engine can return.
//!
//! The errors are grouped by how the caller recovers from them:
//!
//! - [`Unscoped`] no account is active, the caller must pick one.
//! - [`InvalidInput`] and [`InsufficientStock`] the input must be corrected.
//! - [`KeyNotFound`] the id does not resolve under the active account.
//! - [`Database`] the store rejected the operation; any open transaction has
//!   already been rolled back.
//!
//!  [`Unscoped`]: EngineError::Unscoped
//!  [`InvalidInput`]: EngineError::InvalidInput
//!  [`InsufficientStock`]: EngineError::InsufficientStock
//!  [`KeyNotFound`]: EngineError::KeyNotFound
//!  [`Database`]: EngineError::Database
use sea_orm::DbErr;
use thiserror::Error;

/// Engine custom errors.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("No active account: {0}")]
    Unscoped(String),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Insufficient stock: {0}")]
    InsufficientStock(String),
    #[error("\"{0}\" key not found!")]
    KeyNotFound(String),
    #[error("Username \"{0}\" already exists")]
    DuplicateUsername(String),
    #[error("Authentication failed")]
    AuthenticationFailed,
    #[error("Invalid id: {0}")]
    InvalidId(String),
    #[error(transparent)]
    Database(#[from] DbErr),
}

impl EngineError {
    /// Returns `true` for errors that come from the store rather than from the
    /// caller's input or scope.
    pub fn is_storage(&self) -> bool {
        matches!(self, Self::Database(_) | Self::InvalidId(_))
    }
}

impl PartialEq for EngineError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Unscoped(a), Self::Unscoped(b)) => a == b,
            (Self::InvalidInput(a), Self::InvalidInput(b)) => a == b,
            (Self::InsufficientStock(a), Self::InsufficientStock(b)) => a == b,
            (Self::KeyNotFound(a), Self::KeyNotFound(b)) => a == b,
            (Self::DuplicateUsername(a), Self::DuplicateUsername(b)) => a == b,
            (Self::AuthenticationFailed, Self::AuthenticationFailed) => true,
            (Self::InvalidId(a), Self::InvalidId(b)) => a == b,
            (Self::Database(a), Self::Database(b)) => a.to_string() == b.to_string(),
            _ => false,
        }
    }
}
