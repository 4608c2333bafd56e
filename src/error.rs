//! # Errors
//!
//! Every failure leaving the storage core is one of the [`RegistryError`]
//! kinds. Driver errors are classified in one place ([`From<DbErr>`]) so that
//! callers never see raw database errors.

use registry_names::errors::NameError;
use sea_orm::{DbErr, SqlErr};
use thiserror::Error;

/// Status kind of a [`RegistryError`], for mapping onto a transport's status codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Code {
    InvalidArgument,
    NotFound,
    AlreadyExists,
    FailedPrecondition,
    Internal,
    Unavailable,
}

/// Errors returned by registry operations
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("already exists: {0}")]
    AlreadyExists(String),

    #[error("failed precondition: {0}")]
    FailedPrecondition(String),

    #[error("internal error: {0}")]
    Internal(String),

    #[error("unavailable: {0}")]
    Unavailable(String),
}

pub type Result<T, E = RegistryError> = std::result::Result<T, E>;

impl RegistryError {
    pub fn code(&self) -> Code {
        match self {
            RegistryError::InvalidArgument(_) => Code::InvalidArgument,
            RegistryError::NotFound(_) => Code::NotFound,
            RegistryError::AlreadyExists(_) => Code::AlreadyExists,
            RegistryError::FailedPrecondition(_) => Code::FailedPrecondition,
            RegistryError::Internal(_) => Code::Internal,
            RegistryError::Unavailable(_) => Code::Unavailable,
        }
    }

    pub fn invalid_argument(message: impl Into<String>) -> Self {
        RegistryError::InvalidArgument(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        RegistryError::NotFound(message.into())
    }

    pub fn already_exists(message: impl Into<String>) -> Self {
        RegistryError::AlreadyExists(message.into())
    }

    pub fn failed_precondition(message: impl Into<String>) -> Self {
        RegistryError::FailedPrecondition(message.into())
    }

    pub fn internal(message: impl Into<String>) -> Self {
        RegistryError::Internal(message.into())
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, RegistryError::NotFound(_))
    }

    pub fn is_already_exists(&self) -> bool {
        matches!(self, RegistryError::AlreadyExists(_))
    }
}

impl From<NameError> for RegistryError {
    fn from(err: NameError) -> Self {
        RegistryError::InvalidArgument(err.to_string())
    }
}

impl From<DbErr> for RegistryError {
    fn from(err: DbErr) -> Self {
        match err.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(detail)) => {
                return RegistryError::AlreadyExists(detail);
            }
            Some(SqlErr::ForeignKeyConstraintViolation(detail)) => {
                return RegistryError::NotFound(detail);
            }
            _ => {}
        }
        match err {
            DbErr::RecordNotFound(detail) => RegistryError::NotFound(detail),
            DbErr::ConnectionAcquire(acquire) => RegistryError::Unavailable(acquire.to_string()),
            DbErr::Conn(runtime) => RegistryError::Unavailable(runtime.to_string()),
            other => RegistryError::Internal(other.to_string()),
        }
    }
}

impl From<serde_json::Error> for RegistryError {
    fn from(err: serde_json::Error) -> Self {
        RegistryError::Internal(format!("serialization failed: {err}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_errors_are_invalid_argument() {
        let err: RegistryError = NameError::Unrecognized("bogus".to_string()).into();
        assert_eq!(err.code(), Code::InvalidArgument);
    }

    #[test]
    fn test_db_errors_are_classified() {
        let missing: RegistryError = DbErr::RecordNotFound("projects/p".to_string()).into();
        assert_eq!(missing.code(), Code::NotFound);

        let other: RegistryError = DbErr::Custom("boom".to_string()).into();
        assert_eq!(other.code(), Code::Internal);
    }
}
