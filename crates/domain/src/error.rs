//! Domain error types.

use thiserror::Error;

use crate::code::ResultCode;

/// Errors raised when a request violates a business rule.
///
/// Every variant carries the result code reported to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DomainError {
    /// Malformed, self-referential or out-of-range input.
    #[error("Invalid parameter: {0}")]
    Parameter(ResultCode),

    /// A precondition on the relation state does not hold.
    #[error("State conflict: {0}")]
    StateConflict(ResultCode),

    /// A referenced record or member does not exist.
    #[error("Not found: {0}")]
    NotFound(ResultCode),
}

/// Coarse classification of a [`DomainError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Parameter,
    StateConflict,
    NotFound,
}

impl DomainError {
    /// Returns the result code reported to the caller.
    pub fn code(&self) -> ResultCode {
        match self {
            DomainError::Parameter(code)
            | DomainError::StateConflict(code)
            | DomainError::NotFound(code) => *code,
        }
    }

    /// Returns the error kind.
    pub fn kind(&self) -> ErrorKind {
        match self {
            DomainError::Parameter(_) => ErrorKind::Parameter,
            DomainError::StateConflict(_) => ErrorKind::StateConflict,
            DomainError::NotFound(_) => ErrorKind::NotFound,
        }
    }
}
