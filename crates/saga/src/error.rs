//! Saga error types.

use domain::{DomainError, ResultCode};
use relation_store::StoreError;
use thiserror::Error;

/// Errors that can terminate a relationship operation.
#[derive(Debug, Error)]
pub enum SagaError {
    /// The request was rejected before any remote call.
    #[error("{0}")]
    Domain(#[from] DomainError),

    /// A peer call reported failure; the remaining calls were not issued.
    #[error("Remote call '{call}' failed with code {code}: {}", message.as_deref().unwrap_or("no message"))]
    RemoteFailure {
        call: &'static str,
        code: i32,
        message: Option<String>,
    },

    /// Relation store error.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// The affinity lane could not run the task to completion.
    #[error("Scheduler error: {0}")]
    Scheduler(String),

    /// A collaborator could not be reached.
    #[error("Collaborator unavailable: {0}")]
    Unavailable(String),
}

impl SagaError {
    /// Numeric result code reported to the caller.
    ///
    /// Remote failures carry the peer's code, which may lie outside
    /// [`ResultCode`].
    pub fn code(&self) -> i32 {
        match self {
            SagaError::Domain(err) => err.code().as_i32(),
            SagaError::RemoteFailure { code, .. } => *code,
            SagaError::Store(_) | SagaError::Scheduler(_) | SagaError::Unavailable(_) => {
                ResultCode::Fail.as_i32()
            }
        }
    }
}

/// Convenience type alias for saga results.
pub type Result<T> = std::result::Result<T, SagaError>;
