//! Storage error type and backend fault mapping.
//!
//! The remote backend surfaces several separately-named fault conditions
//! (timeout, unavailable, invalid request, transport). Callers of the store
//! treat them uniformly, so they collapse into a single [`StoreError`] kind
//! tagged with an [`ErrorCode`]. The causing fault is preserved as the
//! error source where one exists.

use thiserror::Error;

use crate::backend::BackendError;
use crate::pool::PoolError;

/// Cause code carried by every [`StoreError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    /// The backend did not answer within its timeout.
    RemoteTimeout,
    /// Not enough live replicas to satisfy the consistency level.
    RemoteUnavailable,
    /// The backend rejected the request as malformed.
    RemoteInvalid,
    /// Transport-level failure between the adapter and the backend.
    RemoteTransport,
    /// An internal sleep was interrupted.
    Interrupt,
    /// The caller supplied invalid arguments.
    Argument,
    /// A pooled connection could not be borrowed.
    Pool,
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::RemoteTimeout => "remote-timeout",
            Self::RemoteUnavailable => "remote-unavailable",
            Self::RemoteInvalid => "remote-invalid",
            Self::RemoteTransport => "remote-transport",
            Self::Interrupt => "interrupt",
            Self::Argument => "argument",
            Self::Pool => "pool",
        };
        f.write_str(name)
    }
}

/// The single storage error kind raised by every store operation.
#[derive(Debug, Error)]
#[error("{code}: {message}")]
pub struct StoreError {
    code: ErrorCode,
    message: String,
    #[source]
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl StoreError {
    /// Build an error with an explicit code and message.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            source: None,
        }
    }

    /// Build an [`ErrorCode::Argument`] error.
    pub fn argument(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Argument, message)
    }

    /// Build an [`ErrorCode::RemoteInvalid`] error.
    pub fn remote_invalid(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::RemoteInvalid, message)
    }

    /// The cause code for this error.
    pub fn code(&self) -> ErrorCode {
        self.code
    }

    /// The human-readable message for this error.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// True when the failure originated on the backend side.
    pub fn is_remote(&self) -> bool {
        matches!(
            self.code,
            ErrorCode::RemoteTimeout
                | ErrorCode::RemoteUnavailable
                | ErrorCode::RemoteInvalid
                | ErrorCode::RemoteTransport
        )
    }
}

impl From<BackendError> for StoreError {
    fn from(err: BackendError) -> Self {
        let code = match &err {
            BackendError::Timeout => ErrorCode::RemoteTimeout,
            BackendError::Unavailable => ErrorCode::RemoteUnavailable,
            BackendError::InvalidRequest { .. } => ErrorCode::RemoteInvalid,
            BackendError::Transport { .. } => ErrorCode::RemoteTransport,
            // Not-found is handled at the point-read call site; one escaping
            // any other call is a protocol violation.
            BackendError::NotFound => ErrorCode::RemoteInvalid,
        };
        Self {
            code,
            message: err.to_string(),
            source: Some(Box::new(err)),
        }
    }
}

impl From<PoolError> for StoreError {
    fn from(err: PoolError) -> Self {
        Self {
            code: ErrorCode::Pool,
            message: err.to_string(),
            source: Some(Box::new(err)),
        }
    }
}

/// Result type using [`StoreError`].
pub type StoreResult<T> = Result<T, StoreError>;
