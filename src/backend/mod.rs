//! Wide-column backend contract.
//!
//! The store talks to a row-oriented, wide-column backend through the
//! [`BackendClient`] trait. Everything in this module describes that
//! remote surface: the data types requests and responses are built from
//! ([`types`]), the fault conditions a call can raise ([`BackendError`]),
//! and the replica-agreement level attached to every call
//! ([`ConsistencyLevel`]).
//!
//! The real RPC stub is owned by the deployment; [`memory`] provides an
//! in-process implementation with the same semantics for tests and
//! embedded use.

use thiserror::Error;

pub mod client;
pub mod memory;
pub mod types;

pub use client::BackendClient;
pub use memory::MemoryBackend;
pub use types::{
    BackendColumn, BatchMutation, ColumnOrSuperColumn, ColumnParent, ColumnPath, Deletion,
    MutationBatch, SlicePredicate, SliceRange,
};

/// Replica agreement level for a backend call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsistencyLevel {
    /// One replica acknowledges.
    One,
    /// A majority of replicas acknowledge.
    Quorum,
    /// Every replica acknowledges.
    All,
}

/// Fault conditions a backend call can raise.
///
/// `NotFound` is only produced by point reads of a missing column; the
/// store maps it to an absent value rather than an error.
#[derive(Debug, Clone, Error)]
pub enum BackendError {
    /// The request did not complete within the backend's timeout.
    #[error("request timed out")]
    Timeout,

    /// Not enough live replicas for the requested consistency level.
    #[error("insufficient live replicas")]
    Unavailable,

    /// The backend rejected the request as malformed.
    #[error("invalid request: {reason}")]
    InvalidRequest { reason: String },

    /// Transport-level failure on the connection.
    #[error("transport failure: {message}")]
    Transport { message: String },

    /// The requested column does not exist.
    #[error("not found")]
    NotFound,
}

/// Result type using [`BackendError`].
pub type BackendResult<T> = Result<T, BackendError>;
