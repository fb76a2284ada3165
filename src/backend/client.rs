//! Client-side contract for the backend RPC surface.

use bytes::Bytes;

use super::types::{ColumnOrSuperColumn, ColumnParent, ColumnPath, MutationBatch, SlicePredicate};
use super::{BackendColumn, BackendResult, ConsistencyLevel};

/// The remote calls the store issues against one borrowed connection.
///
/// Implementations are handed out by the connection pool and used
/// exclusively by one operation at a time, hence `&mut self` throughout.
/// Every method may raise any [`BackendError`](super::BackendError)
/// variant except that `NotFound` is only produced by [`get`](Self::get).
pub trait BackendClient: Send {
    /// Read one column addressed by `path`.
    ///
    /// Raises `NotFound` when the row or column does not exist.
    fn get(
        &mut self,
        key: &Bytes,
        path: &ColumnPath,
        consistency: ConsistencyLevel,
    ) -> BackendResult<ColumnOrSuperColumn>;

    /// Read the columns of `key` selected by `predicate`, in ascending
    /// column-name order. A missing row yields an empty list.
    fn get_slice(
        &mut self,
        key: &Bytes,
        parent: &ColumnParent,
        predicate: &SlicePredicate,
        consistency: ConsistencyLevel,
    ) -> BackendResult<Vec<ColumnOrSuperColumn>>;

    /// Write one column under `key`.
    fn insert(
        &mut self,
        key: &Bytes,
        parent: &ColumnParent,
        column: BackendColumn,
        consistency: ConsistencyLevel,
    ) -> BackendResult<()>;

    /// Delete the column addressed by `path` with a tombstone at
    /// `timestamp`.
    fn remove(
        &mut self,
        key: &Bytes,
        path: &ColumnPath,
        timestamp: u64,
        consistency: ConsistencyLevel,
    ) -> BackendResult<()>;

    /// Apply a multi-key mutation batch in one call.
    fn batch_mutate(
        &mut self,
        batch: &MutationBatch,
        consistency: ConsistencyLevel,
    ) -> BackendResult<()>;
}
