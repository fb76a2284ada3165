//! Ordered key-column-value store surface.
//!
//! A store binds one (keyspace, column family) pair and exposes rows as
//! ordered maps from column name to value:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                        Graph database                           │
//! │           (adjacency lists and property columns)                │
//! └─────────────────────────────────────────────────────────────────┘
//!                                 │
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                     OrderedColumnStore                          │
//! │   slices │ point reads │ existence probes │ mutation batches    │
//! └─────────────────────────────────────────────────────────────────┘
//!                                 │
//! ┌─────────────────────────────────────────────────────────────────┐
//! │              ConnectionPool → BackendClient RPCs                │
//! │        get │ get_slice │ insert │ remove │ batch_mutate         │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Column names within a key are unique and ordered lexicographically on
//! their raw bytes; that ordering is the only one the store relies on.
//! Keys carry no cross-key ordering.

use bytes::Bytes;
use std::collections::BTreeMap;

use crate::core::error::StoreResult;

pub mod column_family;

pub use column_family::ColumnFamilyStore;

/// A (column, value) pair, the unit of read and write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    /// Column name, unique within its key.
    pub column: Bytes,

    /// Value bytes.
    pub value: Bytes,
}

impl Entry {
    /// Create an entry.
    pub fn new(column: impl Into<Bytes>, value: impl Into<Bytes>) -> Self {
        Self {
            column: column.into(),
            value: value.into(),
        }
    }
}

/// Additions and deletions for one key.
///
/// When the same column appears in both halves, the deletion is applied
/// first and the addition wins.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RowMutation {
    /// Entries to insert or overwrite.
    pub additions: Vec<Entry>,

    /// Column names to delete.
    pub deletions: Vec<Bytes>,
}

impl RowMutation {
    /// Create an empty mutation.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an entry to insert.
    pub fn add(mut self, column: impl Into<Bytes>, value: impl Into<Bytes>) -> Self {
        self.additions.push(Entry::new(column, value));
        self
    }

    /// Add a column to delete.
    pub fn delete(mut self, column: impl Into<Bytes>) -> Self {
        self.deletions.push(column.into());
        self
    }

    /// True when any entry is to be inserted.
    pub fn has_additions(&self) -> bool {
        !self.additions.is_empty()
    }

    /// True when any column is to be deleted.
    pub fn has_deletions(&self) -> bool {
        !self.deletions.is_empty()
    }
}

/// Opaque transactional context threaded through every operation.
///
/// The store never interprets the handle; it exists so callers can carry
/// transaction state through to backends that support it.
pub trait TransactionHandle: Send + Sync + std::fmt::Debug {}

/// Handle for callers without transactional context.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoTransaction;

impl TransactionHandle for NoTransaction {}

/// The ordered key-column-value operations a store exposes.
pub trait OrderedColumnStore {
    /// Read the entries of `key` whose columns lie in the interval
    /// described by `(col_start, col_end, start_inclusive, end_inclusive)`,
    /// up to `limit` entries, in ascending column order.
    ///
    /// A negative `limit` is coerced to 0 with a warning; `limit == 0`
    /// returns empty without a remote call. `col_start > col_end` is an
    /// argument error. Equal bounds degenerate to a point read when both
    /// flags are inclusive and to a provably empty interval (no remote
    /// call) otherwise.
    #[allow(clippy::too_many_arguments)]
    fn get_slice(
        &self,
        key: &Bytes,
        col_start: &Bytes,
        col_end: &Bytes,
        start_inclusive: bool,
        end_inclusive: bool,
        limit: i64,
        txh: &dyn TransactionHandle,
    ) -> StoreResult<Vec<Entry>>;

    /// [`get_slice`](Self::get_slice) without a limit.
    fn get_slice_all(
        &self,
        key: &Bytes,
        col_start: &Bytes,
        col_end: &Bytes,
        start_inclusive: bool,
        end_inclusive: bool,
        txh: &dyn TransactionHandle,
    ) -> StoreResult<Vec<Entry>> {
        self.get_slice(
            key,
            col_start,
            col_end,
            start_inclusive,
            end_inclusive,
            i64::MAX,
            txh,
        )
    }

    /// Read the value at `(key, column)`, or `None` when the column does
    /// not exist. Absence is not an error.
    fn get(
        &self,
        key: &Bytes,
        column: &Bytes,
        txh: &dyn TransactionHandle,
    ) -> StoreResult<Option<Bytes>>;

    /// True when at least one column exists under `key`.
    fn contains_key(&self, key: &Bytes, txh: &dyn TransactionHandle) -> StoreResult<bool>;

    /// True when `(key, column)` exists. Never raises for absence.
    fn contains_key_column(
        &self,
        key: &Bytes,
        column: &Bytes,
        txh: &dyn TransactionHandle,
    ) -> StoreResult<bool>;

    /// Apply `deletions` then `additions` to `key`. Either half may be
    /// empty; a column named in both halves ends up with the added value.
    fn mutate(
        &self,
        key: &Bytes,
        additions: &[Entry],
        deletions: &[Bytes],
        txh: &dyn TransactionHandle,
    ) -> StoreResult<()>;

    /// Apply a per-key mutation map in two batched remote calls: all
    /// deletions first under one timestamp, then all insertions under a
    /// later one.
    fn mutate_many(
        &self,
        mutations: &BTreeMap<Bytes, RowMutation>,
        txh: &dyn TransactionHandle,
    ) -> StoreResult<()>;

    /// Request a lock on `(key, column)` with an expected current value.
    ///
    /// Optimistic locking is not provided by this adapter: the call
    /// succeeds without contacting the backend, so callers that
    /// speculatively request locks still proceed.
    fn acquire_lock(
        &self,
        key: &Bytes,
        column: &Bytes,
        expected_value: &Bytes,
        txh: &dyn TransactionHandle,
    ) -> StoreResult<()>;

    /// Whether `key` is held by the local backend node.
    ///
    /// The adapter cannot inspect the backend's partitioning and
    /// conservatively reports every key as local.
    fn is_local_key(&self, key: &Bytes) -> bool;

    /// Release store resources. Connections belong to the pool, not the
    /// store, so this is a no-op.
    fn close(&self) -> StoreResult<()>;
}
