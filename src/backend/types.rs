//! Data types for the row-oriented RPC surface.
//!
//! These mirror the backend's wire vocabulary: columns addressed by path
//! or parent, slice predicates selecting columns within one row, and the
//! mutation descriptors carried by a batched write. All byte fields are
//! [`Bytes`], which is immutable once constructed; handing one to a client
//! can never observe a later caller-side mutation, so the defensive-copy
//! obligation at this boundary is met by construction.

use bytes::Bytes;
use std::collections::BTreeMap;

// ============================================================================
// Columns
// ============================================================================

/// A named column value with its write timestamp.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendColumn {
    /// Column name, unique within its row.
    pub name: Bytes,

    /// Column value bytes.
    pub value: Bytes,

    /// Write timestamp in epoch milliseconds; the backend keeps the
    /// highest-timestamped write for a coordinate.
    pub timestamp: u64,
}

impl BackendColumn {
    /// Create a column descriptor.
    pub fn new(name: impl Into<Bytes>, value: impl Into<Bytes>, timestamp: u64) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            timestamp,
        }
    }
}

/// A column as returned by reads.
///
/// The backend's read vocabulary admits legacy super columns (a named
/// group of sub-columns). The store never writes them, so a super column
/// in a response is treated as a protocol violation by callers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnOrSuperColumn {
    /// A regular column.
    Column(BackendColumn),
    /// A legacy super column: group name plus its sub-columns.
    Super { name: Bytes, columns: Vec<BackendColumn> },
}

impl ColumnOrSuperColumn {
    /// The regular column, if this is one.
    pub fn column(&self) -> Option<&BackendColumn> {
        match self {
            Self::Column(column) => Some(column),
            Self::Super { .. } => None,
        }
    }

    /// Consume into the regular column, if this is one.
    pub fn into_column(self) -> Option<BackendColumn> {
        match self {
            Self::Column(column) => Some(column),
            Self::Super { .. } => None,
        }
    }
}

// ============================================================================
// Addressing
// ============================================================================

/// Path to one column within a column family.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnPath {
    /// Column family holding the row.
    pub column_family: String,

    /// The addressed column name.
    pub column: Bytes,
}

impl ColumnPath {
    /// Create a path to `column` inside `column_family`.
    pub fn new(column_family: impl Into<String>, column: impl Into<Bytes>) -> Self {
        Self {
            column_family: column_family.into(),
            column: column.into(),
        }
    }
}

/// Addresses all columns of a row within a column family.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnParent {
    /// Column family holding the row.
    pub column_family: String,
}

impl ColumnParent {
    /// Create a parent for `column_family`.
    pub fn new(column_family: impl Into<String>) -> Self {
        Self {
            column_family: column_family.into(),
        }
    }
}

// ============================================================================
// Slice selection
// ============================================================================

/// Contiguous column-name range, inclusive on both endpoints.
///
/// An empty `start` or `finish` means unbounded on that side. The backend
/// rejects ranges whose non-empty endpoints are equal or inverted; interval
/// emptiness and exclusive endpoints are the caller's problem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SliceRange {
    /// First column name admitted (inclusive); empty for unbounded.
    pub start: Bytes,

    /// Last column name admitted (inclusive); empty for unbounded.
    pub finish: Bytes,

    /// Maximum number of columns returned.
    pub count: i32,
}

impl SliceRange {
    /// Create a bounded range.
    pub fn new(start: impl Into<Bytes>, finish: impl Into<Bytes>, count: i32) -> Self {
        Self {
            start: start.into(),
            finish: finish.into(),
            count,
        }
    }

    /// Range over all columns of a row, up to `count`.
    pub fn unbounded(count: i32) -> Self {
        Self {
            start: Bytes::new(),
            finish: Bytes::new(),
            count,
        }
    }
}

/// Column selection for a slice read: explicit names or a range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlicePredicate {
    /// Exactly the named columns, in row order.
    ColumnNames(Vec<Bytes>),
    /// All columns within a [`SliceRange`].
    Range(SliceRange),
}

// ============================================================================
// Mutations
// ============================================================================

/// Deletes a set of named columns at a timestamp.
///
/// The deletion wins over any write to the same coordinate carrying a
/// timestamp less than or equal to the deletion's.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Deletion {
    /// Tombstone timestamp in epoch milliseconds.
    pub timestamp: u64,

    /// Names of the columns to delete. Only explicit names are accepted
    /// here; range predicates are rejected by the backend.
    pub predicate: SlicePredicate,
}

impl Deletion {
    /// Delete the given column names at `timestamp`.
    pub fn columns(names: Vec<Bytes>, timestamp: u64) -> Self {
        Self {
            timestamp,
            predicate: SlicePredicate::ColumnNames(names),
        }
    }
}

/// One mutation descriptor inside a batched write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchMutation {
    /// Insert or overwrite one column.
    SetColumn(BackendColumn),
    /// Delete a set of columns.
    Delete(Deletion),
}

/// The argument shape of a batched write: key → column family → mutations.
pub type MutationBatch = BTreeMap<Bytes, BTreeMap<String, Vec<BatchMutation>>>;
