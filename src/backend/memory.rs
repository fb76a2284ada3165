//! In-memory backend.
//!
//! [`MemoryBackend`] implements [`BackendClient`] against process-local
//! tables with the same observable semantics as the remote backend:
//! rows ordered by column name, writes resolved by timestamp (ties by
//! lexical value comparison, tombstones winning equal-timestamp races),
//! and the slice primitive's endpoint restrictions enforced. Clones share
//! the same tables, so a pool can hand out any number of "connections" to
//! one dataset.
//!
//! Tests drive error paths through [`fail_after`](MemoryBackend::fail_after)
//! and observe call traffic through [`CallCounts`].

use bytes::Bytes;
use parking_lot::{Mutex, RwLock};
use std::collections::BTreeMap;
use std::ops::Bound;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use super::client::BackendClient;
use super::types::{
    BackendColumn, BatchMutation, ColumnOrSuperColumn, ColumnParent, ColumnPath, MutationBatch,
    SlicePredicate, SliceRange,
};
use super::{BackendError, BackendResult, ConsistencyLevel};

/// One stored column value.
#[derive(Debug, Clone)]
struct Cell {
    value: Bytes,
    timestamp: u64,
}

/// Columns of one row, ordered by name.
type Row = BTreeMap<Bytes, Cell>;

/// Rows of one column family.
type Rows = BTreeMap<Bytes, Row>;

/// Per-call counters, shared across clones.
#[derive(Debug, Default)]
pub struct CallCounts {
    gets: AtomicU64,
    slices: AtomicU64,
    inserts: AtomicU64,
    removes: AtomicU64,
    batch_mutates: AtomicU64,
}

impl CallCounts {
    /// Point reads issued.
    pub fn gets(&self) -> u64 {
        self.gets.load(Ordering::Relaxed)
    }

    /// Slice reads issued.
    pub fn slices(&self) -> u64 {
        self.slices.load(Ordering::Relaxed)
    }

    /// Single-column inserts issued.
    pub fn inserts(&self) -> u64 {
        self.inserts.load(Ordering::Relaxed)
    }

    /// Single-column removals issued.
    pub fn removes(&self) -> u64 {
        self.removes.load(Ordering::Relaxed)
    }

    /// Batched mutations issued.
    pub fn batch_mutates(&self) -> u64 {
        self.batch_mutates.load(Ordering::Relaxed)
    }

    /// All remote calls issued.
    pub fn total(&self) -> u64 {
        self.gets() + self.slices() + self.inserts() + self.removes() + self.batch_mutates()
    }
}

/// Pending fault injection: succeed `after` more calls, then keep failing.
#[derive(Debug, Default)]
struct FaultPlan {
    after: u64,
    error: Option<BackendError>,
}

/// Process-local [`BackendClient`] implementation.
#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
    tables: Arc<RwLock<BTreeMap<String, Rows>>>,
    counts: Arc<CallCounts>,
    fault: Arc<Mutex<FaultPlan>>,
    batches: Arc<Mutex<Vec<MutationBatch>>>,
}

impl MemoryBackend {
    /// Create an empty backend. Column families come into existence on
    /// first write.
    pub fn new() -> Self {
        Self::default()
    }

    /// Call counters shared by every clone of this backend.
    pub fn counts(&self) -> &CallCounts {
        &self.counts
    }

    /// Let the next `successes` calls succeed, then fail every following
    /// call with `error` until [`clear_fault`](Self::clear_fault).
    pub fn fail_after(&self, successes: u64, error: BackendError) {
        let mut fault = self.fault.lock();
        fault.after = successes;
        fault.error = Some(error);
    }

    /// Disarm fault injection.
    pub fn clear_fault(&self) {
        *self.fault.lock() = FaultPlan::default();
    }

    /// Drain the batches accepted by `batch_mutate`, in arrival order.
    ///
    /// Observation hook for tests; batches accumulate until drained.
    pub fn take_batches(&self) -> Vec<MutationBatch> {
        std::mem::take(&mut *self.batches.lock())
    }

    /// The stored write timestamp for a coordinate, if present.
    pub fn column_timestamp(&self, column_family: &str, key: &[u8], column: &[u8]) -> Option<u64> {
        let tables = self.tables.read();
        tables
            .get(column_family)?
            .get(key)?
            .get(column)
            .map(|cell| cell.timestamp)
    }

    /// Rows must be named; the remote backend rejects empty keys too.
    fn check_key(key: &Bytes) -> BackendResult<()> {
        if key.is_empty() {
            return Err(BackendError::InvalidRequest {
                reason: "key may not be empty".to_string(),
            });
        }
        Ok(())
    }

    /// Count one call and apply any armed fault.
    fn admit(&self, counter: &AtomicU64) -> BackendResult<()> {
        counter.fetch_add(1, Ordering::Relaxed);
        let mut fault = self.fault.lock();
        if let Some(error) = fault.error.as_ref() {
            if fault.after == 0 {
                return Err(error.clone());
            }
            fault.after -= 1;
        }
        Ok(())
    }

    /// Write resolution: highest timestamp wins, equal timestamps resolved
    /// by lexical comparison on the value.
    fn apply_write(row: &mut Row, column: BackendColumn) {
        match row.get(&column.name) {
            Some(cell) if column.timestamp < cell.timestamp => {}
            Some(cell) if column.timestamp == cell.timestamp && column.value <= cell.value => {}
            _ => {
                row.insert(
                    column.name,
                    Cell {
                        value: column.value,
                        timestamp: column.timestamp,
                    },
                );
            }
        }
    }

    /// Tombstones win equal-timestamp races against data.
    fn apply_delete(row: &mut Row, name: &Bytes, timestamp: u64) {
        if let Some(cell) = row.get(name) {
            if cell.timestamp <= timestamp {
                row.remove(name);
            }
        }
    }

    fn slice_row(row: &Row, predicate: &SlicePredicate) -> BackendResult<Vec<ColumnOrSuperColumn>> {
        match predicate {
            SlicePredicate::ColumnNames(names) => {
                let mut wanted = names.clone();
                wanted.sort();
                wanted.dedup();
                Ok(wanted
                    .into_iter()
                    .filter_map(|name| {
                        row.get(&name).map(|cell| {
                            ColumnOrSuperColumn::Column(BackendColumn {
                                name: name.clone(),
                                value: cell.value.clone(),
                                timestamp: cell.timestamp,
                            })
                        })
                    })
                    .collect())
            }
            SlicePredicate::Range(range) => {
                if range.count <= 0 {
                    return Err(BackendError::InvalidRequest {
                        reason: format!("slice count must be positive, got {}", range.count),
                    });
                }
                if !range.start.is_empty() && !range.finish.is_empty() && range.start >= range.finish
                {
                    return Err(BackendError::InvalidRequest {
                        reason: "slice range requires start < finish".to_string(),
                    });
                }
                let lower = if range.start.is_empty() {
                    Bound::Unbounded
                } else {
                    Bound::Included(range.start.clone())
                };
                let upper = if range.finish.is_empty() {
                    Bound::Unbounded
                } else {
                    Bound::Included(range.finish.clone())
                };
                Ok(row
                    .range((lower, upper))
                    .take(range.count as usize)
                    .map(|(name, cell)| {
                        ColumnOrSuperColumn::Column(BackendColumn {
                            name: name.clone(),
                            value: cell.value.clone(),
                            timestamp: cell.timestamp,
                        })
                    })
                    .collect())
            }
        }
    }
}

impl BackendClient for MemoryBackend {
    fn get(
        &mut self,
        key: &Bytes,
        path: &ColumnPath,
        _consistency: ConsistencyLevel,
    ) -> BackendResult<ColumnOrSuperColumn> {
        self.admit(&self.counts.gets)?;
        Self::check_key(key)?;
        let tables = self.tables.read();
        tables
            .get(&path.column_family)
            .and_then(|rows| rows.get(key))
            .and_then(|row| row.get(&path.column))
            .map(|cell| {
                ColumnOrSuperColumn::Column(BackendColumn {
                    name: path.column.clone(),
                    value: cell.value.clone(),
                    timestamp: cell.timestamp,
                })
            })
            .ok_or(BackendError::NotFound)
    }

    fn get_slice(
        &mut self,
        key: &Bytes,
        parent: &ColumnParent,
        predicate: &SlicePredicate,
        _consistency: ConsistencyLevel,
    ) -> BackendResult<Vec<ColumnOrSuperColumn>> {
        self.admit(&self.counts.slices)?;
        Self::check_key(key)?;
        let tables = self.tables.read();
        match tables
            .get(&parent.column_family)
            .and_then(|rows| rows.get(key))
        {
            Some(row) => Self::slice_row(row, predicate),
            // Validate even when the row is absent, as the backend would.
            None => Self::slice_row(&Row::new(), predicate),
        }
    }

    fn insert(
        &mut self,
        key: &Bytes,
        parent: &ColumnParent,
        column: BackendColumn,
        _consistency: ConsistencyLevel,
    ) -> BackendResult<()> {
        self.admit(&self.counts.inserts)?;
        Self::check_key(key)?;
        let mut tables = self.tables.write();
        let row = tables
            .entry(parent.column_family.clone())
            .or_default()
            .entry(key.clone())
            .or_default();
        Self::apply_write(row, column);
        Ok(())
    }

    fn remove(
        &mut self,
        key: &Bytes,
        path: &ColumnPath,
        timestamp: u64,
        _consistency: ConsistencyLevel,
    ) -> BackendResult<()> {
        self.admit(&self.counts.removes)?;
        Self::check_key(key)?;
        let mut tables = self.tables.write();
        if let Some(rows) = tables.get_mut(&path.column_family) {
            if let Some(row) = rows.get_mut(key) {
                Self::apply_delete(row, &path.column, timestamp);
                if row.is_empty() {
                    rows.remove(key);
                }
            }
        }
        Ok(())
    }

    fn batch_mutate(
        &mut self,
        batch: &MutationBatch,
        _consistency: ConsistencyLevel,
    ) -> BackendResult<()> {
        self.admit(&self.counts.batch_mutates)?;

        // Reject malformed batches before touching any row.
        for families in batch.values() {
            for mutations in families.values() {
                for mutation in mutations {
                    if let BatchMutation::Delete(deletion) = mutation {
                        if !matches!(deletion.predicate, SlicePredicate::ColumnNames(_)) {
                            return Err(BackendError::InvalidRequest {
                                reason: "batch deletions require explicit column names"
                                    .to_string(),
                            });
                        }
                    }
                }
            }
        }

        self.batches.lock().push(batch.clone());

        let mut tables = self.tables.write();
        for (key, families) in batch {
            for (column_family, mutations) in families {
                let rows = tables.entry(column_family.clone()).or_default();
                let row = rows.entry(key.clone()).or_default();
                for mutation in mutations {
                    match mutation {
                        BatchMutation::SetColumn(column) => {
                            Self::apply_write(row, column.clone());
                        }
                        BatchMutation::Delete(deletion) => {
                            if let SlicePredicate::ColumnNames(names) = &deletion.predicate {
                                for name in names {
                                    Self::apply_delete(row, name, deletion.timestamp);
                                }
                            }
                        }
                    }
                }
                if row.is_empty() {
                    rows.remove(key);
                }
            }
        }
        Ok(())
    }
}
