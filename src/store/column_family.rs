//! Column family store implementation.
//!
//! [`ColumnFamilyStore`] translates the ordered key-column-value surface
//! into backend RPCs. The interesting parts live in the slice path: the
//! backend's slice primitive is inclusive on both endpoints, rejects equal
//! endpoints outright, and has no exclusivity flags, so half-open
//! intervals are realized by degenerating equal-endpoint reads to point
//! gets and by filtering boundary columns out of the returned sequence.
//! Exclusivity cannot be emulated by adjusting endpoints because byte
//! strings have no successor in the general case; filtering is bounded by
//! the slice limit.

use bytes::Bytes;
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::backend::client::BackendClient;
use crate::backend::types::{
    BackendColumn, BatchMutation, ColumnOrSuperColumn, ColumnParent, ColumnPath, Deletion,
    MutationBatch, SlicePredicate, SliceRange,
};
use crate::backend::ConsistencyLevel;
use crate::core::config::StoreConfig;
use crate::core::error::{StoreError, StoreResult};
use crate::core::time::TimestampOracle;
use crate::pool::{ConnectionLease, ConnectionPool};

use super::{Entry, OrderedColumnStore, RowMutation, TransactionHandle};

/// Every remote call runs at the strongest replica agreement. Fixed by
/// design; reads and writes must agree on this constant.
const CONSISTENCY: ConsistencyLevel = ConsistencyLevel::All;

/// Store bound to one (keyspace, column family) pair.
///
/// Free-threaded: operations may be invoked concurrently from any number
/// of threads, each blocking for the duration of its remote calls. The
/// only internal mutable state is the per-instance [`TimestampOracle`].
#[derive(Debug)]
pub struct ColumnFamilyStore<P: ConnectionPool> {
    keyspace: String,
    column_family: String,
    pool: Arc<P>,
    oracle: TimestampOracle,
}

impl<P: ConnectionPool> ColumnFamilyStore<P> {
    /// Bind a store to `keyspace` and `column_family` over `pool`.
    pub fn new(
        keyspace: impl Into<String>,
        column_family: impl Into<String>,
        pool: Arc<P>,
    ) -> StoreResult<Self> {
        let keyspace = keyspace.into();
        let column_family = column_family.into();
        if keyspace.is_empty() {
            return Err(StoreError::argument("keyspace must not be empty"));
        }
        if column_family.is_empty() {
            return Err(StoreError::argument("column family must not be empty"));
        }
        Ok(Self {
            keyspace,
            column_family,
            pool,
            oracle: TimestampOracle::new(),
        })
    }

    /// Bind a store to the identity named by `config`.
    pub fn from_config(config: &StoreConfig, pool: Arc<P>) -> StoreResult<Self> {
        Self::new(
            config.store.keyspace.clone(),
            config.store.column_family.clone(),
            pool,
        )
    }

    /// The keyspace this store binds.
    pub fn keyspace(&self) -> &str {
        &self.keyspace
    }

    /// The column family this store binds.
    pub fn column_family(&self) -> &str {
        &self.column_family
    }

    fn lease(&self) -> StoreResult<ConnectionLease<'_, P>> {
        ConnectionLease::acquire(self.pool.as_ref(), &self.keyspace).map_err(StoreError::from)
    }

    fn parent(&self) -> ColumnParent {
        ColumnParent::new(self.column_family.as_str())
    }

    /// Insert `entries` under `key`, one remote call per entry over one
    /// borrowed connection, all sharing one oracle timestamp.
    ///
    /// A failure mid-loop leaves earlier entries applied; retrying the
    /// whole call is safe because the retry carries a later timestamp.
    pub fn insert(
        &self,
        key: &Bytes,
        entries: &[Entry],
        _txh: &dyn TransactionHandle,
    ) -> StoreResult<()> {
        if entries.is_empty() {
            return Ok(());
        }
        let timestamp = self.oracle.next_timestamp();
        let parent = self.parent();
        let mut lease = self.lease()?;
        for entry in entries {
            let column = BackendColumn::new(entry.column.clone(), entry.value.clone(), timestamp);
            lease
                .client()
                .insert(key, &parent, column, CONSISTENCY)
                .map_err(StoreError::from)?;
        }
        Ok(())
    }

    /// Delete `columns` under `key`, one remote call per column over one
    /// borrowed connection, all sharing one oracle timestamp.
    ///
    /// Same at-least-once caveat as [`insert`](Self::insert).
    pub fn delete(
        &self,
        key: &Bytes,
        columns: &[Bytes],
        _txh: &dyn TransactionHandle,
    ) -> StoreResult<()> {
        if columns.is_empty() {
            return Ok(());
        }
        let timestamp = self.oracle.next_timestamp();
        let mut lease = self.lease()?;
        for column in columns {
            let path = ColumnPath::new(self.column_family.as_str(), column.clone());
            lease
                .client()
                .remove(key, &path, timestamp, CONSISTENCY)
                .map_err(StoreError::from)?;
        }
        Ok(())
    }

    /// Insert entries for many keys in one batched remote call, all
    /// sharing one oracle timestamp. Keys with no entries are omitted; an
    /// entirely empty map is a no-op.
    pub fn insert_many(
        &self,
        insertions: &BTreeMap<Bytes, Vec<Entry>>,
        _txh: &dyn TransactionHandle,
    ) -> StoreResult<()> {
        if insertions.is_empty() {
            return Ok(());
        }
        let timestamp = self.oracle.next_timestamp();

        let mut batch = MutationBatch::new();
        for (key, entries) in insertions {
            if entries.is_empty() {
                continue;
            }
            let mutations = entries
                .iter()
                .map(|entry| {
                    BatchMutation::SetColumn(BackendColumn::new(
                        entry.column.clone(),
                        entry.value.clone(),
                        timestamp,
                    ))
                })
                .collect();
            batch.insert(
                key.clone(),
                BTreeMap::from([(self.column_family.clone(), mutations)]),
            );
        }
        if batch.is_empty() {
            return Ok(());
        }
        self.submit_batch(&batch)
    }

    /// Delete columns for many keys in one batched remote call, all
    /// sharing one oracle timestamp. Keys with no columns are omitted; an
    /// entirely empty map is a no-op.
    pub fn delete_many(
        &self,
        deletions: &BTreeMap<Bytes, Vec<Bytes>>,
        _txh: &dyn TransactionHandle,
    ) -> StoreResult<()> {
        if deletions.is_empty() {
            return Ok(());
        }
        let timestamp = self.oracle.next_timestamp();

        let mut batch = MutationBatch::new();
        for (key, columns) in deletions {
            if columns.is_empty() {
                continue;
            }
            let deletion = Deletion::columns(columns.clone(), timestamp);
            batch.insert(
                key.clone(),
                BTreeMap::from([(
                    self.column_family.clone(),
                    vec![BatchMutation::Delete(deletion)],
                )]),
            );
        }
        if batch.is_empty() {
            return Ok(());
        }
        self.submit_batch(&batch)
    }

    fn submit_batch(&self, batch: &MutationBatch) -> StoreResult<()> {
        tracing::debug!(keys = batch.len(), "submitting batched mutation");
        let mut lease = self.lease()?;
        lease
            .client()
            .batch_mutate(batch, CONSISTENCY)
            .map_err(StoreError::from)
    }
}

/// Count field for the backend slice primitive.
fn slice_count(limit: i64) -> i32 {
    limit.min(i32::MAX as i64) as i32
}

fn reject_super_column(item: ColumnOrSuperColumn) -> StoreResult<BackendColumn> {
    item.into_column()
        .ok_or_else(|| StoreError::remote_invalid("backend returned a super column"))
}

impl<P: ConnectionPool> OrderedColumnStore for ColumnFamilyStore<P> {
    fn get_slice(
        &self,
        key: &Bytes,
        col_start: &Bytes,
        col_end: &Bytes,
        start_inclusive: bool,
        end_inclusive: bool,
        limit: i64,
        txh: &dyn TransactionHandle,
    ) -> StoreResult<Vec<Entry>> {
        let mut limit = limit;
        if limit < 0 {
            tracing::warn!(limit, "coercing negative slice limit to 0");
            limit = 0;
        }
        if limit == 0 {
            return Ok(Vec::new());
        }

        // The backend rejects slices whose endpoints are equal, so equal
        // bounds are resolved here: a point read when both flags admit the
        // boundary column, otherwise a provably empty interval.
        match col_start.cmp(col_end) {
            Ordering::Greater => {
                return Err(StoreError::argument(format!(
                    "column start {:?} is greater than column end {:?}; \
                     start must be less than or equal to end",
                    col_start, col_end
                )));
            }
            Ordering::Equal => {
                return if start_inclusive && end_inclusive {
                    Ok(self
                        .get(key, col_start, txh)?
                        .map(|value| vec![Entry::new(col_start.clone(), value)])
                        .unwrap_or_default())
                } else {
                    Ok(Vec::new())
                };
            }
            Ordering::Less => {}
        }

        let parent = self.parent();
        let predicate = SlicePredicate::Range(SliceRange::new(
            col_start.clone(),
            col_end.clone(),
            slice_count(limit),
        ));

        let mut lease = self.lease()?;
        let rows = lease
            .client()
            .get_slice(key, &parent, &predicate, CONSISTENCY)
            .map_err(StoreError::from)?;
        drop(lease);

        // The backend range is inclusive on both endpoints; exclusive
        // flags drop the boundary columns here.
        let mut entries = Vec::with_capacity(rows.len());
        for item in rows {
            let column = reject_super_column(item)?;
            if !start_inclusive && column.name <= *col_start {
                continue;
            }
            if !end_inclusive && column.name >= *col_end {
                continue;
            }
            entries.push(Entry {
                column: column.name,
                value: column.value,
            });
        }
        Ok(entries)
    }

    fn get(
        &self,
        key: &Bytes,
        column: &Bytes,
        _txh: &dyn TransactionHandle,
    ) -> StoreResult<Option<Bytes>> {
        let path = ColumnPath::new(self.column_family.as_str(), column.clone());
        let mut lease = self.lease()?;
        match lease.client().get(key, &path, CONSISTENCY) {
            Ok(item) => Ok(Some(reject_super_column(item)?.value)),
            Err(crate::backend::BackendError::NotFound) => Ok(None),
            Err(other) => Err(other.into()),
        }
    }

    fn contains_key(&self, key: &Bytes, _txh: &dyn TransactionHandle) -> StoreResult<bool> {
        let predicate = SlicePredicate::Range(SliceRange::unbounded(1));
        let parent = self.parent();
        let mut lease = self.lease()?;
        let rows = lease
            .client()
            .get_slice(key, &parent, &predicate, CONSISTENCY)
            .map_err(StoreError::from)?;
        Ok(!rows.is_empty())
    }

    fn contains_key_column(
        &self,
        key: &Bytes,
        column: &Bytes,
        _txh: &dyn TransactionHandle,
    ) -> StoreResult<bool> {
        let predicate = SlicePredicate::ColumnNames(vec![column.clone()]);
        let parent = self.parent();
        let mut lease = self.lease()?;
        let rows = lease
            .client()
            .get_slice(key, &parent, &predicate, CONSISTENCY)
            .map_err(StoreError::from)?;
        Ok(!rows.is_empty())
    }

    fn mutate(
        &self,
        key: &Bytes,
        additions: &[Entry],
        deletions: &[Bytes],
        txh: &dyn TransactionHandle,
    ) -> StoreResult<()> {
        // Deletions first: a column named in both halves carries distinct
        // oracle timestamps across the two phases, so the addition wins.
        if !deletions.is_empty() {
            self.delete(key, deletions, txh)?;
        }
        if !additions.is_empty() {
            self.insert(key, additions, txh)?;
        }
        Ok(())
    }

    fn mutate_many(
        &self,
        mutations: &BTreeMap<Bytes, RowMutation>,
        txh: &dyn TransactionHandle,
    ) -> StoreResult<()> {
        let mut deletions: BTreeMap<Bytes, Vec<Bytes>> = BTreeMap::new();
        let mut insertions: BTreeMap<Bytes, Vec<Entry>> = BTreeMap::new();
        for (key, mutation) in mutations {
            if mutation.has_deletions() {
                deletions.insert(key.clone(), mutation.deletions.clone());
            }
            if mutation.has_additions() {
                insertions.insert(key.clone(), mutation.additions.clone());
            }
        }

        // The deletion batch takes its timestamp before the insertion
        // batch and is submitted first, preserving the delete-then-add
        // resolution of single-key mutate at bulk scale.
        self.delete_many(&deletions, txh)?;
        self.insert_many(&insertions, txh)
    }

    fn acquire_lock(
        &self,
        _key: &Bytes,
        _column: &Bytes,
        _expected_value: &Bytes,
        _txh: &dyn TransactionHandle,
    ) -> StoreResult<()> {
        // Contractual no-op: optimistic locking is not implemented by this
        // adapter. Callers that speculatively request locks proceed.
        Ok(())
    }

    fn is_local_key(&self, _key: &Bytes) -> bool {
        // The backend's partitioning is not visible here; report every key
        // as local.
        true
    }

    fn close(&self) -> StoreResult<()> {
        // Connections belong to the pool.
        Ok(())
    }
}
