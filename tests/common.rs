//! Common test utilities.
//!
//! This module contains shared helpers for integration tests.
//! Import with `mod common;` in test files.
#![allow(dead_code)]

use bytes::Bytes;
use std::sync::Arc;
use trellis::{ColumnFamilyStore, Entry, MemoryBackend, NoTransaction, StaticPool};

/// Keyspace every fixture store binds.
pub const KEYSPACE: &str = "graphstore";

/// Column family every fixture store binds.
pub const COLUMN_FAMILY: &str = "adjacency";

/// A store wired to an in-memory backend through the static pool.
pub struct Fixture {
    pub backend: MemoryBackend,
    pub pool: Arc<StaticPool<MemoryBackend>>,
    pub store: ColumnFamilyStore<StaticPool<MemoryBackend>>,
}

/// Build a fresh store over an empty in-memory backend.
pub fn fixture() -> Fixture {
    let backend = MemoryBackend::new();
    let pool = Arc::new(StaticPool::new().register(KEYSPACE, backend.clone()));
    let store = ColumnFamilyStore::new(KEYSPACE, COLUMN_FAMILY, Arc::clone(&pool))
        .expect("fixture identity is valid");
    Fixture {
        backend,
        pool,
        store,
    }
}

/// The no-op transaction handle used throughout the tests.
pub const TXH: NoTransaction = NoTransaction;

/// Byte sequence from a string literal.
pub fn b(s: &str) -> Bytes {
    Bytes::copy_from_slice(s.as_bytes())
}

/// Single-byte column name.
pub fn col(byte: u8) -> Bytes {
    Bytes::copy_from_slice(&[byte])
}

/// Entry from string literals.
pub fn entry(column: &str, value: &str) -> Entry {
    Entry::new(b(column), b(value))
}

/// Assert the column names of `entries`, in order.
#[track_caller]
pub fn assert_columns(entries: &[Entry], expected: &[Bytes]) {
    let columns: Vec<&Bytes> = entries.iter().map(|e| &e.column).collect();
    let wanted: Vec<&Bytes> = expected.iter().collect();
    assert_eq!(
        columns, wanted,
        "slice returned columns {:?}, expected {:?}",
        columns, wanted
    );
}

/// Assert that a result is Ok and return the value.
#[track_caller]
pub fn assert_ok<T, E: std::fmt::Debug>(result: Result<T, E>) -> T {
    match result {
        Ok(v) => v,
        Err(e) => panic!("Expected Ok, got Err: {:?}", e),
    }
}

/// Assert that a result is Err.
#[track_caller]
pub fn assert_err<T: std::fmt::Debug, E>(result: Result<T, E>) -> E {
    match result {
        Ok(v) => panic!("Expected Err, got Ok: {:?}", v),
        Err(e) => e,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixture_builds_a_usable_store() {
        let f = fixture();
        assert_eq!(f.store.keyspace(), KEYSPACE);
        assert_eq!(f.store.column_family(), COLUMN_FAMILY);
        assert_eq!(f.backend.counts().total(), 0);
    }

    #[test]
    fn col_builds_single_byte_names() {
        assert_eq!(col(0x01).as_ref(), &[0x01]);
    }
}
