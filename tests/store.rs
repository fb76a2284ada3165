//! Point operations, mutation ordering, and lease discipline.

mod common;

use common::{assert_err, assert_ok, b, entry, fixture, COLUMN_FAMILY, KEYSPACE, TXH};
use std::collections::BTreeMap;
use std::sync::Arc;
use trellis::{
    BackendError, ColumnFamilyStore, ErrorCode, MemoryBackend, OrderedColumnStore, RowMutation,
    StaticPool, StoreConfig,
};

// ============================================================================
// Point reads and writes
// ============================================================================

#[test]
fn insert_then_get_round_trips() {
    let f = fixture();
    let key = b("vertex-1");
    assert_ok(f.store.insert(&key, &[entry("edge", "weight=3")], &TXH));

    let value = assert_ok(f.store.get(&key, &b("edge"), &TXH));
    assert_eq!(value, Some(b("weight=3")));
}

#[test]
fn get_missing_column_is_none_not_error() {
    let f = fixture();
    let key = b("vertex-1");
    assert_ok(f.store.insert(&key, &[entry("present", "v")], &TXH));

    assert_eq!(assert_ok(f.store.get(&key, &b("absent"), &TXH)), None);
    assert_eq!(assert_ok(f.store.get(&b("no-row"), &b("c"), &TXH)), None);
}

#[test]
fn reinsert_overwrites() {
    let f = fixture();
    let key = b("vertex-1");
    assert_ok(f.store.insert(&key, &[entry("c", "v1")], &TXH));
    assert_ok(f.store.insert(&key, &[entry("c", "v2")], &TXH));

    assert_eq!(assert_ok(f.store.get(&key, &b("c"), &TXH)), Some(b("v2")));
}

#[test]
fn delete_removes_columns() {
    let f = fixture();
    let key = b("vertex-1");
    assert_ok(f.store.insert(&key, &[entry("a", "1"), entry("b", "2")], &TXH));
    assert_ok(f.store.delete(&key, &[b("a")], &TXH));

    assert_eq!(assert_ok(f.store.get(&key, &b("a"), &TXH)), None);
    assert_eq!(assert_ok(f.store.get(&key, &b("b"), &TXH)), Some(b("2")));
}

// ============================================================================
// Existence probes
// ============================================================================

#[test]
fn contains_key_sees_any_column() {
    let f = fixture();
    let key = b("vertex-1");
    assert!(!assert_ok(f.store.contains_key(&key, &TXH)));

    assert_ok(f.store.insert(&key, &[entry("c", "v")], &TXH));
    assert!(assert_ok(f.store.contains_key(&key, &TXH)));
}

#[test]
fn contains_key_goes_false_when_all_columns_deleted() {
    let f = fixture();
    let key = b("vertex-1");
    assert_ok(f.store.insert(&key, &[entry("a", "1"), entry("b", "2")], &TXH));
    assert_ok(f.store.delete(&key, &[b("a"), b("b")], &TXH));

    assert!(!assert_ok(f.store.contains_key(&key, &TXH)));
}

#[test]
fn contains_key_column_probes_one_coordinate() {
    let f = fixture();
    let key = b("vertex-1");
    assert_ok(f.store.insert(&key, &[entry("here", "v")], &TXH));

    assert!(assert_ok(f.store.contains_key_column(&key, &b("here"), &TXH)));
    assert!(!assert_ok(f.store.contains_key_column(&key, &b("gone"), &TXH)));
}

#[test]
fn contains_key_matches_unbounded_slice_probe() {
    let f = fixture();
    let key = b("vertex-1");
    assert_ok(f.store.insert(&key, &[entry("c", "v")], &TXH));

    let probe = assert_ok(f.store.get_slice(
        &key,
        &bytes::Bytes::from_static(&[0x00]),
        &bytes::Bytes::from_static(&[0xFF; 8]),
        true,
        true,
        1,
        &TXH,
    ));
    assert_eq!(
        assert_ok(f.store.contains_key(&key, &TXH)),
        !probe.is_empty()
    );
}

// ============================================================================
// Single-key mutate
// ============================================================================

#[test]
fn mutate_applies_deletions_before_additions() {
    let f = fixture();
    let key = b("vertex-1");
    assert_ok(f.store.insert(&key, &[entry("c", "old")], &TXH));

    // The same column in both halves: the addition wins.
    assert_ok(
        f.store
            .mutate(&key, &[entry("c", "new")], &[b("c")], &TXH),
    );
    assert_eq!(assert_ok(f.store.get(&key, &b("c"), &TXH)), Some(b("new")));
}

#[test]
fn mutate_with_empty_halves_is_a_no_op() {
    let f = fixture();
    let key = b("vertex-1");
    let before = f.backend.counts().total();

    assert_ok(f.store.mutate(&key, &[], &[], &TXH));
    assert_eq!(f.backend.counts().total(), before);
}

#[test]
fn mutate_applies_both_halves() {
    let f = fixture();
    let key = b("vertex-1");
    assert_ok(f.store.insert(&key, &[entry("doomed", "x")], &TXH));

    assert_ok(
        f.store
            .mutate(&key, &[entry("fresh", "y")], &[b("doomed")], &TXH),
    );
    assert_eq!(assert_ok(f.store.get(&key, &b("doomed"), &TXH)), None);
    assert_eq!(assert_ok(f.store.get(&key, &b("fresh"), &TXH)), Some(b("y")));
}

// ============================================================================
// Error propagation and lease discipline
// ============================================================================

#[test]
fn remote_faults_surface_with_their_cause_code() {
    let cases = [
        (BackendError::Timeout, ErrorCode::RemoteTimeout),
        (BackendError::Unavailable, ErrorCode::RemoteUnavailable),
        (
            BackendError::Transport {
                message: "connection reset".to_string(),
            },
            ErrorCode::RemoteTransport,
        ),
    ];
    for (fault, expected) in cases {
        let f = fixture();
        f.backend.fail_after(0, fault);
        let err = assert_err(f.store.get(&b("k"), &b("c"), &TXH));
        assert_eq!(err.code(), expected);
        assert!(err.is_remote());
    }
}

#[test]
fn every_path_returns_its_connection_on_success() {
    let f = fixture();
    let key = b("vertex-1");

    assert_ok(f.store.insert(&key, &[entry("c", "v")], &TXH));
    assert_ok(f.store.get(&key, &b("c"), &TXH));
    assert_ok(f.store.get_slice(&key, &b("a"), &b("z"), true, true, 10, &TXH));
    assert_ok(f.store.contains_key(&key, &TXH));
    assert_ok(f.store.contains_key_column(&key, &b("c"), &TXH));
    assert_ok(f.store.delete(&key, &[b("c")], &TXH));

    assert!(f.pool.stats().borrowed() > 0);
    assert_eq!(f.pool.stats().outstanding(), 0);
}

#[test]
fn every_path_returns_its_connection_on_failure() {
    let f = fixture();
    let key = b("vertex-1");
    assert_ok(f.store.insert(&key, &[entry("c", "v")], &TXH));

    f.backend.fail_after(0, BackendError::Unavailable);

    assert_err(f.store.get(&key, &b("c"), &TXH));
    assert_err(f.store.get_slice(&key, &b("a"), &b("z"), true, true, 10, &TXH));
    assert_err(f.store.contains_key(&key, &TXH));
    assert_err(f.store.contains_key_column(&key, &b("c"), &TXH));
    assert_err(f.store.insert(&key, &[entry("d", "w")], &TXH));
    assert_err(f.store.delete(&key, &[b("c")], &TXH));

    assert_eq!(f.pool.stats().outstanding(), 0);
}

#[test]
fn multi_entry_insert_is_at_least_once_on_mid_loop_failure() {
    let f = fixture();
    let key = b("vertex-1");

    // First insert call succeeds, second fails: the loop stops partway.
    f.backend.fail_after(1, BackendError::Timeout);
    let err = assert_err(f.store.insert(
        &key,
        &[entry("a", "1"), entry("b", "2"), entry("c", "3")],
        &TXH,
    ));
    assert_eq!(err.code(), ErrorCode::RemoteTimeout);
    assert_eq!(f.pool.stats().outstanding(), 0);

    f.backend.clear_fault();
    assert_eq!(assert_ok(f.store.get(&key, &b("a"), &TXH)), Some(b("1")));
    assert_eq!(assert_ok(f.store.get(&key, &b("b"), &TXH)), None);

    // Retrying the whole call converges.
    assert_ok(f.store.insert(
        &key,
        &[entry("a", "1"), entry("b", "2"), entry("c", "3")],
        &TXH,
    ));
    assert_eq!(assert_ok(f.store.get(&key, &b("c"), &TXH)), Some(b("3")));
}

#[test]
fn borrow_failure_surfaces_as_pool_error() {
    let backend = MemoryBackend::new();
    // Pool registered under a different keyspace than the store binds.
    let pool = Arc::new(StaticPool::new().register("elsewhere", backend));
    let store = assert_ok(ColumnFamilyStore::new(KEYSPACE, COLUMN_FAMILY, pool));

    let err = assert_err(store.get(&b("k"), &b("c"), &TXH));
    assert_eq!(err.code(), ErrorCode::Pool);
}

// ============================================================================
// Contractual no-ops and identity
// ============================================================================

#[test]
fn acquire_lock_is_a_no_op_without_rpc() {
    let f = fixture();
    let before = f.backend.counts().total();

    assert_ok(f.store.acquire_lock(&b("k"), &b("c"), &b("expected"), &TXH));
    assert_eq!(f.backend.counts().total(), before);
}

#[test]
fn every_key_is_reported_local() {
    let f = fixture();
    assert!(f.store.is_local_key(&b("anything")));
    assert!(f.store.is_local_key(&bytes::Bytes::new()));
}

#[test]
fn close_is_a_no_op() {
    let f = fixture();
    assert_ok(f.store.close());
    // The store keeps working; the pool owns the connections.
    assert_ok(f.store.contains_key(&b("k"), &TXH));
}

#[test]
fn empty_identity_is_rejected() {
    let pool = Arc::new(StaticPool::new().register(KEYSPACE, MemoryBackend::new()));
    let err = assert_err(ColumnFamilyStore::new("", COLUMN_FAMILY, Arc::clone(&pool)));
    assert_eq!(err.code(), ErrorCode::Argument);

    let err = assert_err(ColumnFamilyStore::new(KEYSPACE, "", pool));
    assert_eq!(err.code(), ErrorCode::Argument);
}

#[test]
fn stores_do_not_share_mutation_state() {
    let f = fixture();
    let other_store = assert_ok(ColumnFamilyStore::new(
        KEYSPACE,
        "properties",
        Arc::clone(&f.pool),
    ));

    assert_ok(f.store.insert(&b("k"), &[entry("c", "adjacency")], &TXH));
    assert_ok(other_store.insert(&b("k"), &[entry("c", "property")], &TXH));

    // Same key and column, different column families.
    assert_eq!(
        assert_ok(f.store.get(&b("k"), &b("c"), &TXH)),
        Some(b("adjacency"))
    );
    assert_eq!(
        assert_ok(other_store.get(&b("k"), &b("c"), &TXH)),
        Some(b("property"))
    );
}

// ============================================================================
// Configuration
// ============================================================================

#[test]
fn store_builds_from_config() {
    let config = assert_ok(StoreConfig::from_toml(
        r#"
[store]
keyspace = "graphstore"
column_family = "adjacency"
"#,
    ));
    let backend = MemoryBackend::new();
    let pool = Arc::new(StaticPool::new().register(&config.store.keyspace, backend));
    let store = assert_ok(ColumnFamilyStore::from_config(&config, pool));

    assert_eq!(store.keyspace(), "graphstore");
    assert_eq!(store.column_family(), "adjacency");
    assert_ok(store.insert(&b("k"), &[entry("c", "v")], &TXH));
}

#[test]
fn config_loads_from_file() {
    use std::io::Write;

    let mut file = tempfile::NamedTempFile::new().expect("temp file");
    file.write_all(
        br#"
[store]
keyspace = "graphstore"
column_family = "adjacency"

[backend]
hosts = ["cass-1", "cass-2"]
port = 9161

[pool]
max_connections = 4
"#,
    )
    .expect("write config");

    let config = assert_ok(StoreConfig::from_file(file.path()));
    assert_eq!(config.backend.hosts.len(), 2);
    assert_eq!(config.backend.port, 9161);
    assert_eq!(config.pool.max_connections, 4);
}

// Exercise mutate_many's lease discipline here alongside the other paths;
// batch semantics live in batch.rs.
#[test]
fn mutate_many_returns_connections_on_failure() {
    let f = fixture();
    f.backend.fail_after(0, BackendError::Timeout);

    let mut mutations = BTreeMap::new();
    mutations.insert(b("k1"), RowMutation::new().add(b("c"), b("v")).delete(b("d")));
    assert_err(f.store.mutate_many(&mutations, &TXH));

    assert_eq!(f.pool.stats().outstanding(), 0);
}
