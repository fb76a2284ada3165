//! Pooled connection leasing.
//!
//! The connection pool itself is owned by the deployment; the store only
//! consumes the [`ConnectionPool`] contract. What the store does guarantee
//! is lease discipline: every operation borrows exactly one connection,
//! uses it for all of the operation's remote calls, and returns it on
//! every exit path. [`ConnectionLease`] encodes that guarantee as a scoped
//! guard whose drop performs the return, so no early `?` can leak a
//! connection.
//!
//! [`StaticPool`] is the embedded implementation used with
//! [`MemoryBackend`](crate::backend::MemoryBackend) and in tests: it hands
//! out clones of a registered prototype client and counts traffic.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};

use thiserror::Error;

use crate::backend::BackendClient;

/// Fault conditions when borrowing a connection.
#[derive(Debug, Clone, Error)]
pub enum PoolError {
    /// The pool has no client registered for this keyspace.
    #[error("no backend registered for keyspace {keyspace}")]
    UnknownKeyspace { keyspace: String },

    /// All connections for this keyspace are in use.
    #[error("connection pool exhausted for keyspace {keyspace}")]
    Exhausted { keyspace: String },
}

/// Keyed connection pool contract.
///
/// `borrow` may fail; `restore` must not. A borrowed connection is used
/// exclusively until restored, and every borrow is matched by exactly one
/// restore (enforced by [`ConnectionLease`]).
pub trait ConnectionPool: Send + Sync {
    /// The connection type handed out by this pool.
    type Conn: BackendClient;

    /// Borrow a connection for `keyspace`.
    fn borrow(&self, keyspace: &str) -> Result<Self::Conn, PoolError>;

    /// Return a previously borrowed connection.
    fn restore(&self, keyspace: &str, conn: Self::Conn);
}

/// Scoped borrow of one pooled connection.
///
/// The connection goes back to its pool when the lease is dropped, whether
/// the operation finished or bailed out with an error.
#[derive(Debug)]
pub struct ConnectionLease<'a, P: ConnectionPool> {
    pool: &'a P,
    keyspace: &'a str,
    conn: Option<P::Conn>,
}

impl<'a, P: ConnectionPool> ConnectionLease<'a, P> {
    /// Borrow a connection from `pool` for the scope of the lease.
    pub fn acquire(pool: &'a P, keyspace: &'a str) -> Result<Self, PoolError> {
        let conn = pool.borrow(keyspace)?;
        Ok(Self {
            pool,
            keyspace,
            conn: Some(conn),
        })
    }

    /// The leased connection.
    pub fn client(&mut self) -> &mut P::Conn {
        // Present from acquire until drop.
        self.conn.as_mut().expect("connection held until drop")
    }
}

impl<P: ConnectionPool> Drop for ConnectionLease<'_, P> {
    fn drop(&mut self) {
        if let Some(conn) = self.conn.take() {
            self.pool.restore(self.keyspace, conn);
        }
    }
}

/// Borrow/restore counters for observing lease discipline.
#[derive(Debug, Default)]
pub struct PoolStats {
    borrowed: AtomicU64,
    restored: AtomicU64,
}

impl PoolStats {
    /// Connections handed out.
    pub fn borrowed(&self) -> u64 {
        self.borrowed.load(Ordering::Relaxed)
    }

    /// Connections returned.
    pub fn restored(&self) -> u64 {
        self.restored.load(Ordering::Relaxed)
    }

    /// Connections currently out on lease.
    pub fn outstanding(&self) -> u64 {
        self.borrowed() - self.restored()
    }

    fn record_borrow(&self) {
        self.borrowed.fetch_add(1, Ordering::Relaxed);
    }

    fn record_restore(&self) {
        self.restored.fetch_add(1, Ordering::Relaxed);
    }
}

/// Pool handing out clones of registered prototype clients.
///
/// Suits clients whose clones share one session, such as
/// [`MemoryBackend`](crate::backend::MemoryBackend). Production
/// deployments substitute their own [`ConnectionPool`] implementation.
#[derive(Debug, Default)]
pub struct StaticPool<C> {
    clients: BTreeMap<String, C>,
    stats: PoolStats,
}

impl<C> StaticPool<C> {
    /// Create an empty pool.
    pub fn new() -> Self {
        Self {
            clients: BTreeMap::new(),
            stats: PoolStats::default(),
        }
    }

    /// Register the prototype client for `keyspace`.
    pub fn register(mut self, keyspace: impl Into<String>, client: C) -> Self {
        self.clients.insert(keyspace.into(), client);
        self
    }

    /// Borrow/restore counters.
    pub fn stats(&self) -> &PoolStats {
        &self.stats
    }
}

impl<C> ConnectionPool for StaticPool<C>
where
    C: BackendClient + Clone + Send + Sync,
{
    type Conn = C;

    fn borrow(&self, keyspace: &str) -> Result<C, PoolError> {
        let client = self
            .clients
            .get(keyspace)
            .cloned()
            .ok_or_else(|| PoolError::UnknownKeyspace {
                keyspace: keyspace.to_string(),
            })?;
        self.stats.record_borrow();
        Ok(client)
    }

    fn restore(&self, _keyspace: &str, _conn: C) {
        self.stats.record_restore();
    }
}
