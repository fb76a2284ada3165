//! Trellis - ordered key-column-value adapter for wide-column backends.
//!
//! Trellis is the storage adapter a graph database uses to persist its
//! adjacency and property data in an external wide-column backend reached
//! over a row-oriented RPC protocol. It exposes a uniform, ordered,
//! sliceable key→(column→value) abstraction and translates it into
//! backend-specific remote calls.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                        Graph database                           │
//! │                    (adjacency, properties)                      │
//! └─────────────────────────────────────────────────────────────────┘
//!                                  │
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                      ColumnFamilyStore                          │
//! │  slice translation │ point ops │ batch mutator │ timestamps     │
//! └─────────────────────────────────────────────────────────────────┘
//!                                  │
//! ┌─────────────────────────────────────────────────────────────────┐
//! │               ConnectionPool (leased per operation)             │
//! └─────────────────────────────────────────────────────────────────┘
//!                                  │
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                  Wide-column backend (RPC)                      │
//! │        get │ get_slice │ insert │ remove │ batch_mutate         │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Module Organization
//!
//! ## Core
//! - [`core::config`] - Configuration parsing and validation
//! - [`core::error`] - Storage error taxonomy and backend fault mapping
//! - [`core::time`] - Strictly monotonic write timestamp oracle
//!
//! ## Backend
//! - [`backend::types`] - Data types of the row-oriented RPC surface
//! - [`backend::client`] - The consumed backend RPC contract
//! - [`backend::memory`] - In-process backend for tests and embedded use
//!
//! ## Pool
//! - [`pool`] - Connection pool contract and scoped lease guard
//!
//! ## Store
//! - [`store`] - The ordered key-column-value surface and its
//!   column-family implementation
//!
//! # Key Invariants
//!
//! - Write timestamps issued by one store strictly increase
//! - Slice results honor exclusive bounds by client-side filtering
//! - Every borrowed connection is returned on every exit path
//! - Every remote call runs at the strongest replica agreement

// Core infrastructure
pub mod core;

// Backend RPC surface
pub mod backend;

// Connection leasing
pub mod pool;

// The ordered key-column-value store
pub mod store;

// Re-exports for convenience
pub use self::core::config::StoreConfig;
pub use self::core::error::{ErrorCode, StoreError, StoreResult};
pub use self::core::time::TimestampOracle;
pub use backend::{BackendClient, BackendError, ConsistencyLevel, MemoryBackend};
pub use pool::{ConnectionLease, ConnectionPool, PoolError, StaticPool};
pub use store::{
    ColumnFamilyStore, Entry, NoTransaction, OrderedColumnStore, RowMutation, TransactionHandle,
};
