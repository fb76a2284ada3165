//! Configuration parsing and validation.
//!
//! Store configuration is loaded from TOML files. The `[store]` section
//! names the (keyspace, column family) pair the store binds; `[backend]`
//! and `[pool]` describe the remote backend and the connection pool that
//! deployments wire in around the adapter.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Top-level store configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Store identity: keyspace and column family.
    pub store: StoreSection,

    /// Remote backend endpoints and timeouts.
    #[serde(default)]
    pub backend: BackendSection,

    /// Connection pool sizing.
    #[serde(default)]
    pub pool: PoolSection,
}

/// Store identity configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreSection {
    /// Keyspace the store binds. Also the key the pool is indexed by.
    pub keyspace: String,

    /// Column family holding this store's rows.
    pub column_family: String,
}

/// Remote backend configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendSection {
    /// Backend host names or addresses.
    #[serde(default = "default_hosts")]
    pub hosts: Vec<String>,

    /// Backend RPC port.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Per-request timeout in milliseconds.
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

impl Default for BackendSection {
    fn default() -> Self {
        Self {
            hosts: default_hosts(),
            port: default_port(),
            request_timeout_ms: default_request_timeout_ms(),
        }
    }
}

/// Connection pool configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoolSection {
    /// Maximum pooled connections per keyspace.
    #[serde(default = "default_max_connections")]
    pub max_connections: usize,

    /// How long a borrow may wait for a free connection, in milliseconds.
    #[serde(default = "default_borrow_timeout_ms")]
    pub borrow_timeout_ms: u64,
}

impl Default for PoolSection {
    fn default() -> Self {
        Self {
            max_connections: default_max_connections(),
            borrow_timeout_ms: default_borrow_timeout_ms(),
        }
    }
}

// Default value functions

fn default_hosts() -> Vec<String> {
    vec!["127.0.0.1".to_string()]
}

fn default_port() -> u16 {
    9160
}

fn default_request_timeout_ms() -> u64 {
    10_000
}

fn default_max_connections() -> usize {
    16
}

fn default_borrow_timeout_ms() -> u64 {
    5_000
}

impl StoreConfig {
    /// Load configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;
        let config: StoreConfig =
            toml::from_str(&content).with_context(|| "failed to parse config file")?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: StoreConfig =
            toml::from_str(content).with_context(|| "failed to parse config")?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration consistency.
    pub fn validate(&self) -> Result<()> {
        self.validate_store()?;
        self.validate_backend()?;
        self.validate_pool()?;
        Ok(())
    }

    fn validate_store(&self) -> Result<()> {
        if self.store.keyspace.is_empty() {
            anyhow::bail!("store.keyspace must not be empty");
        }
        if self.store.column_family.is_empty() {
            anyhow::bail!("store.column_family must not be empty");
        }
        Ok(())
    }

    fn validate_backend(&self) -> Result<()> {
        if self.backend.hosts.is_empty() {
            anyhow::bail!("backend.hosts must name at least one host");
        }
        if self.backend.port == 0 {
            anyhow::bail!("backend.port must be > 0");
        }
        if self.backend.request_timeout_ms == 0 {
            anyhow::bail!("backend.request_timeout_ms must be > 0");
        }
        Ok(())
    }

    fn validate_pool(&self) -> Result<()> {
        if self.pool.max_connections == 0 {
            anyhow::bail!("pool.max_connections must be > 0");
        }
        Ok(())
    }
}
