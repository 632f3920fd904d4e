//! Storage pool management.
//!
//! The [`StoragePoolManager`] resolves pool uuids to [`StoragePool`] handles.
//! Lookup uses an `Option` sentinel rather than an error: a pool the manager
//! cannot locate is an expected condition that handlers report as a domain
//! failure (e.g., `get-storage-stats` answers "no storage pool to get
//! statistics from").

use crate::error::{Error, Result};
use std::collections::HashMap;
use std::path::PathBuf;
use std::process::Command;
use std::sync::Arc;
use tracing::debug;

/// Capacity and usage of one pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolStats {
    /// Total capacity in bytes.
    pub capacity_bytes: u64,
    /// Used bytes.
    pub used_bytes: u64,
}

/// Resolves pool uuids to pool handles.
pub trait StoragePoolManager: Send + Sync {
    /// Look up a pool by uuid. `None` means the pool is unknown to this host.
    fn lookup(&self, pool_uuid: &str) -> Option<Arc<dyn StoragePool>>;
}

/// Operations on one storage pool.
pub trait StoragePool: Send + Sync {
    /// Query capacity and usage.
    fn stats(&self) -> Result<PoolStats>;

    /// Remove the pool from the host.
    fn delete(&self) -> Result<()>;

    /// Provision client access, returning driver-specific connection details.
    fn prepare_client(&self) -> Result<HashMap<String, String>>;
}

/// [`StoragePoolManager`] backed by the `virsh pool-*` CLI.
pub struct ShellStoragePoolManager {
    virsh: PathBuf,
}

impl ShellStoragePoolManager {
    /// Create a manager invoking the given `virsh` binary.
    pub fn new(virsh: impl Into<PathBuf>) -> Self {
        Self {
            virsh: virsh.into(),
        }
    }
}

impl StoragePoolManager for ShellStoragePoolManager {
    fn lookup(&self, pool_uuid: &str) -> Option<Arc<dyn StoragePool>> {
        let output = Command::new(&self.virsh)
            .args(["pool-info", pool_uuid])
            .output()
            .ok()?;
        if !output.status.success() {
            debug!(pool = pool_uuid, "pool not present on host");
            return None;
        }
        Some(Arc::new(ShellPool {
            virsh: self.virsh.clone(),
            uuid: pool_uuid.to_string(),
        }))
    }
}

/// One pool driven through `virsh`.
struct ShellPool {
    virsh: PathBuf,
    uuid: String,
}

impl ShellPool {
    fn pool_info(&self) -> Result<String> {
        let output = Command::new(&self.virsh)
            .args(["pool-info", "--bytes", &self.uuid])
            .output()
            .map_err(|e| Error::storage("stat pool", e.to_string()))?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::storage("stat pool", stderr.trim().to_string()));
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

impl StoragePool for ShellPool {
    fn stats(&self) -> Result<PoolStats> {
        let info = self.pool_info()?;
        let field = |name: &str| -> Result<u64> {
            info.lines()
                .find(|l| l.starts_with(name))
                .and_then(|l| l.rsplit(':').next())
                .and_then(|v| v.trim().parse::<u64>().ok())
                .ok_or_else(|| {
                    Error::storage("stat pool", format!("missing field '{}' in pool-info", name))
                })
        };
        let capacity_bytes = field("Capacity")?;
        let allocation = field("Allocation")?;
        Ok(PoolStats {
            capacity_bytes,
            used_bytes: allocation,
        })
    }

    fn delete(&self) -> Result<()> {
        for (operation, args) in [
            ("destroy pool", ["pool-destroy", self.uuid.as_str()]),
            ("undefine pool", ["pool-undefine", self.uuid.as_str()]),
        ] {
            let output = Command::new(&self.virsh)
                .args(args)
                .output()
                .map_err(|e| Error::storage(operation, e.to_string()))?;
            if !output.status.success() {
                let stderr = String::from_utf8_lossy(&output.stderr);
                return Err(Error::storage(operation, stderr.trim().to_string()));
            }
        }
        Ok(())
    }

    fn prepare_client(&self) -> Result<HashMap<String, String>> {
        let output = Command::new(&self.virsh)
            .args(["pool-dumpxml", &self.uuid])
            .output()
            .map_err(|e| Error::storage("prepare client", e.to_string()))?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::storage("prepare client", stderr.trim().to_string()));
        }
        let mut details = HashMap::new();
        details.insert("pool".to_string(), self.uuid.clone());
        details.insert(
            "definition".to_string(),
            String::from_utf8_lossy(&output.stdout).into_owned(),
        );
        Ok(details)
    }
}
