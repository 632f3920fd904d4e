//! The host resource context.
//!
//! [`HostContext`] is the long-lived, process-wide capability struct that
//! handlers borrow for the duration of one call. It owns the collaborators
//! that actually touch the virtualization layer: domain connections, the
//! storage pool manager, vif drivers, the virtual-router resource, and the
//! script runner. All of them are consumed through trait objects so tests can
//! substitute in-process fakes.
//!
//! The dispatch core performs no locking over this context; mutual exclusion
//! over shared hypervisor state (one in-flight operation per VM, per-pool
//! serialization) is the responsibility of the owning collaborator.

pub mod connection;
pub mod network;
pub mod router;
pub mod storage;

use crate::command::InterfaceType;
use crate::error::Result;
use crate::script::ScriptRunner;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

pub use connection::{ConnectionManager, DomainHandle, VirshConnectionManager};
pub use network::{BridgeVifDriver, VifDriver};
pub use router::{RouterResource, ScriptRouterResource};
pub use storage::{PoolStats, ShellStoragePoolManager, StoragePool, StoragePoolManager};

/// Shared operational capabilities for handlers.
///
/// Constructed once at agent startup and torn down at shutdown. Handlers
/// never own it; each dispatch borrows it for one call.
pub struct HostContext {
    connections: Arc<dyn ConnectionManager>,
    pools: Arc<dyn StoragePoolManager>,
    vifs: HashMap<InterfaceType, Arc<dyn VifDriver>>,
    router: Arc<dyn RouterResource>,
    scripts: Arc<dyn ScriptRunner>,
}

impl HostContext {
    /// Assemble a context from its collaborators.
    pub fn new(
        connections: Arc<dyn ConnectionManager>,
        pools: Arc<dyn StoragePoolManager>,
        vifs: HashMap<InterfaceType, Arc<dyn VifDriver>>,
        router: Arc<dyn RouterResource>,
        scripts: Arc<dyn ScriptRunner>,
    ) -> Self {
        Self {
            connections,
            pools,
            vifs,
            router,
            scripts,
        }
    }

    /// Acquire a connection to the named domain.
    pub fn connect(&self, vm_name: &str) -> Result<Arc<dyn DomainHandle>> {
        self.connections.connect(vm_name)
    }

    /// The storage pool manager.
    pub fn pools(&self) -> &dyn StoragePoolManager {
        self.pools.as_ref()
    }

    /// Look up the vif driver for an interface type.
    ///
    /// Returns `None` when no driver is configured for the type; handlers
    /// report that as a domain failure.
    pub fn vif_driver(&self, interface_type: InterfaceType) -> Option<&dyn VifDriver> {
        self.vifs.get(&interface_type).map(|d| d.as_ref())
    }

    /// The virtual-router resource.
    pub fn router(&self) -> &dyn RouterResource {
        self.router.as_ref()
    }

    /// Run an external script, returning its stdout or `None` on failure.
    pub fn run_script(
        &self,
        script: &Path,
        args: &[String],
        timeout_ms: Option<u64>,
    ) -> Option<String> {
        self.scripts.run(script, args, timeout_ms)
    }
}
