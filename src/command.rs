//! Management-plane command types.
//!
//! A [`Command`] is an immutable, kind-tagged value describing one operation
//! to perform against the host. On the wire commands are JSON objects with a
//! `kind` discriminator in kebab-case:
//!
//! ```json
//! { "kind": "attach-iso", "vm_name": "i-2-7-VM", "iso_path": "/mnt/iso/x.iso", "attach": true }
//! ```
//!
//! Command kinds form a declared specialization hierarchy: a kind may name a
//! more general kind as its fallback, and the dispatcher walks that chain when
//! no handler is bound for the exact kind. The chain is a first-class data
//! structure ([`CommandKind::fallback`]) rather than an artifact of type
//! inheritance, so resolution order is directly testable.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

/// Identifier for a command kind.
///
/// `Display` and serde both use the kebab-case wire spelling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CommandKind {
    /// Liveness probe.
    Ping,
    /// Attach or detach ISO media on a domain.
    AttachIso,
    /// Scale vcpus/memory of a live domain.
    ScaleVm,
    /// Query the VNC console port of a domain.
    GetVncPort,
    /// Query capacity/usage of a storage pool.
    GetStorageStats,
    /// Remove a storage pool.
    DeleteStoragePool,
    /// Provision client access to a storage pool.
    PrepareStorageClient,
    /// Program firewall rules for a VM.
    SetNetworkRules,
    /// Attach a network interface to a domain.
    PlugNic,
    /// Detach a network interface from a domain.
    UnplugNic,
    /// Tear down a host bridge.
    DeleteBridge,
    /// Reboot a domain.
    Reboot,
    /// Reboot a virtual router (specialization of `reboot`).
    RebootRouter,
    /// Reboot a VPC virtual router (specialization of `reboot-router`).
    RebootVpcRouter,
    /// Apply parameters to a virtual router's sub-resources.
    ConfigureRouterParams,
    /// Invoke the backup script for a VM.
    RunBackup,
    /// Rotate a guest account password via script.
    RotatePassword,
}

impl CommandKind {
    /// The declared fallback kind, or `None` for root kinds.
    ///
    /// A command whose exact kind has no registered handler is retried against
    /// each ancestor in turn, most specific first.
    pub fn fallback(self) -> Option<CommandKind> {
        match self {
            CommandKind::RebootVpcRouter => Some(CommandKind::RebootRouter),
            CommandKind::RebootRouter => Some(CommandKind::Reboot),
            _ => None,
        }
    }

    /// Iterate the fallback chain, most specific ancestor first.
    ///
    /// Does not include `self`.
    pub fn fallback_chain(self) -> FallbackChain {
        FallbackChain {
            next: self.fallback(),
        }
    }
}

impl std::fmt::Display for CommandKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Reuse the serde spelling so logs and wire agree.
        let tag = match self {
            CommandKind::Ping => "ping",
            CommandKind::AttachIso => "attach-iso",
            CommandKind::ScaleVm => "scale-vm",
            CommandKind::GetVncPort => "get-vnc-port",
            CommandKind::GetStorageStats => "get-storage-stats",
            CommandKind::DeleteStoragePool => "delete-storage-pool",
            CommandKind::PrepareStorageClient => "prepare-storage-client",
            CommandKind::SetNetworkRules => "set-network-rules",
            CommandKind::PlugNic => "plug-nic",
            CommandKind::UnplugNic => "unplug-nic",
            CommandKind::DeleteBridge => "delete-bridge",
            CommandKind::Reboot => "reboot",
            CommandKind::RebootRouter => "reboot-router",
            CommandKind::RebootVpcRouter => "reboot-vpc-router",
            CommandKind::ConfigureRouterParams => "configure-router-params",
            CommandKind::RunBackup => "run-backup",
            CommandKind::RotatePassword => "rotate-password",
        };
        f.write_str(tag)
    }
}

/// Iterator over a kind's declared ancestors, most specific first.
#[derive(Debug, Clone)]
pub struct FallbackChain {
    next: Option<CommandKind>,
}

impl Iterator for FallbackChain {
    type Item = CommandKind;

    fn next(&mut self) -> Option<CommandKind> {
        let current = self.next.take()?;
        self.next = current.fallback();
        Some(current)
    }
}

/// Interface type used to select a vif driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum InterfaceType {
    /// Linux bridge networking.
    #[default]
    Bridge,
    /// Open vSwitch networking.
    Ovs,
}

impl std::fmt::Display for InterfaceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InterfaceType::Bridge => write!(f, "bridge"),
            InterfaceType::Ovs => write!(f, "ovs"),
        }
    }
}

/// One firewall rule in a `set-network-rules` command.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FirewallRule {
    /// Protocol (e.g., "tcp", "udp", "icmp").
    pub protocol: String,
    /// First port of the allowed range.
    pub start_port: u16,
    /// Last port of the allowed range.
    pub end_port: u16,
    /// Allowed source CIDRs.
    #[serde(default)]
    pub source_cidrs: Vec<String>,
}

/// A management-plane command.
///
/// Each variant carries the operation-specific fields for its kind; there is
/// no unified schema beyond the `kind` tag.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum Command {
    /// Liveness probe.
    Ping,

    /// Attach or detach ISO media on a domain.
    AttachIso {
        /// Target VM name.
        vm_name: String,
        /// Path to the ISO image on the host.
        iso_path: PathBuf,
        /// True to attach, false to detach.
        attach: bool,
    },

    /// Scale vcpus/memory of a live domain.
    ScaleVm {
        /// Target VM name.
        vm_name: String,
        /// New vcpu count.
        cpus: u32,
        /// New memory size in MiB.
        memory_mib: u64,
    },

    /// Query the VNC console port of a domain.
    GetVncPort {
        /// Target VM name.
        vm_name: String,
    },

    /// Query capacity/usage of a storage pool.
    GetStorageStats {
        /// Pool uuid.
        pool_uuid: String,
    },

    /// Remove a storage pool.
    DeleteStoragePool {
        /// Pool uuid.
        pool_uuid: String,
    },

    /// Provision client access to a storage pool.
    PrepareStorageClient {
        /// Pool uuid.
        pool_uuid: String,
    },

    /// Program firewall rules for a VM.
    SetNetworkRules {
        /// Target VM name.
        vm_name: String,
        /// Interface type selecting the vif driver.
        #[serde(default)]
        interface_type: InterfaceType,
        /// Rules to program.
        rules: Vec<FirewallRule>,
    },

    /// Attach a network interface to a domain.
    PlugNic {
        /// Target VM name.
        vm_name: String,
        /// Interface type selecting the vif driver.
        #[serde(default)]
        interface_type: InterfaceType,
        /// MAC address of the interface.
        mac: String,
        /// Bridge or switch to attach to.
        bridge: String,
    },

    /// Detach a network interface from a domain.
    UnplugNic {
        /// Target VM name.
        vm_name: String,
        /// Interface type selecting the vif driver.
        #[serde(default)]
        interface_type: InterfaceType,
        /// MAC address of the interface.
        mac: String,
    },

    /// Tear down a host bridge.
    DeleteBridge {
        /// Interface type selecting the vif driver.
        #[serde(default)]
        interface_type: InterfaceType,
        /// Name of the bridge to delete.
        bridge: String,
    },

    /// Reboot a domain.
    Reboot {
        /// Target VM name.
        vm_name: String,
    },

    /// Reboot a virtual router.
    ///
    /// Dispatched to the `reboot` handler via the fallback chain unless a
    /// router-specific handler is registered.
    RebootRouter {
        /// Target router VM name.
        vm_name: String,
    },

    /// Reboot a VPC virtual router.
    RebootVpcRouter {
        /// Target router VM name.
        vm_name: String,
    },

    /// Apply parameters to a virtual router's sub-resources.
    ConfigureRouterParams {
        /// Target router VM name.
        vm_name: String,
        /// Key/value parameters to apply.
        params: HashMap<String, String>,
    },

    /// Invoke the backup script for a VM.
    RunBackup {
        /// Target VM name.
        vm_name: String,
        /// Backup destination identifier.
        target: String,
    },

    /// Rotate a guest account password via script.
    RotatePassword {
        /// Target VM name.
        vm_name: String,
        /// New password.
        password: String,
    },
}

impl Command {
    /// The kind tag of this command (its most specific type).
    pub fn kind(&self) -> CommandKind {
        match self {
            Command::Ping => CommandKind::Ping,
            Command::AttachIso { .. } => CommandKind::AttachIso,
            Command::ScaleVm { .. } => CommandKind::ScaleVm,
            Command::GetVncPort { .. } => CommandKind::GetVncPort,
            Command::GetStorageStats { .. } => CommandKind::GetStorageStats,
            Command::DeleteStoragePool { .. } => CommandKind::DeleteStoragePool,
            Command::PrepareStorageClient { .. } => CommandKind::PrepareStorageClient,
            Command::SetNetworkRules { .. } => CommandKind::SetNetworkRules,
            Command::PlugNic { .. } => CommandKind::PlugNic,
            Command::UnplugNic { .. } => CommandKind::UnplugNic,
            Command::DeleteBridge { .. } => CommandKind::DeleteBridge,
            Command::Reboot { .. } => CommandKind::Reboot,
            Command::RebootRouter { .. } => CommandKind::RebootRouter,
            Command::RebootVpcRouter { .. } => CommandKind::RebootVpcRouter,
            Command::ConfigureRouterParams { .. } => CommandKind::ConfigureRouterParams,
            Command::RunBackup { .. } => CommandKind::RunBackup,
            Command::RotatePassword { .. } => CommandKind::RotatePassword,
        }
    }
}
