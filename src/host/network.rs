//! Network vif drivers.
//!
//! One [`VifDriver`] per interface type; handlers look the driver up through
//! [`HostContext::vif_driver`](super::HostContext::vif_driver) using the
//! interface type carried by the command. An unknown type resolves to `None`
//! and is reported as a domain failure, not a fault.

use crate::command::FirewallRule;
use crate::error::{Error, Result};
use std::path::PathBuf;
use std::process::Command;
use tracing::debug;

/// Driver for one interface technology (bridge, ovs, ...).
pub trait VifDriver: Send + Sync {
    /// Attach an interface with the given MAC to `bridge` on the named domain.
    fn plug(&self, vm_name: &str, mac: &str, bridge: &str) -> Result<()>;

    /// Detach the interface with the given MAC from the named domain.
    fn unplug(&self, vm_name: &str, mac: &str) -> Result<()>;

    /// Tear down a host bridge.
    fn delete_bridge(&self, bridge: &str) -> Result<()>;

    /// Program firewall rules for the named domain.
    fn apply_rules(&self, vm_name: &str, rules: &[FirewallRule]) -> Result<()>;
}

/// Linux-bridge [`VifDriver`] shelling out to `virsh` and `ip`.
pub struct BridgeVifDriver {
    virsh: PathBuf,
    security_script: PathBuf,
}

impl BridgeVifDriver {
    /// Create a driver using the given `virsh` binary and security-group script.
    pub fn new(virsh: impl Into<PathBuf>, security_script: impl Into<PathBuf>) -> Self {
        Self {
            virsh: virsh.into(),
            security_script: security_script.into(),
        }
    }

    fn run(&self, operation: &str, program: &PathBuf, args: &[&str]) -> Result<()> {
        let output = Command::new(program)
            .args(args)
            .output()
            .map_err(|e| Error::network(operation, e.to_string()))?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::network(operation, stderr.trim().to_string()));
        }
        Ok(())
    }
}

impl VifDriver for BridgeVifDriver {
    fn plug(&self, vm_name: &str, mac: &str, bridge: &str) -> Result<()> {
        debug!(vm = vm_name, mac, bridge, "plugging vif");
        self.run(
            "plug",
            &self.virsh,
            &[
                "attach-interface", vm_name, "bridge", bridge, "--mac", mac, "--live",
            ],
        )
    }

    fn unplug(&self, vm_name: &str, mac: &str) -> Result<()> {
        debug!(vm = vm_name, mac, "unplugging vif");
        self.run(
            "unplug",
            &self.virsh,
            &["detach-interface", vm_name, "bridge", "--mac", mac, "--live"],
        )
    }

    fn delete_bridge(&self, bridge: &str) -> Result<()> {
        debug!(bridge, "deleting bridge");
        let ip = PathBuf::from("ip");
        self.run("delete bridge", &ip, &["link", "set", bridge, "down"])?;
        self.run("delete bridge", &ip, &["link", "delete", bridge, "type", "bridge"])
    }

    fn apply_rules(&self, vm_name: &str, rules: &[FirewallRule]) -> Result<()> {
        // The security-group script takes the rule set as one encoded argument,
        // same shape the management plane sends: proto:start:end:cidr,cidr;...
        let encoded = rules
            .iter()
            .map(|r| {
                format!(
                    "{}:{}:{}:{}",
                    r.protocol,
                    r.start_port,
                    r.end_port,
                    r.source_cidrs.join(",")
                )
            })
            .collect::<Vec<_>>()
            .join(";");
        debug!(vm = vm_name, rule_count = rules.len(), "applying network rules");
        self.run(
            "apply rules",
            &self.security_script,
            &["--vm", vm_name, "--rules", &encoded],
        )
    }
}
