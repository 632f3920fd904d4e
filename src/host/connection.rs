//! Domain connection management.
//!
//! A [`ConnectionManager`] resolves a VM name to a [`DomainHandle`] exposing
//! the per-domain operations handlers need. The production implementation
//! shells out to `virsh`; tests substitute in-process fakes.

use crate::error::{Error, Result};
use std::path::PathBuf;
use std::process::Command;
use std::sync::Arc;
use tracing::debug;

/// Acquires connections to domains by VM name.
pub trait ConnectionManager: Send + Sync {
    /// Connect to the named domain.
    fn connect(&self, vm_name: &str) -> Result<Arc<dyn DomainHandle>>;
}

/// Operations on one connected domain.
///
/// All calls are synchronous and fallible; faults are translated to failure
/// answers at the dispatcher boundary.
pub trait DomainHandle: Send + Sync {
    /// Attach (`attach = true`) or detach ISO media.
    ///
    /// Returns the guest device key the media is (or was) bound to.
    fn attach_media(&self, iso_path: &std::path::Path, attach: bool) -> Result<String>;

    /// Set vcpu count and memory of the live domain.
    fn scale(&self, cpus: u32, memory_mib: u64) -> Result<()>;

    /// Query the VNC console port.
    fn vnc_port(&self) -> Result<u16>;

    /// Reboot the domain.
    fn reboot(&self) -> Result<()>;
}

impl std::fmt::Debug for dyn DomainHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("dyn DomainHandle")
    }
}

/// [`ConnectionManager`] backed by the `virsh` CLI.
///
/// Every connect probes the domain; a handle is never handed out for a
/// domain that no longer exists. Handles are cheap name+binary pairs, so
/// nothing is cached across calls.
pub struct VirshConnectionManager {
    virsh: PathBuf,
}

impl VirshConnectionManager {
    /// Create a manager invoking the given `virsh` binary.
    pub fn new(virsh: impl Into<PathBuf>) -> Self {
        Self {
            virsh: virsh.into(),
        }
    }

    fn probe(&self, vm_name: &str) -> Result<()> {
        let output = Command::new(&self.virsh)
            .args(["dominfo", vm_name])
            .output()
            .map_err(|e| Error::connection(vm_name, e.to_string()))?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::connection(vm_name, stderr.trim().to_string()));
        }
        Ok(())
    }
}

impl ConnectionManager for VirshConnectionManager {
    fn connect(&self, vm_name: &str) -> Result<Arc<dyn DomainHandle>> {
        self.probe(vm_name)?;
        debug!(vm = vm_name, "domain connection established");

        Ok(Arc::new(VirshDomain {
            virsh: self.virsh.clone(),
            vm_name: vm_name.to_string(),
        }))
    }
}

/// One domain driven through `virsh`.
struct VirshDomain {
    virsh: PathBuf,
    vm_name: String,
}

impl VirshDomain {
    fn run(&self, operation: &str, args: &[&str]) -> Result<String> {
        let output = Command::new(&self.virsh)
            .args(args)
            .output()
            .map_err(|e| Error::domain(operation, e.to_string()))?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::domain(operation, stderr.trim().to_string()));
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

impl DomainHandle for VirshDomain {
    fn attach_media(&self, iso_path: &std::path::Path, attach: bool) -> Result<String> {
        // The cdrom target is fixed per our domain templates.
        const DEVICE_KEY: &str = "hdc";
        let iso = iso_path.display().to_string();
        let source = if attach { iso.as_str() } else { "" };
        self.run(
            "attach media",
            &[
                "change-media",
                &self.vm_name,
                DEVICE_KEY,
                source,
                if attach { "--insert" } else { "--eject" },
            ],
        )?;
        Ok(DEVICE_KEY.to_string())
    }

    fn scale(&self, cpus: u32, memory_mib: u64) -> Result<()> {
        let cpus = cpus.to_string();
        let kib = (memory_mib * 1024).to_string();
        self.run(
            "scale vcpus",
            &["setvcpus", &self.vm_name, &cpus, "--live"],
        )?;
        self.run("scale memory", &["setmem", &self.vm_name, &kib, "--live"])?;
        Ok(())
    }

    fn vnc_port(&self) -> Result<u16> {
        let out = self.run("query vnc port", &["vncdisplay", &self.vm_name])?;
        // vncdisplay prints ":<display>"; port is 5900 + display.
        let display = out
            .trim()
            .rsplit(':')
            .next()
            .and_then(|d| d.parse::<u16>().ok())
            .ok_or_else(|| Error::domain("query vnc port", format!("unparseable output: {}", out.trim())))?;
        Ok(5900 + display)
    }

    fn reboot(&self) -> Result<()> {
        self.run("reboot", &["reboot", &self.vm_name])?;
        Ok(())
    }
}
