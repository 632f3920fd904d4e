//! Virtual-router resource.
//!
//! The router is configured through two sub-resources: the network side
//! (interfaces, routes) and the dns side (dnsmasq). Each apply reports its
//! own outcome; the `configure-router-params` handler combines them.

use crate::error::{Error, Result};
use crate::script::ScriptRunner;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::debug;

/// Operations on the virtual-router appliance.
pub trait RouterResource: Send + Sync {
    /// Establish the control channel to the named router VM.
    fn connect(&self, vm_name: &str) -> Result<()>;

    /// Apply parameters to the network sub-resource.
    ///
    /// `Ok(false)` means the router accepted the call but reported the
    /// configuration was not applied; `Err` is an internal fault.
    fn apply_network_params(
        &self,
        vm_name: &str,
        params: &HashMap<String, String>,
    ) -> Result<bool>;

    /// Apply parameters to the dns sub-resource.
    fn apply_dns_params(&self, vm_name: &str, params: &HashMap<String, String>) -> Result<bool>;
}

/// [`RouterResource`] driving the router-proxy script.
pub struct ScriptRouterResource {
    proxy_script: PathBuf,
    scripts: Arc<dyn ScriptRunner>,
    timeout_ms: u64,
}

impl ScriptRouterResource {
    /// Create a resource invoking `proxy_script` through `scripts`.
    pub fn new(
        proxy_script: impl Into<PathBuf>,
        scripts: Arc<dyn ScriptRunner>,
        timeout_ms: u64,
    ) -> Self {
        Self {
            proxy_script: proxy_script.into(),
            scripts,
            timeout_ms,
        }
    }

    fn invoke(&self, subcommand: &str, vm_name: &str, extra: &[String]) -> Result<String> {
        let mut args = vec![subcommand.to_string(), vm_name.to_string()];
        args.extend_from_slice(extra);
        self.scripts
            .run(&self.proxy_script, &args, Some(self.timeout_ms))
            .ok_or_else(|| {
                Error::router(
                    subcommand,
                    format!("router proxy returned no output for {}", vm_name),
                )
            })
    }

    fn apply(&self, subresource: &str, vm_name: &str, params: &HashMap<String, String>) -> Result<bool> {
        let mut kv: Vec<String> = params.iter().map(|(k, v)| format!("{}={}", k, v)).collect();
        kv.sort(); // stable argument order for the proxy
        let out = self.invoke(subresource, vm_name, &kv)?;
        let applied = out.trim().eq_ignore_ascii_case("success");
        debug!(vm = vm_name, subresource, applied, "router params applied");
        Ok(applied)
    }
}

impl RouterResource for ScriptRouterResource {
    fn connect(&self, vm_name: &str) -> Result<()> {
        self.invoke("connect", vm_name, &[])?;
        Ok(())
    }

    fn apply_network_params(
        &self,
        vm_name: &str,
        params: &HashMap<String, String>,
    ) -> Result<bool> {
        self.apply("network", vm_name, params)
    }

    fn apply_dns_params(&self, vm_name: &str, params: &HashMap<String, String>) -> Result<bool> {
        self.apply("dns", vm_name, params)
    }
}
