//! Virtual-router configuration.

use crate::answer::Answer;
use crate::command::{Command, CommandKind};
use crate::dispatch::CommandHandler;
use crate::error::Result;
use crate::host::HostContext;
use tracing::{info, warn};

/// Handles `configure-router-params`: applies parameters to the router's
/// network and dns sub-resources.
///
/// Overall success is the disjunction of the two sub-results; a partial
/// apply succeeds but carries a message naming the sub-resource that did not
/// take the configuration, so the management plane can distinguish it from a
/// clean apply.
pub struct ConfigureRouterParamsHandler;

impl CommandHandler for ConfigureRouterParamsHandler {
    fn kind(&self) -> CommandKind {
        CommandKind::ConfigureRouterParams
    }

    fn execute(&self, command: &Command, host: &HostContext) -> Result<Answer> {
        let Command::ConfigureRouterParams { vm_name, params } = command else {
            return Ok(Answer::failure(
                "malformed command for configure-router-params",
            ));
        };

        let router = host.router();
        router.connect(vm_name)?;

        let network_applied = router.apply_network_params(vm_name, params)?;
        let dns_applied = router.apply_dns_params(vm_name, params)?;

        let answer = match (network_applied, dns_applied) {
            (true, true) => Answer::ok(),
            (true, false) => partial(vm_name, "dns"),
            (false, true) => partial(vm_name, "network"),
            (false, false) => Answer::failure(format!(
                "router parameter configuration failed on both sub-resources: {}",
                vm_name
            )),
        };
        info!(
            vm = %vm_name,
            network_applied,
            dns_applied,
            success = answer.success,
            "router params configured"
        );
        Ok(answer)
    }
}

fn partial(vm_name: &str, failed: &str) -> Answer {
    warn!(vm = %vm_name, sub_resource = failed, "partial router configuration");
    Answer {
        success: true,
        message: Some(format!(
            "partial configuration: {} sub-resource not applied",
            failed
        )),
        payload: None,
    }
}
