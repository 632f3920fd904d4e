//! Network handlers: firewall rules, nic plug/unplug, bridge teardown.
//!
//! Every handler here resolves its vif driver by the interface type carried
//! in the command; a type with no configured driver is a domain failure.

use crate::answer::Answer;
use crate::command::{Command, CommandKind, InterfaceType};
use crate::dispatch::CommandHandler;
use crate::error::Result;
use crate::host::{HostContext, VifDriver};
use tracing::info;

fn driver_or_failure(
    host: &HostContext,
    interface_type: InterfaceType,
) -> std::result::Result<&dyn VifDriver, Answer> {
    host.vif_driver(interface_type).ok_or_else(|| {
        Answer::failure(format!(
            "no vif driver configured for interface type: {}",
            interface_type
        ))
    })
}

/// Handles `set-network-rules`.
pub struct SetNetworkRulesHandler;

impl CommandHandler for SetNetworkRulesHandler {
    fn kind(&self) -> CommandKind {
        CommandKind::SetNetworkRules
    }

    fn execute(&self, command: &Command, host: &HostContext) -> Result<Answer> {
        let Command::SetNetworkRules {
            vm_name,
            interface_type,
            rules,
        } = command
        else {
            return Ok(Answer::failure("malformed command for set-network-rules"));
        };

        let driver = match driver_or_failure(host, *interface_type) {
            Ok(driver) => driver,
            Err(answer) => return Ok(answer),
        };
        driver.apply_rules(vm_name, rules)?;
        info!(vm = %vm_name, rule_count = rules.len(), "network rules programmed");
        Ok(Answer::ok())
    }
}

/// Handles `plug-nic`.
pub struct PlugNicHandler;

impl CommandHandler for PlugNicHandler {
    fn kind(&self) -> CommandKind {
        CommandKind::PlugNic
    }

    fn execute(&self, command: &Command, host: &HostContext) -> Result<Answer> {
        let Command::PlugNic {
            vm_name,
            interface_type,
            mac,
            bridge,
        } = command
        else {
            return Ok(Answer::failure("malformed command for plug-nic"));
        };

        let driver = match driver_or_failure(host, *interface_type) {
            Ok(driver) => driver,
            Err(answer) => return Ok(answer),
        };
        driver.plug(vm_name, mac, bridge)?;
        Ok(Answer::ok())
    }
}

/// Handles `unplug-nic`.
pub struct UnplugNicHandler;

impl CommandHandler for UnplugNicHandler {
    fn kind(&self) -> CommandKind {
        CommandKind::UnplugNic
    }

    fn execute(&self, command: &Command, host: &HostContext) -> Result<Answer> {
        let Command::UnplugNic {
            vm_name,
            interface_type,
            mac,
        } = command
        else {
            return Ok(Answer::failure("malformed command for unplug-nic"));
        };

        let driver = match driver_or_failure(host, *interface_type) {
            Ok(driver) => driver,
            Err(answer) => return Ok(answer),
        };
        driver.unplug(vm_name, mac)?;
        Ok(Answer::ok())
    }
}

/// Handles `delete-bridge`.
pub struct DeleteBridgeHandler;

impl CommandHandler for DeleteBridgeHandler {
    fn kind(&self) -> CommandKind {
        CommandKind::DeleteBridge
    }

    fn execute(&self, command: &Command, host: &HostContext) -> Result<Answer> {
        let Command::DeleteBridge {
            interface_type,
            bridge,
        } = command
        else {
            return Ok(Answer::failure("malformed command for delete-bridge"));
        };

        let driver = match driver_or_failure(host, *interface_type) {
            Ok(driver) => driver,
            Err(answer) => return Ok(answer),
        };
        driver.delete_bridge(bridge)?;
        info!(bridge = %bridge, "bridge deleted");
        Ok(Answer::ok())
    }
}
