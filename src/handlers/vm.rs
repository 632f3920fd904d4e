//! Domain lifecycle and query handlers.

use crate::answer::{Answer, AnswerPayload};
use crate::command::{Command, CommandKind};
use crate::dispatch::CommandHandler;
use crate::error::Result;
use crate::host::HostContext;
use tracing::info;

/// Handles `ping`: liveness probe answering with the agent version.
pub struct PingHandler;

impl CommandHandler for PingHandler {
    fn kind(&self) -> CommandKind {
        CommandKind::Ping
    }

    fn execute(&self, _command: &Command, _host: &HostContext) -> Result<Answer> {
        Ok(Answer::ok_with(AnswerPayload::Text {
            output: format!("virtagent {}", crate::VERSION),
        }))
    }
}

/// Handles `scale-vm`: live vcpu/memory resize.
pub struct ScaleVmHandler;

impl CommandHandler for ScaleVmHandler {
    fn kind(&self) -> CommandKind {
        CommandKind::ScaleVm
    }

    fn execute(&self, command: &Command, host: &HostContext) -> Result<Answer> {
        let Command::ScaleVm {
            vm_name,
            cpus,
            memory_mib,
        } = command
        else {
            return Ok(Answer::failure("malformed command for scale-vm"));
        };

        let domain = host.connect(vm_name)?;
        domain.scale(*cpus, *memory_mib)?;
        info!(vm = %vm_name, cpus, memory_mib, "domain scaled");
        Ok(Answer::ok())
    }
}

/// Handles `get-vnc-port`: console port query.
pub struct GetVncPortHandler;

impl CommandHandler for GetVncPortHandler {
    fn kind(&self) -> CommandKind {
        CommandKind::GetVncPort
    }

    fn execute(&self, command: &Command, host: &HostContext) -> Result<Answer> {
        let Command::GetVncPort { vm_name } = command else {
            return Ok(Answer::failure("malformed command for get-vnc-port"));
        };

        let domain = host.connect(vm_name)?;
        let port = domain.vnc_port()?;
        Ok(Answer::ok_with(AnswerPayload::VncPort { port }))
    }
}

/// Handles `reboot`, and through the fallback chain also `reboot-router` and
/// `reboot-vpc-router` when no specialized handler is registered.
pub struct RebootHandler;

impl RebootHandler {
    fn target(command: &Command) -> Option<&str> {
        match command {
            Command::Reboot { vm_name }
            | Command::RebootRouter { vm_name }
            | Command::RebootVpcRouter { vm_name } => Some(vm_name.as_str()),
            _ => None,
        }
    }
}

impl CommandHandler for RebootHandler {
    fn kind(&self) -> CommandKind {
        CommandKind::Reboot
    }

    fn execute(&self, command: &Command, host: &HostContext) -> Result<Answer> {
        let Some(vm_name) = Self::target(command) else {
            return Ok(Answer::failure("malformed command for reboot"));
        };

        let domain = host.connect(vm_name)?;
        domain.reboot()?;
        info!(vm = %vm_name, kind = %command.kind(), "domain rebooted");
        Ok(Answer::ok())
    }
}
