//! Media attachment.

use crate::answer::{Answer, AnswerPayload};
use crate::command::{Command, CommandKind};
use crate::dispatch::CommandHandler;
use crate::error::Result;
use crate::host::HostContext;
use tracing::info;

/// Handles `attach-iso`: inserts or ejects ISO media on a domain.
pub struct AttachIsoHandler;

impl CommandHandler for AttachIsoHandler {
    fn kind(&self) -> CommandKind {
        CommandKind::AttachIso
    }

    fn execute(&self, command: &Command, host: &HostContext) -> Result<Answer> {
        let Command::AttachIso {
            vm_name,
            iso_path,
            attach,
        } = command
        else {
            return Ok(Answer::failure("malformed command for attach-iso"));
        };

        let domain = host.connect(vm_name)?;
        let device_key = domain.attach_media(iso_path, *attach)?;
        info!(
            vm = %vm_name,
            iso = %iso_path.display(),
            attach,
            device_key = %device_key,
            "media change applied"
        );
        Ok(Answer::ok_with(AnswerPayload::DeviceKey { device_key }))
    }
}
