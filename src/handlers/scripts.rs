//! Script-backed handlers: backup invocation and password rotation.
//!
//! Both delegate to [`ScriptRunner`](crate::script::ScriptRunner) through the
//! host context; the runner's `None` sentinel becomes a domain failure.

use crate::answer::{Answer, AnswerPayload};
use crate::command::{Command, CommandKind};
use crate::dispatch::CommandHandler;
use crate::error::Result;
use crate::host::HostContext;
use std::path::PathBuf;
use tracing::info;

/// Handles `run-backup`.
pub struct RunBackupHandler {
    script: PathBuf,
    timeout_ms: u64,
}

impl RunBackupHandler {
    /// Create a handler invoking `script` with the given timeout.
    pub fn new(script: PathBuf, timeout_ms: u64) -> Self {
        Self { script, timeout_ms }
    }
}

impl CommandHandler for RunBackupHandler {
    fn kind(&self) -> CommandKind {
        CommandKind::RunBackup
    }

    fn execute(&self, command: &Command, host: &HostContext) -> Result<Answer> {
        let Command::RunBackup { vm_name, target } = command else {
            return Ok(Answer::failure("malformed command for run-backup"));
        };

        let args = vec![vm_name.clone(), target.clone()];
        match host.run_script(&self.script, &args, Some(self.timeout_ms)) {
            Some(output) => {
                info!(vm = %vm_name, target = %target, "backup completed");
                Ok(Answer::ok_with(AnswerPayload::Text { output }))
            }
            None => Ok(Answer::failure(format!(
                "backup script failed for vm: {}",
                vm_name
            ))),
        }
    }
}

/// Handles `rotate-password`.
pub struct RotatePasswordHandler {
    script: PathBuf,
    timeout_ms: u64,
}

impl RotatePasswordHandler {
    /// Create a handler invoking `script` with the given timeout.
    pub fn new(script: PathBuf, timeout_ms: u64) -> Self {
        Self { script, timeout_ms }
    }
}

impl CommandHandler for RotatePasswordHandler {
    fn kind(&self) -> CommandKind {
        CommandKind::RotatePassword
    }

    fn execute(&self, command: &Command, host: &HostContext) -> Result<Answer> {
        let Command::RotatePassword { vm_name, password } = command else {
            return Ok(Answer::failure("malformed command for rotate-password"));
        };

        let args = vec![vm_name.clone(), password.clone()];
        match host.run_script(&self.script, &args, Some(self.timeout_ms)) {
            Some(_) => {
                // Never log the password itself.
                info!(vm = %vm_name, "password rotated");
                Ok(Answer::ok())
            }
            None => Ok(Answer::failure(format!(
                "password rotation script failed for vm: {}",
                vm_name
            ))),
        }
    }
}
