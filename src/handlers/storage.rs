//! Storage pool handlers.

use crate::answer::{Answer, AnswerPayload};
use crate::command::{Command, CommandKind};
use crate::dispatch::CommandHandler;
use crate::error::Result;
use crate::host::HostContext;
use tracing::info;

/// Handles `get-storage-stats`: capacity/usage of one pool.
pub struct GetStorageStatsHandler;

impl CommandHandler for GetStorageStatsHandler {
    fn kind(&self) -> CommandKind {
        CommandKind::GetStorageStats
    }

    fn execute(&self, command: &Command, host: &HostContext) -> Result<Answer> {
        let Command::GetStorageStats { pool_uuid } = command else {
            return Ok(Answer::failure("malformed command for get-storage-stats"));
        };

        // An unknown pool is the expected failure path, not a fault.
        let Some(pool) = host.pools().lookup(pool_uuid) else {
            return Ok(Answer::failure("no storage pool to get statistics from"));
        };

        let stats = pool.stats()?;
        Ok(Answer::ok_with(AnswerPayload::StorageStats {
            capacity_bytes: stats.capacity_bytes,
            used_bytes: stats.used_bytes,
        }))
    }
}

/// Handles `delete-storage-pool`.
pub struct DeleteStoragePoolHandler;

impl CommandHandler for DeleteStoragePoolHandler {
    fn kind(&self) -> CommandKind {
        CommandKind::DeleteStoragePool
    }

    fn execute(&self, command: &Command, host: &HostContext) -> Result<Answer> {
        let Command::DeleteStoragePool { pool_uuid } = command else {
            return Ok(Answer::failure("malformed command for delete-storage-pool"));
        };

        let Some(pool) = host.pools().lookup(pool_uuid) else {
            // Deleting an absent pool is idempotent success.
            return Ok(Answer::ok());
        };

        pool.delete()?;
        info!(pool = %pool_uuid, "storage pool deleted");
        Ok(Answer::ok())
    }
}

/// Handles `prepare-storage-client`: provisions client access to a pool and
/// answers with the driver's connection details.
pub struct PrepareStorageClientHandler;

impl CommandHandler for PrepareStorageClientHandler {
    fn kind(&self) -> CommandKind {
        CommandKind::PrepareStorageClient
    }

    fn execute(&self, command: &Command, host: &HostContext) -> Result<Answer> {
        let Command::PrepareStorageClient { pool_uuid } = command else {
            return Ok(Answer::failure(
                "malformed command for prepare-storage-client",
            ));
        };

        let Some(pool) = host.pools().lookup(pool_uuid) else {
            return Ok(Answer::failure(format!(
                "storage pool not found: {}",
                pool_uuid
            )));
        };

        let details = pool.prepare_client()?;
        Ok(Answer::ok_with(AnswerPayload::ConnectionDetails { details }))
    }
}
