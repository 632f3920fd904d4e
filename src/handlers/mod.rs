//! The handler catalog.
//!
//! One stateless handler per command kind, each a thin delegation to the
//! host resource context. [`builtin`] enumerates the full set for registry
//! population at startup; registration order is irrelevant because duplicate
//! kinds are rejected outright.
//!
//! Handlers carry configuration fixed at startup (script paths, timeouts)
//! but no per-call mutable state, so a single instance is shared across all
//! concurrent dispatches.

mod media;
mod network;
mod router;
mod scripts;
mod storage;
mod vm;

pub use media::AttachIsoHandler;
pub use network::{DeleteBridgeHandler, PlugNicHandler, SetNetworkRulesHandler, UnplugNicHandler};
pub use router::ConfigureRouterParamsHandler;
pub use scripts::{RotatePasswordHandler, RunBackupHandler};
pub use storage::{
    DeleteStoragePoolHandler, GetStorageStatsHandler, PrepareStorageClientHandler,
};
pub use vm::{GetVncPortHandler, PingHandler, RebootHandler, ScaleVmHandler};

use crate::config::AgentConfig;
use crate::dispatch::CommandHandler;
use std::sync::Arc;

/// The built-in handler set, ready for registry population.
///
/// `reboot-router` and `reboot-vpc-router` have no entries of their own;
/// they reach [`RebootHandler`] through the declared fallback chain.
pub fn builtin(config: &AgentConfig) -> Vec<Arc<dyn CommandHandler>> {
    vec![
        Arc::new(PingHandler),
        Arc::new(AttachIsoHandler),
        Arc::new(ScaleVmHandler),
        Arc::new(GetVncPortHandler),
        Arc::new(RebootHandler),
        Arc::new(GetStorageStatsHandler),
        Arc::new(DeleteStoragePoolHandler),
        Arc::new(PrepareStorageClientHandler),
        Arc::new(SetNetworkRulesHandler),
        Arc::new(PlugNicHandler),
        Arc::new(UnplugNicHandler),
        Arc::new(DeleteBridgeHandler),
        Arc::new(ConfigureRouterParamsHandler),
        Arc::new(RunBackupHandler::new(
            config.scripts_dir.join("backup.sh"),
            config.script_timeout_ms,
        )),
        Arc::new(RotatePasswordHandler::new(
            config.scripts_dir.join("rotate_password.sh"),
            config.script_timeout_ms,
        )),
    ]
}
