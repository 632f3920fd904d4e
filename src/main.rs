//! virtagent binary: boots the agent and serves the control socket.

use clap::Parser;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};
use virtagent::command::InterfaceType;
use virtagent::host::{
    BridgeVifDriver, HostContext, ScriptRouterResource, ShellStoragePoolManager, VifDriver,
    VirshConnectionManager,
};
use virtagent::script::ShellScriptRunner;
use virtagent::{handlers, AgentConfig, Dispatcher, HandlerRegistry};

/// Hypervisor management agent.
#[derive(Parser, Debug)]
#[command(name = "virtagent", version, about)]
struct Cli {
    /// Path to the configuration file (default: ~/.config/virtagent/agent.toml).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Override the control socket path.
    #[arg(long)]
    socket: Option<PathBuf>,

    /// Override the helper scripts directory.
    #[arg(long)]
    scripts_dir: Option<PathBuf>,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("virtagent=info".parse().expect("valid directive")),
        )
        .init();

    let cli = Cli::parse();

    let mut config = match AgentConfig::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "failed to load configuration");
            std::process::exit(1);
        }
    };
    if let Some(socket) = cli.socket {
        config.socket_path = socket;
    }
    if let Some(scripts_dir) = cli.scripts_dir {
        config.scripts_dir = scripts_dir;
    }

    let scripts = Arc::new(ShellScriptRunner);
    let vifs: HashMap<InterfaceType, Arc<dyn VifDriver>> = HashMap::from([(
        InterfaceType::Bridge,
        Arc::new(BridgeVifDriver::new(
            &config.virsh_path,
            config.scripts_dir.join("security_group.sh"),
        )) as Arc<dyn VifDriver>,
    )]);
    let host = Arc::new(HostContext::new(
        Arc::new(VirshConnectionManager::new(&config.virsh_path)),
        Arc::new(ShellStoragePoolManager::new(&config.virsh_path)),
        vifs,
        Arc::new(ScriptRouterResource::new(
            config.scripts_dir.join("router_proxy.sh"),
            scripts.clone(),
            config.script_timeout_ms,
        )),
        scripts,
    ));

    // Registration happens once, before any command is served. A duplicate
    // binding is a build defect; refuse to start.
    let registry = match HandlerRegistry::from_handlers(handlers::builtin(&config)) {
        Ok(registry) => registry,
        Err(e) => {
            error!(error = %e, "handler registration failed");
            std::process::exit(1);
        }
    };
    info!(
        version = virtagent::VERSION,
        handler_count = registry.len(),
        "handler registry populated"
    );

    let dispatcher = Arc::new(Dispatcher::new(registry));

    let listener = match virtagent::server::bind(&config.socket_path) {
        Ok(listener) => listener,
        Err(e) => {
            error!(socket = %config.socket_path.display(), error = %e, "failed to bind control socket");
            std::process::exit(1);
        }
    };
    info!(socket = %config.socket_path.display(), "control socket bound");

    if let Err(e) = virtagent::server::serve(listener, dispatcher, host) {
        error!(error = %e, "server error");
        std::process::exit(1);
    }
}
