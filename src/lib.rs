//! virtagent - command-dispatch core for a hypervisor management agent.
//!
//! virtagent receives typed management-plane commands describing operations
//! against a virtualization host (attach media, scale a VM, query storage
//! stats, configure network rules, ...), routes each to its handler, and
//! returns a uniformly shaped [`Answer`].
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────┐
//! │  management plane (framed JSON over unix socket)│
//! ├─────────────────────────────────────────────────┤
//! │  Dispatcher (resolution + fault translation)    │
//! ├─────────────────────────────────────────────────┤
//! │  HandlerRegistry (kind → handler, post-init RO) │
//! ├─────────────────────────────────────────────────┤
//! │  Handlers → HostContext (domains, pools, vifs,  │
//! │             router, scripts)                    │
//! └─────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```no_run
//! use std::collections::HashMap;
//! use std::sync::Arc;
//! use virtagent::{AgentConfig, Command, Dispatcher, HandlerRegistry};
//! use virtagent::handlers;
//! use virtagent::host::{
//!     BridgeVifDriver, HostContext, ScriptRouterResource, ShellStoragePoolManager,
//!     VifDriver, VirshConnectionManager,
//! };
//! use virtagent::command::InterfaceType;
//! use virtagent::script::ShellScriptRunner;
//!
//! let config = AgentConfig::default();
//! let scripts = Arc::new(ShellScriptRunner);
//! let vifs: HashMap<InterfaceType, Arc<dyn VifDriver>> = HashMap::from([(
//!     InterfaceType::Bridge,
//!     Arc::new(BridgeVifDriver::new(
//!         &config.virsh_path,
//!         config.scripts_dir.join("security_group.sh"),
//!     )) as Arc<dyn VifDriver>,
//! )]);
//! let host = Arc::new(HostContext::new(
//!     Arc::new(VirshConnectionManager::new(&config.virsh_path)),
//!     Arc::new(ShellStoragePoolManager::new(&config.virsh_path)),
//!     vifs,
//!     Arc::new(ScriptRouterResource::new(
//!         config.scripts_dir.join("router_proxy.sh"),
//!         scripts.clone(),
//!         config.script_timeout_ms,
//!     )),
//!     scripts,
//! ));
//!
//! let registry = HandlerRegistry::from_handlers(handlers::builtin(&config)).unwrap();
//! let dispatcher = Dispatcher::new(registry);
//!
//! let command: Command = serde_json::from_str(
//!     r#"{"kind":"get-vnc-port","vm_name":"i-2-7-VM"}"#,
//! ).unwrap();
//! let answer = dispatcher.dispatch(&command, &host);
//! println!("success: {}", answer.success);
//! ```
//!
//! # Guarantees
//!
//! - Exactly one [`Answer`] per dispatch; no handler fault ever propagates to
//!   the caller.
//! - Kinds with no exact handler resolve through their declared fallback
//!   chain (e.g., `reboot-vpc-router` → `reboot-router` → `reboot`).
//! - Duplicate handler registration is fatal at startup, never at runtime.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod answer;
pub mod command;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod handlers;
pub mod host;
pub mod script;
pub mod server;

// Re-export main types for convenience
pub use answer::{Answer, AnswerPayload};
pub use command::{Command, CommandKind};
pub use config::AgentConfig;
pub use dispatch::{CommandHandler, Dispatcher, HandlerRegistry};
pub use error::{Error, Result};
pub use host::HostContext;

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
