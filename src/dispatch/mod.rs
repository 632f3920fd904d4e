//! Command dispatch: the handler contract, the registry, and the dispatcher.
//!
//! Control flow for one request:
//!
//! ```text
//! management plane
//!      │ Command
//!      ▼
//! Dispatcher::dispatch ──► HandlerRegistry::lookup (exact, then fallback chain)
//!      │                          │
//!      │                          ▼
//!      │                   CommandHandler::execute(command, host)
//!      │                          │
//!      ▼                          ▼
//!   Answer ◄── fault translation (Err / panic → success=false)
//! ```
//!
//! The registry is populated once at startup and immutable afterwards, so
//! concurrent lookups need no locking. Each dispatch is independent; the
//! dispatcher holds no state between calls.

pub mod dispatcher;
pub mod registry;

pub use dispatcher::Dispatcher;
pub use registry::HandlerRegistry;

use crate::answer::Answer;
use crate::command::{Command, CommandKind};
use crate::error::Result;
use crate::host::HostContext;

/// A stateless unit implementing the operation for exactly one command kind.
///
/// Handlers are shared across concurrent invocations and must hold no
/// per-call mutable state. `execute` receives a command of the kind the
/// handler resolved for (which may be a specialization of [`kind`]) and a
/// borrow of the shared host context.
///
/// Domain-level failure ("the operation was attempted and did not succeed")
/// is expressed as `Ok(Answer { success: false, .. })`. An `Err` is an
/// internal fault; the dispatcher translates it into a failure answer and it
/// never reaches the caller as an error.
///
/// [`kind`]: CommandHandler::kind
pub trait CommandHandler: Send + Sync {
    /// The single command kind this handler is registered for.
    fn kind(&self) -> CommandKind;

    /// Execute the operation.
    fn execute(&self, command: &Command, host: &HostContext) -> Result<Answer>;
}
