//! The dispatcher.
//!
//! Single entry point translating "a command arrived" into "an answer was
//! produced". Resolution tries the command's exact kind first, then walks the
//! declared fallback chain; execution is isolated so that neither an `Err`
//! from the handler nor a panic ever escapes as anything but a failure
//! answer. One dispatch never affects another.

use super::{CommandHandler, HandlerRegistry};
use crate::answer::Answer;
use crate::command::Command;
use crate::host::HostContext;
use std::panic::{catch_unwind, AssertUnwindSafe};
use tracing::{debug, error, warn};

/// Stateless command dispatcher over an immutable registry.
pub struct Dispatcher {
    registry: HandlerRegistry,
}

impl Dispatcher {
    /// Create a dispatcher over a fully populated registry.
    pub fn new(registry: HandlerRegistry) -> Self {
        Self { registry }
    }

    /// The registry this dispatcher resolves against.
    pub fn registry(&self) -> &HandlerRegistry {
        &self.registry
    }

    /// Dispatch one command, always producing exactly one answer.
    ///
    /// Resolution failure, domain failure, and internal faults all surface
    /// as `Answer { success: false, .. }`; no fault propagates to the caller.
    pub fn dispatch(&self, command: &Command, host: &HostContext) -> Answer {
        let kind = command.kind();

        let handler = match self.resolve(command) {
            Some(handler) => handler,
            None => {
                warn!(kind = %kind, "no handler registered");
                return Answer::failure(format!(
                    "no handler registered for command kind: {}",
                    kind
                ));
            }
        };

        debug!(kind = %kind, resolved = %handler.kind(), "dispatching command");

        match catch_unwind(AssertUnwindSafe(|| handler.execute(command, host))) {
            Ok(Ok(answer)) => answer,
            Ok(Err(e)) => {
                error!(kind = %kind, error = %e, "handler fault");
                Answer::failure(e.to_string())
            }
            Err(panic) => {
                let reason = panic_message(panic.as_ref());
                error!(kind = %kind, reason = %reason, "handler panicked");
                Answer::failure(format!("internal fault handling {}: {}", kind, reason))
            }
        }
    }

    /// Resolve a handler for the command: exact kind first, then each
    /// declared ancestor, most specific first.
    fn resolve(&self, command: &Command) -> Option<&dyn CommandHandler> {
        let kind = command.kind();
        if let Some(handler) = self.registry.lookup(kind) {
            return Some(handler.as_ref());
        }
        for ancestor in kind.fallback_chain() {
            if let Some(handler) = self.registry.lookup(ancestor) {
                debug!(kind = %kind, ancestor = %ancestor, "resolved via fallback chain");
                return Some(handler.as_ref());
            }
        }
        None
    }
}

/// Best-effort extraction of a panic payload message.
fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
