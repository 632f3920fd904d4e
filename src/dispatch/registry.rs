//! The handler registry.
//!
//! Single source of truth mapping command kind to handler. Population happens
//! once at startup from an explicit handler list; a duplicate binding is a
//! startup defect that prevents the agent from serving at all. After
//! population the table is immutable, so lookups are plain reads.

use super::CommandHandler;
use crate::command::CommandKind;
use crate::error::{Error, Result};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// Immutable-post-init table mapping command kind to handler.
#[derive(Default)]
pub struct HandlerRegistry {
    bindings: HashMap<CommandKind, Arc<dyn CommandHandler>>,
}

impl HandlerRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry from an explicit handler list.
    ///
    /// Fails on the first duplicate kind.
    pub fn from_handlers(
        handlers: impl IntoIterator<Item = Arc<dyn CommandHandler>>,
    ) -> Result<Self> {
        let mut registry = Self::new();
        for handler in handlers {
            registry.register(handler)?;
        }
        Ok(registry)
    }

    /// Insert a binding for the handler's declared kind.
    ///
    /// Returns [`Error::DuplicateHandler`] if the kind is already bound.
    /// Duplicates indicate a build-time defect, not a runtime condition to
    /// recover from; callers treat this as fatal.
    pub fn register(&mut self, handler: Arc<dyn CommandHandler>) -> Result<()> {
        let kind = handler.kind();
        if self.bindings.contains_key(&kind) {
            return Err(Error::DuplicateHandler { kind });
        }
        debug!(kind = %kind, "handler registered");
        self.bindings.insert(kind, handler);
        Ok(())
    }

    /// Exact-match lookup.
    pub fn lookup(&self, kind: CommandKind) -> Option<&Arc<dyn CommandHandler>> {
        self.bindings.get(&kind)
    }

    /// Number of registered bindings.
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::answer::Answer;
    use crate::command::Command;
    use crate::host::HostContext;

    struct FixedKindHandler(CommandKind);

    impl CommandHandler for FixedKindHandler {
        fn kind(&self) -> CommandKind {
            self.0
        }

        fn execute(&self, _command: &Command, _host: &HostContext) -> crate::error::Result<Answer> {
            Ok(Answer::ok())
        }
    }

    #[test]
    fn test_lookup_returns_registered_handler() {
        let mut registry = HandlerRegistry::new();
        registry
            .register(Arc::new(FixedKindHandler(CommandKind::Reboot)))
            .unwrap();

        let handler = registry.lookup(CommandKind::Reboot);
        assert!(handler.is_some(), "Registered kind should resolve");
        assert_eq!(handler.unwrap().kind(), CommandKind::Reboot);
    }

    #[test]
    fn test_lookup_is_exact_match_only() {
        let mut registry = HandlerRegistry::new();
        registry
            .register(Arc::new(FixedKindHandler(CommandKind::Reboot)))
            .unwrap();

        // Fallback walking belongs to the dispatcher, not the registry.
        assert!(
            registry.lookup(CommandKind::RebootRouter).is_none(),
            "Registry lookup must not walk the fallback chain"
        );
    }

    #[test]
    fn test_duplicate_registration_fails() {
        let mut registry = HandlerRegistry::new();
        registry
            .register(Arc::new(FixedKindHandler(CommandKind::AttachIso)))
            .unwrap();
        let err = registry
            .register(Arc::new(FixedKindHandler(CommandKind::AttachIso)))
            .unwrap_err();

        assert!(
            matches!(err, Error::DuplicateHandler { kind: CommandKind::AttachIso }),
            "Duplicate binding should report the colliding kind: {}",
            err
        );
    }

    #[test]
    fn test_from_handlers_builds_all_bindings() {
        let registry = HandlerRegistry::from_handlers([
            Arc::new(FixedKindHandler(CommandKind::Ping)) as Arc<dyn CommandHandler>,
            Arc::new(FixedKindHandler(CommandKind::Reboot)),
        ])
        .unwrap();
        assert_eq!(registry.len(), 2);
    }
}
