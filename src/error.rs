//! Error types for virtagent.
//!
//! # Error Message Style Guide
//!
//! All error messages follow a consistent format:
//!
//! - **Format**: `"<operation> failed: <reason>"` or `"<entity> not found: <identifier>"`
//! - **Case**: All lowercase (Rust convention for error messages)
//! - **Context**: Include relevant identifiers (VM name, pool uuid, operation)
//!
//! Errors never cross the dispatcher boundary: every fault raised below it is
//! translated into a failure [`Answer`](crate::answer::Answer) before reaching
//! the management plane.

use crate::command::CommandKind;
use thiserror::Error;

/// Result type alias using virtagent's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in virtagent operations.
///
/// Error messages follow a consistent format. See module documentation for style guide.
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // Configuration Errors (fatal at startup)
    // ========================================================================
    /// A handler was registered twice for the same command kind.
    ///
    /// Duplicate registrations indicate a build-time defect; the agent refuses
    /// to start rather than serve with an ambiguous routing table.
    #[error("handler registration failed: duplicate binding for kind: {kind}")]
    DuplicateHandler {
        /// The command kind that was already bound.
        kind: CommandKind,
    },

    /// Configuration operation failed.
    #[error("config operation failed: {operation}: {reason}")]
    Config {
        /// The operation that failed (e.g., "load", "parse").
        operation: String,
        /// The reason for the failure.
        reason: String,
    },

    // ========================================================================
    // Host Resource Errors
    // ========================================================================
    /// Failed to acquire a connection to a domain.
    #[error("connection failed: {vm}: {reason}")]
    Connection {
        /// Target VM name.
        vm: String,
        /// The reason for the failure.
        reason: String,
    },

    /// A domain-level operation against the virtualization layer failed.
    #[error("domain operation failed: {operation}: {reason}")]
    Domain {
        /// The operation that failed (e.g., "attach media", "scale").
        operation: String,
        /// The reason for the failure.
        reason: String,
    },

    /// Storage pool operation failed.
    #[error("storage operation failed: {operation}: {reason}")]
    Storage {
        /// The operation that failed (e.g., "stat pool", "delete pool").
        operation: String,
        /// The reason for the failure.
        reason: String,
    },

    /// Network / vif driver operation failed.
    #[error("network operation failed: {operation}: {reason}")]
    Network {
        /// The operation that failed (e.g., "plug", "delete bridge").
        operation: String,
        /// The reason for the failure.
        reason: String,
    },

    /// Virtual router operation failed.
    #[error("router operation failed: {operation}: {reason}")]
    Router {
        /// The operation that failed (e.g., "connect", "apply params").
        operation: String,
        /// The reason for the failure.
        reason: String,
    },

}

impl Error {
    /// Create a connection error.
    pub fn connection(vm: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Connection {
            vm: vm.into(),
            reason: reason.into(),
        }
    }

    /// Create a domain operation error.
    pub fn domain(operation: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Domain {
            operation: operation.into(),
            reason: reason.into(),
        }
    }

    /// Create a storage operation error.
    pub fn storage(operation: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Storage {
            operation: operation.into(),
            reason: reason.into(),
        }
    }

    /// Create a network operation error.
    pub fn network(operation: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Network {
            operation: operation.into(),
            reason: reason.into(),
        }
    }

    /// Create a router operation error.
    pub fn router(operation: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Router {
            operation: operation.into(),
            reason: reason.into(),
        }
    }

    /// Create a config operation error.
    pub fn config(operation: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Config {
            operation: operation.into(),
            reason: reason.into(),
        }
    }
}
