//! The uniform answer contract.
//!
//! Every dispatch produces exactly one [`Answer`], regardless of how the
//! handler fared. A failed domain operation ("the script exited non-zero") is
//! a successful dispatch carrying `success: false`; it is never an error.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// The uniform response returned for every command.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Answer {
    /// Whether the requested operation completed.
    pub success: bool,
    /// Human-readable detail, present on failure and on noteworthy success.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Kind-specific result data.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<AnswerPayload>,
}

impl Answer {
    /// A bare success with no payload.
    pub fn ok() -> Self {
        Self {
            success: true,
            message: None,
            payload: None,
        }
    }

    /// A success carrying a payload.
    pub fn ok_with(payload: AnswerPayload) -> Self {
        Self {
            success: true,
            message: None,
            payload: Some(payload),
        }
    }

    /// A domain failure with an explanatory message.
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: Some(message.into()),
            payload: None,
        }
    }
}

/// Kind-specific answer payloads.
///
/// The dispatch core is agnostic to payload content; each handled kind
/// defines its own shape here.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AnswerPayload {
    /// Device key of attached/detached media (`attach-iso`).
    DeviceKey {
        /// Guest device key (e.g., "hdc").
        device_key: String,
    },

    /// Pool capacity and usage (`get-storage-stats`).
    StorageStats {
        /// Total capacity in bytes.
        capacity_bytes: u64,
        /// Used bytes.
        used_bytes: u64,
    },

    /// Console port (`get-vnc-port`).
    VncPort {
        /// TCP port of the VNC console.
        port: u16,
    },

    /// Connection details for a prepared storage client (`prepare-storage-client`).
    ConnectionDetails {
        /// Driver-specific key/value connection parameters.
        details: HashMap<String, String>,
    },

    /// Free-form textual output (script-backed operations, `ping`).
    Text {
        /// Output text.
        output: String,
    },
}
