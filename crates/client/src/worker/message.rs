//! Page ↔ worker messages.
//!
//! Both directions use `{"type": "..."}` JSON framing.

use serde::{Deserialize, Serialize};
use shellcache_core::Error;

/// Commands a page may post to the worker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WorkerMessage {
    /// Activate without waiting for existing pages to close.
    SkipWaiting,
    /// Delete every store owned by this worker's naming convention.
    ClearCaches,
}

impl WorkerMessage {
    pub fn from_json(value: serde_json::Value) -> Result<Self, Error> {
        serde_json::from_value(value).map_err(|e| Error::InvalidInput(format!("unsupported message: {e}")))
    }
}

/// Notifications the worker broadcasts to pages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ClientMessage {
    #[serde(rename_all = "camelCase")]
    CachesClearedAck { version: String, deleted: Vec<String> },
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_commands() {
        assert_eq!(WorkerMessage::from_json(json!({"type": "SKIP_WAITING"})).unwrap(), WorkerMessage::SkipWaiting);
        assert_eq!(WorkerMessage::from_json(json!({"type": "CLEAR_CACHES"})).unwrap(), WorkerMessage::ClearCaches);
    }

    #[test]
    fn test_unknown_command_is_invalid_input() {
        let result = WorkerMessage::from_json(json!({"type": "REBOOT"}));
        assert!(matches!(result, Err(Error::InvalidInput(_))));
    }

    #[test]
    fn test_ack_wire_format() {
        let ack = ClientMessage::CachesClearedAck { version: "v3.4".into(), deleted: vec!["app-v1".into()] };
        assert_eq!(
            serde_json::to_value(&ack).unwrap(),
            json!({"type": "CACHES_CLEARED_ACK", "version": "v3.4", "deleted": ["app-v1"]})
        );
    }
}
