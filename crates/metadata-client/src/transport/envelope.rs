//! JSON frames exchanged with the hub.

use metadata_common::ProtocolError;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One WebSocket text frame.
///
/// ```json
/// {"type":"invoke","id":1,"method":"GetChangesSince","args":[5]}
/// {"type":"completion","id":1,"result":{"queue_id":12,"beatmap_set_ids":[3,7]}}
/// {"type":"push","method":"DisconnectRequested","args":[]}
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Frame {
    Invoke {
        id: u64,
        method: String,
        #[serde(default)]
        args: Vec<Value>,
    },
    Completion {
        id: u64,
        #[serde(default)]
        result: Value,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    },
    Push {
        method: String,
        #[serde(default)]
        args: Value,
    },
    /// The hub is about to close the socket.
    Close {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        reason: Option<String>,
    },
}

impl Frame {
    pub fn decode(text: &str) -> Result<Self, ProtocolError> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn encode(&self) -> Result<String, ProtocolError> {
        Ok(serde_json::to_string(self)?)
    }
}
