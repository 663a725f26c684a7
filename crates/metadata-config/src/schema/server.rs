//! Metadata server connection settings.

use serde::{Deserialize, Serialize};

/// Where and how to reach the metadata hub.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// WebSocket URL of the metadata hub.
    pub url: String,
    /// Optional bearer token sent during the WebSocket handshake.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
    /// Per-call timeout in milliseconds (valid range: 100-120000).
    pub invoke_timeout_ms: u64,
    /// Connect timeout in seconds (valid range: 1-120).
    pub connect_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            url: "wss://spectator.ppy.sh/metadata".into(),
            access_token: None,
            invoke_timeout_ms: 15_000,
            connect_timeout_secs: 15,
        }
    }
}

impl std::fmt::Debug for ServerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerConfig")
            .field("url", &self.url)
            .field(
                "access_token",
                &self.access_token.as_ref().map(|_| "[REDACTED]"),
            )
            .field("invoke_timeout_ms", &self.invoke_timeout_ms)
            .field("connect_timeout_secs", &self.connect_timeout_secs)
            .finish()
    }
}
