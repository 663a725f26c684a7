//! Configuration for the WebSocket transport.

use std::time::Duration;

#[derive(Clone)]
pub struct TransportConfig {
    /// `ws://` or `wss://` endpoint of the metadata hub.
    pub url: String,
    /// Sent as `Authorization: Bearer <token>` during the handshake.
    pub access_token: Option<String>,
    pub connect_timeout: Duration,
    /// How long an invocation waits for its completion frame.
    pub invoke_timeout: Duration,
    /// Buffer size of the push channel handed to the client.
    pub push_capacity: usize,
}

impl std::fmt::Debug for TransportConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransportConfig")
            .field("url", &self.url)
            .field(
                "access_token",
                &self.access_token.as_ref().map(|_| "[REDACTED]"),
            )
            .field("connect_timeout", &self.connect_timeout)
            .field("invoke_timeout", &self.invoke_timeout)
            .field("push_capacity", &self.push_capacity)
            .finish()
    }
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            url: "wss://spectator.ppy.sh/metadata".to_string(),
            access_token: None,
            connect_timeout: Duration::from_secs(15),
            invoke_timeout: Duration::from_secs(15),
            push_capacity: 256,
        }
    }
}
