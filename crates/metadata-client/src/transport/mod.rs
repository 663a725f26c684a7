//! WebSocket transport for the metadata hub.
//!
//! Speaks a small JSON framing over `tokio-tungstenite`: the client sends
//! `invoke` frames and waits for the matching `completion`; the hub sends
//! `push` frames at any time. Reconnection is left to the host.

mod client;
mod connection;
mod envelope;
mod types;


pub use client::WsTransport;
pub use envelope::Frame;
pub use types::TransportConfig;
