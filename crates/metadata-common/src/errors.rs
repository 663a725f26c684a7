use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("config file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("config parse error: {0}")]
    ParseError(String),

    #[error("config validation error: {0}")]
    ValidationError(String),
}

/// Failure of a single outbound call. Never fatal to the client.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConnectionError {
    #[error("not connected to the metadata server")]
    NotConnected,

    #[error("connection closed")]
    Closed,

    #[error("call timed out")]
    Timeout,

    #[error("transport error: {0}")]
    Transport(String),

    #[error("server rejected call: {0}")]
    Rejected(String),
}

/// A push or frame the client could not make sense of. The offending
/// message is dropped; client state is left untouched.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    #[error("unknown method: {0}")]
    UnknownMethod(String),

    #[error("malformed payload for {method}: {reason}")]
    MalformedPayload { method: String, reason: String },

    #[error("unexpected frame: {0}")]
    UnexpectedFrame(String),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, thiserror::Error)]
pub enum MetadataError {
    #[error(transparent)]
    Connection(#[from] ConnectionError),

    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("watch of room {0} ended before its snapshot arrived")]
    WatchEnded(i64),

    #[error("{0}")]
    Other(String),
}

impl MetadataError {
    /// Returns `true` if the failure came from the transport rather than
    /// from local state.
    pub fn is_connection(&self) -> bool {
        matches!(self, Self::Connection(_))
    }
}
