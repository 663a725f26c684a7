pub mod errors;
pub mod events;

pub use errors::{ConfigError, ConnectionError, MetadataError, ProtocolError};
pub use events::EventBus;

pub type Result<T> = std::result::Result<T, MetadataError>;
