//! Configuration schema types.
//!
//! All structs use `serde(default)` so partial configs work correctly.

mod client;
mod server;
mod system;

pub use client::*;
pub use server::*;
pub use system::*;

use serde::{Deserialize, Serialize};

/// Root configuration for the metadata client.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MetadataConfig {
    pub server: ServerConfig,
    pub client: ClientConfig,
    pub catalogue: CatalogueConfig,
    pub logging: LoggingConfig,
}
