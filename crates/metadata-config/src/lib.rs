//! Metadata client configuration.
//!
//! TOML-based configuration with a documented default template and
//! validation. All sections use sensible defaults so partial configs
//! work out of the box.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use metadata_config::{load_config, config_to_json};
//!
//! let config = load_config().expect("failed to load config");
//! println!("{}", config_to_json(&config));
//! ```

pub mod schema;
pub mod toml_loader;
pub mod toml_writer;
pub mod validation;

pub use schema::{
    CatalogueConfig, ClientConfig, LoggingConfig, MetadataConfig, ServerConfig, INITIAL_QUEUE_ID,
};
pub use toml_loader::{default_config_path, load_default, load_from_path};
pub use toml_writer::{save_config, save_config_to_path, save_queue_id};

use metadata_common::ConfigError;

/// Load config from the platform default path and validate it.
///
/// Creates a documented default file if none exists.
pub fn load_config() -> Result<MetadataConfig, ConfigError> {
    let config = toml_loader::load_default()?;
    validation::validate(&config)?;
    Ok(config)
}

/// Serialize a config to a pretty-printed JSON string, access token redacted.
pub fn config_to_json(config: &MetadataConfig) -> String {
    let mut redacted = config.clone();
    if redacted.server.access_token.is_some() {
        redacted.server.access_token = Some("[REDACTED]".into());
    }
    serde_json::to_string_pretty(&redacted)
        .unwrap_or_else(|e| format!("{{\"error\": \"failed to serialize config: {e}\"}}"))
}
