//! Write MetadataConfig to TOML on disk.
//!
//! Writes go to a `.tmp` sibling first and are renamed into place, so a
//! crash mid-write never leaves a truncated config behind.

use std::path::Path;

use metadata_common::ConfigError;

use crate::schema::MetadataConfig;
use crate::toml_loader::default_config_path;

/// Write config to the platform default path.
pub fn save_config(config: &MetadataConfig) -> Result<(), ConfigError> {
    let path = default_config_path()?;
    save_config_to_path(config, &path)
}

/// Write config to a specific path, creating parent directories as needed.
pub fn save_config_to_path(config: &MetadataConfig, path: &Path) -> Result<(), ConfigError> {
    let toml_str = toml::to_string_pretty(config)
        .map_err(|e| ConfigError::ParseError(format!("failed to serialize config to TOML: {e}")))?;

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| {
            ConfigError::ParseError(format!(
                "failed to create config directory {}: {e}",
                parent.display()
            ))
        })?;
    }

    let tmp_path = path.with_extension("toml.tmp");
    std::fs::write(&tmp_path, &toml_str).map_err(|e| {
        ConfigError::ParseError(format!(
            "failed to write config to {}: {e}",
            tmp_path.display()
        ))
    })?;

    if let Err(e) = std::fs::rename(&tmp_path, path) {
        let _ = std::fs::remove_file(&tmp_path);
        return Err(ConfigError::ParseError(format!(
            "failed to move config into place at {}: {e}",
            path.display()
        )));
    }

    tracing::debug!(path = %path.display(), "config saved to disk");
    Ok(())
}

/// Persist only the catalogue cursor, keeping everything else on disk as-is.
pub fn save_queue_id(path: &Path, queue_id: i32) -> Result<(), ConfigError> {
    let mut config = match crate::toml_loader::load_from_path(path) {
        Ok(config) => config,
        Err(ConfigError::FileNotFound(_)) => MetadataConfig::default(),
        Err(e) => return Err(e),
    };
    config.catalogue.last_queue_id = queue_id;
    save_config_to_path(&config, path)
}
