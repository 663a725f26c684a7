//! Configuration validation.
//!
//! Checks numeric ranges and URL shape, collecting every problem into a
//! single `ConfigError`.

#[cfg(test)]
mod tests;

use crate::schema::MetadataConfig;
use metadata_common::ConfigError;

/// Run all validations on a config, collecting all errors.
pub fn validate(config: &MetadataConfig) -> Result<(), ConfigError> {
    let mut errors: Vec<String> = Vec::new();

    validate_server(&mut errors, config);
    validate_client(&mut errors, config);
    validate_logging(&mut errors, config);

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ConfigError::ValidationError(errors.join("; ")))
    }
}

/// Push an error if `value` is outside `[min, max]`.
fn validate_range(errors: &mut Vec<String>, name: &str, value: u64, min: u64, max: u64) {
    if value < min || value > max {
        errors.push(format!("{name} = {value} is out of range [{min}, {max}]"));
    }
}

fn validate_server(errors: &mut Vec<String>, config: &MetadataConfig) {
    let url = config.server.url.trim();
    if url.is_empty() {
        errors.push("server.url must not be empty".into());
    } else if !(url.starts_with("ws://") || url.starts_with("wss://")) {
        errors.push(format!("server.url = {url} must use ws:// or wss://"));
    }

    validate_range(
        errors,
        "server.invoke_timeout_ms",
        config.server.invoke_timeout_ms,
        100,
        120_000,
    );
    validate_range(
        errors,
        "server.connect_timeout_secs",
        config.server.connect_timeout_secs,
        1,
        120,
    );
}

fn validate_client(errors: &mut Vec<String>, config: &MetadataConfig) {
    validate_range(
        errors,
        "client.event_capacity",
        config.client.event_capacity as u64,
        1,
        65_536,
    );
}

fn validate_logging(errors: &mut Vec<String>, config: &MetadataConfig) {
    if config.logging.filter.trim().is_empty() {
        errors.push("logging.filter must not be empty".into());
    }
}
