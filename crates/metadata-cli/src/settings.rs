//! Maps the on-disk config and command-line overrides onto client and
//! transport options.

use std::time::Duration;

use metadata_client::{ClientOptions, TransportConfig};
use metadata_config::MetadataConfig;

use crate::Args;

/// Fold command-line overrides into the loaded config.
pub(crate) fn apply_overrides(config: &mut MetadataConfig, args: &Args) {
    if let Some(url) = &args.url {
        config.server.url = url.clone();
    }
    if let Some(token) = &args.access_token {
        config.server.access_token = Some(token.clone());
    }
    if args.watch_presence {
        config.client.watch_presence_on_start = true;
    }
    if args.no_catch_up {
        config.client.catch_up_on_start = false;
    }
}

pub(crate) fn transport_config(config: &MetadataConfig) -> TransportConfig {
    TransportConfig {
        url: config.server.url.clone(),
        access_token: config.server.access_token.clone(),
        connect_timeout: Duration::from_secs(config.server.connect_timeout_secs),
        invoke_timeout: Duration::from_millis(config.server.invoke_timeout_ms),
        push_capacity: config.client.event_capacity,
    }
}

pub(crate) fn client_options(config: &MetadataConfig) -> ClientOptions {
    ClientOptions {
        event_capacity: config.client.event_capacity,
        initial_queue_id: config.catalogue.last_queue_id,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn overrides_replace_config_values() {
        let args = Args::parse_from([
            "metadata-cli",
            "--url",
            "ws://localhost:9000/metadata",
            "--watch-presence",
            "--no-catch-up",
        ]);
        let mut config = MetadataConfig::default();

        apply_overrides(&mut config, &args);

        assert_eq!(config.server.url, "ws://localhost:9000/metadata");
        assert!(config.client.watch_presence_on_start);
        assert!(!config.client.catch_up_on_start);
    }

    #[test]
    fn no_flags_keep_config() {
        let args = Args::parse_from(["metadata-cli"]);
        let mut config = MetadataConfig::default();
        config.client.watch_presence_on_start = true;

        apply_overrides(&mut config, &args);

        assert!(config.client.watch_presence_on_start);
        assert!(config.client.catch_up_on_start);
    }

    #[test]
    fn transport_config_uses_server_section() {
        let mut config = MetadataConfig::default();
        config.server.invoke_timeout_ms = 2_500;
        config.server.connect_timeout_secs = 3;
        config.server.access_token = Some("token".into());

        let transport = transport_config(&config);

        assert_eq!(transport.invoke_timeout, Duration::from_millis(2_500));
        assert_eq!(transport.connect_timeout, Duration::from_secs(3));
        assert_eq!(transport.access_token.as_deref(), Some("token"));
    }

    #[test]
    fn client_options_resume_from_saved_cursor() {
        let mut config = MetadataConfig::default();
        config.catalogue.last_queue_id = 812;
        config.client.event_capacity = 32;

        let options = client_options(&config);

        assert_eq!(options.initial_queue_id, 812);
        assert_eq!(options.event_capacity, 32);
    }

    #[test]
    fn rooms_are_repeatable() {
        let args = Args::parse_from(["metadata-cli", "--room", "10", "--room", "20"]);
        assert_eq!(args.rooms, vec![10, 20]);
    }
}
