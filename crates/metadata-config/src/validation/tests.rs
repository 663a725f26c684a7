use super::*;

#[test]
fn default_config_is_valid() {
    assert!(validate(&MetadataConfig::default()).is_ok());
}

#[test]
fn empty_url_rejected() {
    let mut config = MetadataConfig::default();
    config.server.url = "  ".into();
    let err = validate(&config).unwrap_err();
    assert!(err.to_string().contains("server.url must not be empty"));
}

#[test]
fn http_url_rejected() {
    let mut config = MetadataConfig::default();
    config.server.url = "https://example.com/metadata".into();
    let err = validate(&config).unwrap_err();
    assert!(err.to_string().contains("ws:// or wss://"));
}

#[test]
fn timeout_out_of_range() {
    let mut config = MetadataConfig::default();
    config.server.invoke_timeout_ms = 10;
    let err = validate(&config).unwrap_err();
    assert!(err
        .to_string()
        .contains("server.invoke_timeout_ms = 10 is out of range [100, 120000]"));
}

#[test]
fn zero_capacity_rejected() {
    let mut config = MetadataConfig::default();
    config.client.event_capacity = 0;
    assert!(validate(&config).is_err());
}

#[test]
fn errors_are_collected() {
    let mut config = MetadataConfig::default();
    config.server.url = String::new();
    config.server.connect_timeout_secs = 0;
    config.logging.filter = String::new();

    let msg = validate(&config).unwrap_err().to_string();
    assert_eq!(msg.matches("; ").count(), 2);
}
