//! Default TOML config template with inline documentation comments.

/// Generate the default TOML config content with comments.
pub(crate) fn default_config_toml() -> String {
    r##"# Metadata client configuration
# Schema version 1
# Only override what you want to change -- missing fields use defaults.

[server]
# url = "wss://spectator.ppy.sh/metadata"
# access_token = "..."
# invoke_timeout_ms = 15000   # 100-120000
# connect_timeout_secs = 15   # 1-120

[client]
# event_capacity = 256        # 1-65536
# catch_up_on_start = true
# watch_presence_on_start = false

[catalogue]
# Cursor into the beatmap change feed. Updated by the client after a catch-up.
last_queue_id = -1

[logging]
# filter = "metadata_client=info,metadata_cli=info"
# ansi = true
"##
    .to_string()
}
