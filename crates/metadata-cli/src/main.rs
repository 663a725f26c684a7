//! metadata-cli: follow the metadata hub from a terminal.
//!
//! Connects over WebSocket, catches up on catalogue changes and saves the
//! cursor, optionally watches user presence and multiplayer rooms, and logs
//! every push until interrupted or the hub asks us to leave.

mod monitor;
mod settings;

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use metadata_client::{Identity, MetadataClient, RoomId, SharedIdentity, UserId, WsTransport};
use metadata_common::MetadataError;
use metadata_config::{
    default_config_path, load_default, load_from_path, save_queue_id, MetadataConfig,
};
use tracing::{error, info, warn};

#[derive(Parser, Debug)]
#[command(
    name = "metadata-cli",
    about = "Follow beatmap, presence and room updates from the metadata hub"
)]
pub(crate) struct Args {
    /// Config file to use instead of the platform default.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Hub WebSocket URL, overriding `server.url`.
    #[arg(long)]
    url: Option<String>,

    /// Bearer token, overriding `server.access_token`.
    #[arg(long)]
    access_token: Option<String>,

    /// Id of the logged-in user, used to resolve their own presence.
    #[arg(long)]
    user_id: Option<UserId>,

    /// Watch presence of every online user.
    #[arg(long)]
    watch_presence: bool,

    /// Watch score events of a multiplayer room. Repeatable.
    #[arg(long = "room", value_name = "ROOM_ID")]
    rooms: Vec<RoomId>,

    /// Skip the catalogue catch-up on start.
    #[arg(long)]
    no_catch_up: bool,

    /// Print the effective config as JSON and exit.
    #[arg(long)]
    print_config: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    let (mut config, config_path) = match load(&args) {
        Ok(loaded) => loaded,
        Err(e) => {
            eprintln!("metadata-cli: {e}");
            return ExitCode::FAILURE;
        }
    };
    settings::apply_overrides(&mut config, &args);

    if args.print_config {
        println!("{}", metadata_config::config_to_json(&config));
        return ExitCode::SUCCESS;
    }

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.logging.filter.as_str().into()),
        )
        .with_ansi(config.logging.ansi)
        .init();

    if let Err(e) = metadata_config::validation::validate(&config) {
        error!(error = %e, "invalid configuration");
        return ExitCode::FAILURE;
    }

    match run(config, config_path, &args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "metadata-cli failed");
            ExitCode::FAILURE
        }
    }
}

fn load(args: &Args) -> Result<(MetadataConfig, PathBuf), MetadataError> {
    match &args.config {
        Some(path) => Ok((load_from_path(path)?, path.clone())),
        None => Ok((load_default()?, default_config_path()?)),
    }
}

async fn run(
    config: MetadataConfig,
    config_path: PathBuf,
    args: &Args,
) -> Result<(), MetadataError> {
    let identity = SharedIdentity::new(args.user_id.map(|id| Identity::new(id, "local")));

    let (transport, pushes) = WsTransport::connect(settings::transport_config(&config)).await?;
    let transport = Arc::new(transport);

    let mut client = MetadataClient::new(
        transport.clone(),
        Arc::new(identity),
        settings::client_options(&config),
    );
    let monitors = monitor::spawn(&client);
    let mut disconnecting = client.subscribe_disconnecting();
    let mut state = client.connection_state();
    client.start(pushes);

    if config.client.catch_up_on_start {
        let queue_id = client.catch_up_beatmap_changes().await?;
        if let Err(e) = save_queue_id(&config_path, queue_id) {
            warn!(error = %e, "failed to save catalogue cursor");
        }
    }

    if config.client.watch_presence_on_start {
        if let Err(e) = client.begin_watching_user_presence().await {
            warn!(error = %e, "could not watch user presence");
        }
    }

    for &room_id in &args.rooms {
        match client.begin_watching_multiplayer_room(room_id).await {
            Ok(stats) => info!(room_id, items = stats.len(), "room snapshot received"),
            Err(e) => warn!(room_id, error = %e, "could not watch room"),
        }
    }

    tokio::select! {
        _ = tokio::signal::ctrl_c() => info!("interrupted"),
        _ = disconnecting.recv() => info!("hub requested disconnect"),
        _ = state.wait_for(|s| !s.is_connected()) => warn!("connection lost"),
    }

    client.shutdown().await;
    transport.disconnect().await;
    for handle in monitors {
        handle.abort();
    }
    Ok(())
}
