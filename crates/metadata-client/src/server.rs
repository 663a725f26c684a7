//! The transport boundary.
//!
//! `MetadataServer` is everything the client needs from a live hub
//! connection. The WebSocket transport in `transport` is one implementation;
//! tests use an in-process mock.

use async_trait::async_trait;
use metadata_common::ConnectionError;
use tokio::sync::watch;

use crate::protocol::{
    BeatmapUpdates, MultiplayerPlaylistItemStats, QueueId, RoomId, UserActivity, UserStatus,
};

/// Connectivity of the underlying hub connection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connecting,
    Connected,
    Disconnecting,
}

impl ConnectionState {
    pub fn is_connected(self) -> bool {
        self == Self::Connected
    }
}

impl std::fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Disconnected => "disconnected",
            Self::Connecting => "connecting",
            Self::Connected => "connected",
            Self::Disconnecting => "disconnecting",
        };
        f.write_str(name)
    }
}

/// Client-to-server calls of the metadata hub.
///
/// Every call may fail with a `ConnectionError`; none of them is fatal to
/// the client. Timeouts are the implementation's concern.
#[async_trait]
pub trait MetadataServer: Send + Sync {
    /// Observe connectivity transitions.
    fn connection_state(&self) -> watch::Receiver<ConnectionState>;

    async fn get_changes_since(&self, queue_id: QueueId)
        -> Result<BeatmapUpdates, ConnectionError>;

    async fn beatmap_sets_updated(&self, updates: BeatmapUpdates) -> Result<(), ConnectionError>;

    async fn update_activity(&self, activity: Option<UserActivity>)
        -> Result<(), ConnectionError>;

    async fn update_status(&self, status: Option<UserStatus>) -> Result<(), ConnectionError>;

    async fn begin_watching_user_presence(&self) -> Result<(), ConnectionError>;

    async fn end_watching_user_presence(&self) -> Result<(), ConnectionError>;

    async fn begin_watching_multiplayer_room(
        &self,
        room_id: RoomId,
    ) -> Result<Vec<MultiplayerPlaylistItemStats>, ConnectionError>;

    async fn end_watching_multiplayer_room(&self, room_id: RoomId) -> Result<(), ConnectionError>;
}
