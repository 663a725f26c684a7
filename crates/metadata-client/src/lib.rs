//! Real-time metadata synchronization client.
//!
//! Keeps beatmap catalogue changes, user presence, the daily challenge and
//! multiplayer room scores in step with the metadata hub. The hub itself is
//! reached through the `MetadataServer` trait; `WsTransport` is the bundled
//! WebSocket implementation.

pub mod catalogue;
pub mod client;
pub mod feed;
pub mod identity;
pub mod presence;
pub mod protocol;
pub mod server;
pub mod sessions;
pub mod transport;

#[cfg(test)]
mod testing;

pub use catalogue::{CatalogueCursor, INITIAL_QUEUE_ID};
pub use client::{ClientOptions, MetadataClient};
pub use feed::{dedup_ids, ChangeFeed};
pub use identity::{Identity, IdentityProvider, SharedIdentity};
pub use presence::{PresenceChange, PresenceRegistry};
pub use protocol::{
    BeatmapUpdates, DailyChallengeInfo, MultiplayerPlaylistItemStats,
    MultiplayerRoomScoreSetEvent, QueueId, RoomId, ServerEvent, UserActivity, UserId,
    UserPresence, UserStatus,
};
pub use server::{ConnectionState, MetadataServer};
pub use sessions::WatchSessions;
pub use transport::{TransportConfig, WsTransport};
