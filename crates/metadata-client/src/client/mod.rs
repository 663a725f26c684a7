//! The metadata client facade.
//!
//! `MetadataClient` owns the presence registry, watch sessions, change feed
//! and catalogue cursor, and fronts a `MetadataServer`. Inbound pushes are
//! applied by a single event pump task in arrival order; outbound calls go
//! straight to the server and update local state around the call.

mod pump;
mod types;


use std::collections::HashMap;
use std::sync::Arc;

use metadata_common::{ConnectionError, MetadataError, Result};
use tokio::sync::{broadcast, mpsc, watch, Mutex, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::catalogue::CatalogueCursor;
use crate::feed::ChangeFeed;
use crate::identity::IdentityProvider;
use crate::presence::{PresenceChange, PresenceRegistry};
use crate::protocol::{
    BeatmapUpdates, DailyChallengeInfo, MultiplayerPlaylistItemStats,
    MultiplayerRoomScoreSetEvent, QueueId, RoomId, ServerEvent, UserActivity, UserId,
    UserPresence, UserStatus,
};
use crate::server::{ConnectionState, MetadataServer};
use crate::sessions::WatchSessions;

pub use types::ClientOptions;

// ---------------------------------------------------------------------------
// Shared state
// ---------------------------------------------------------------------------

pub(crate) struct Inner {
    server: Arc<dyn MetadataServer>,
    identity: Arc<dyn IdentityProvider>,
    state: watch::Receiver<ConnectionState>,
    presence: RwLock<PresenceRegistry>,
    sessions: Mutex<WatchSessions>,
    watching_presence: watch::Receiver<bool>,
    /// Serializes begin/end of presence watching across the server call.
    presence_gate: Mutex<()>,
    feed: ChangeFeed,
    cursor: CatalogueCursor,
}

impl Inner {
    fn publish(&self, change: Option<PresenceChange>) {
        if let Some(change) = change {
            self.feed.presence_changed(change);
        }
    }
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

pub struct MetadataClient {
    inner: Arc<Inner>,
    pump: Option<JoinHandle<()>>,
}

impl MetadataClient {
    pub fn new(
        server: Arc<dyn MetadataServer>,
        identity: Arc<dyn IdentityProvider>,
        options: ClientOptions,
    ) -> Self {
        let sessions = WatchSessions::new();
        let watching_presence = sessions.subscribe_presence();
        let state = server.connection_state();

        let inner = Inner {
            server,
            identity,
            state,
            presence: RwLock::new(PresenceRegistry::new()),
            sessions: Mutex::new(sessions),
            watching_presence,
            presence_gate: Mutex::new(()),
            feed: ChangeFeed::new(options.event_capacity),
            cursor: CatalogueCursor::new(options.initial_queue_id),
        };

        Self {
            inner: Arc::new(inner),
            pump: None,
        }
    }

    /// Start applying pushes from `events` on a background task.
    pub fn start(&mut self, events: mpsc::Receiver<ServerEvent>) {
        if self.pump.as_ref().is_some_and(|pump| !pump.is_finished()) {
            warn!("event pump already running; ignoring second start");
            return;
        }

        let inner = Arc::clone(&self.inner);
        let state = self.inner.server.connection_state();
        self.pump = Some(tokio::spawn(pump::run(inner, events, state)));
        debug!("event pump started");
    }

    /// Apply one push. This is the same mutation point the event pump uses.
    pub async fn handle_event(&self, event: ServerEvent) {
        self.inner.apply(event).await;
    }

    // -- connectivity ----------------------------------------------------

    pub fn is_connected(&self) -> bool {
        self.inner.state.borrow().is_connected()
    }

    pub fn connection_state(&self) -> watch::Receiver<ConnectionState> {
        self.inner.state.clone()
    }

    pub fn is_watching_user_presence(&self) -> bool {
        *self.inner.watching_presence.borrow()
    }

    pub fn watch_user_presence_watching(&self) -> watch::Receiver<bool> {
        self.inner.watching_presence.clone()
    }

    // -- presence --------------------------------------------------------

    /// Resolve a user's presence: local user, then friends, then everyone else.
    pub async fn get_presence(&self, user_id: UserId) -> Option<UserPresence> {
        let local_user_id = self.inner.identity.local_user_id();
        self.inner
            .presence
            .read()
            .await
            .get_presence(user_id, local_user_id)
            .cloned()
    }

    pub async fn local_user_state(&self) -> UserPresence {
        self.inner.presence.read().await.local().clone()
    }

    pub async fn friend_states(&self) -> HashMap<UserId, UserPresence> {
        self.inner.presence.read().await.friends().clone()
    }

    pub async fn user_states(&self) -> HashMap<UserId, UserPresence> {
        self.inner.presence.read().await.users().clone()
    }

    // -- notifications ---------------------------------------------------

    pub fn daily_challenge(&self) -> Option<DailyChallengeInfo> {
        self.inner.feed.daily_challenge()
    }

    pub fn watch_daily_challenge(&self) -> watch::Receiver<Option<DailyChallengeInfo>> {
        self.inner.feed.watch_daily_challenge()
    }

    pub fn subscribe_beatmap_sets(&self) -> broadcast::Receiver<Vec<i32>> {
        self.inner.feed.subscribe_beatmap_sets()
    }

    pub fn subscribe_room_scores(&self) -> broadcast::Receiver<MultiplayerRoomScoreSetEvent> {
        self.inner.feed.subscribe_room_scores()
    }

    pub fn subscribe_disconnecting(&self) -> broadcast::Receiver<()> {
        self.inner.feed.subscribe_disconnecting()
    }

    pub fn subscribe_presence(&self) -> broadcast::Receiver<PresenceChange> {
        self.inner.feed.subscribe_presence()
    }

    pub async fn watched_rooms(&self) -> Vec<RoomId> {
        self.inner.sessions.lock().await.watched_rooms()
    }

    // -- catalogue -------------------------------------------------------

    pub async fn get_changes_since(&self, queue_id: QueueId) -> Result<BeatmapUpdates> {
        Ok(self.inner.server.get_changes_since(queue_id).await?)
    }

    pub async fn beatmap_sets_updated(&self, updates: BeatmapUpdates) -> Result<()> {
        Ok(self.inner.server.beatmap_sets_updated(updates).await?)
    }

    /// Pull and acknowledge every pending catalogue change, publishing each
    /// batch to beatmap set subscribers. Returns the new cursor.
    pub async fn catch_up_beatmap_changes(&self) -> Result<QueueId> {
        let inner = &self.inner;
        Ok(inner
            .cursor
            .catch_up(inner.server.as_ref(), &inner.feed)
            .await?)
    }

    pub async fn queue_id(&self) -> QueueId {
        self.inner.cursor.get().await
    }

    // -- local presence --------------------------------------------------

    /// Set the local activity, then tell the hub. The local value stands
    /// whether or not the hub accepts it.
    pub async fn update_activity(&self, activity: Option<UserActivity>) -> Result<()> {
        let change = self
            .inner
            .presence
            .write()
            .await
            .set_local_activity(activity.clone());
        self.inner.publish(change);

        Ok(self.inner.server.update_activity(activity).await?)
    }

    pub async fn update_status(&self, status: Option<UserStatus>) -> Result<()> {
        let change = self.inner.presence.write().await.set_local_status(status);
        self.inner.publish(change);

        Ok(self.inner.server.update_status(status).await?)
    }

    // -- watching --------------------------------------------------------

    pub async fn begin_watching_user_presence(&self) -> Result<()> {
        let _gate = self.inner.presence_gate.lock().await;
        if self.is_watching_user_presence() {
            debug!("already watching user presence");
            return Ok(());
        }

        let epoch = self.inner.sessions.lock().await.epoch();
        self.inner.server.begin_watching_user_presence().await?;

        // A connection drop while the call was in flight voids the
        // subscription even if the hub acknowledged it.
        let confirmed = self.is_connected()
            && self
                .inner
                .sessions
                .lock()
                .await
                .confirm_watching_presence(epoch);
        if !confirmed {
            warn!("connection lost while beginning presence watch");
            return Err(ConnectionError::Closed.into());
        }
        info!("watching user presence");
        Ok(())
    }

    /// Stop watching. On success the general presence tier is emptied, since
    /// the hub stops sending updates for it.
    pub async fn end_watching_user_presence(&self) -> Result<()> {
        let _gate = self.inner.presence_gate.lock().await;
        if !self.is_watching_user_presence() {
            debug!("not watching user presence");
            return Ok(());
        }

        self.inner.server.end_watching_user_presence().await?;
        self.inner.sessions.lock().await.set_watching_presence(false);

        let removed = self.inner.presence.write().await.clear_users();
        for change in removed {
            self.inner.feed.presence_changed(change);
        }
        info!("stopped watching user presence");
        Ok(())
    }

    /// Watch a room and return its current per-item stats.
    ///
    /// The room is registered before the hub is asked for the snapshot, so
    /// no score event is lost in between. If the watch is ended before the
    /// snapshot arrives, the snapshot is discarded and
    /// `MetadataError::WatchEnded` is returned.
    pub async fn begin_watching_multiplayer_room(
        &self,
        room_id: RoomId,
    ) -> Result<Vec<MultiplayerPlaylistItemStats>> {
        let generation = self.inner.sessions.lock().await.reserve_room(room_id);

        match self.inner.server.begin_watching_multiplayer_room(room_id).await {
            Ok(stats) => {
                let applied = self
                    .inner
                    .sessions
                    .lock()
                    .await
                    .complete_room(room_id, generation);
                if !applied {
                    debug!(room_id, "room watch ended before snapshot arrived");
                    return Err(MetadataError::WatchEnded(room_id));
                }
                info!(room_id, items = stats.len(), "watching multiplayer room");
                Ok(stats)
            }
            Err(e) => {
                self.inner
                    .sessions
                    .lock()
                    .await
                    .abandon_room(room_id, generation);
                warn!(room_id, error = %e, "failed to begin watching room");
                Err(e.into())
            }
        }
    }

    /// Stop delivering score events for `room_id`, then tell the hub.
    pub async fn end_watching_multiplayer_room(&self, room_id: RoomId) -> Result<()> {
        if !self.inner.sessions.lock().await.end_room(room_id) {
            debug!(room_id, "room was not being watched");
            return Ok(());
        }

        self.inner.server.end_watching_multiplayer_room(room_id).await?;
        info!(room_id, "stopped watching multiplayer room");
        Ok(())
    }

    // -- lifecycle -------------------------------------------------------

    /// Stop the event pump, end outstanding watches and clear all state.
    ///
    /// Failures to end watches are logged; the local state is torn down
    /// regardless.
    pub async fn shutdown(&mut self) {
        if let Some(pump) = self.pump.take() {
            pump.abort();
        }

        let (rooms, presence) = {
            let sessions = self.inner.sessions.lock().await;
            (sessions.watched_rooms(), sessions.is_watching_presence())
        };

        if self.is_connected() {
            for room_id in rooms {
                if let Err(e) = self.inner.server.end_watching_multiplayer_room(room_id).await {
                    debug!(room_id, error = %e, "failed to end room watch on shutdown");
                }
            }
            if presence {
                if let Err(e) = self.inner.server.end_watching_user_presence().await {
                    debug!(error = %e, "failed to end presence watch on shutdown");
                }
            }
        }

        self.inner.sessions.lock().await.invalidate();
        self.inner.presence.write().await.clear();
        self.inner.feed.daily_challenge_updated(None);
        info!("metadata client shut down");
    }
}

impl Drop for MetadataClient {
    fn drop(&mut self) {
        if let Some(pump) = self.pump.take() {
            pump.abort();
        }
    }
}

impl std::fmt::Debug for MetadataClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MetadataClient")
            .field("state", &*self.inner.state.borrow())
            .field("watching_presence", &self.is_watching_user_presence())
            .field("pump_running", &self.pump.is_some())
            .finish()
    }
}
