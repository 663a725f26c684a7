//! Background task that applies server pushes to client state.

use std::sync::Arc;

use tokio::sync::{mpsc, watch};
use tracing::{debug, info, trace};

use crate::protocol::ServerEvent;
use crate::server::ConnectionState;

use super::Inner;

// ---------------------------------------------------------------------------
// Event Pump
// ---------------------------------------------------------------------------

/// Apply pushes in arrival order and drop watches whenever the connection
/// leaves `Connected`. Runs until the push channel closes.
pub(super) async fn run(
    inner: Arc<Inner>,
    mut events: mpsc::Receiver<ServerEvent>,
    mut state: watch::Receiver<ConnectionState>,
) {
    let mut connected = state.borrow_and_update().is_connected();
    let mut state_open = true;

    loop {
        tokio::select! {
            biased;

            event = events.recv() => match event {
                Some(event) => inner.apply(event).await,
                None => {
                    info!("push channel closed; event pump stopping");
                    break;
                }
            },

            changed = state.changed(), if state_open => {
                if changed.is_err() {
                    debug!("connection state sender dropped");
                    state_open = false;
                    continue;
                }

                let now = *state.borrow_and_update();
                debug!(state = %now, "connection state changed");
                if connected && !now.is_connected() {
                    inner.connection_lost().await;
                }
                connected = now.is_connected();
            }
        }
    }
}

impl Inner {
    pub(super) async fn apply(&self, event: ServerEvent) {
        trace!(method = event.method(), "push received");

        match event {
            ServerEvent::BeatmapSetsChanged { beatmap_set_ids } => {
                self.feed.beatmap_sets_changed(&beatmap_set_ids);
            }
            ServerEvent::UserPresenceUpdated { user_id, presence } => {
                let change = self.presence.write().await.upsert_general(user_id, presence);
                self.publish(change);
            }
            ServerEvent::FriendPresenceUpdated { user_id, presence } => {
                let change = self.presence.write().await.upsert_friend(user_id, presence);
                self.publish(change);
            }
            ServerEvent::DailyChallengeUpdated(info) => {
                debug!(room_id = ?info.map(|i| i.room_id), "daily challenge updated");
                self.feed.daily_challenge_updated(info);
            }
            ServerEvent::MultiplayerRoomScoreSet(event) => {
                if self.sessions.lock().await.is_watching_room(event.room_id) {
                    self.feed.room_score_set(event);
                } else {
                    debug!(room_id = event.room_id, "score for unwatched room dropped");
                }
            }
            ServerEvent::DisconnectRequested => {
                info!("server requested disconnect");
                self.feed.disconnecting();
            }
        }
    }

    /// Every watch is void once the connection drops. Presence data is kept
    /// until it is overwritten or the client shuts down.
    pub(super) async fn connection_lost(&self) {
        let dropped = self.sessions.lock().await.invalidate();
        if !dropped.is_empty() {
            info!(
                presence = dropped.presence,
                rooms = ?dropped.rooms,
                "connection lost; watches invalidated"
            );
        }
    }
}
