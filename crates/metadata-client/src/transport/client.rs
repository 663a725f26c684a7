//! Public handle for the WebSocket hub connection.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures_util::StreamExt;
use metadata_common::ConnectionError;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tokio::sync::{mpsc, oneshot, watch, Mutex};
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tracing::{debug, info};

use crate::protocol::{
    methods, BeatmapUpdates, MultiplayerPlaylistItemStats, QueueId, RoomId, ServerEvent,
    UserActivity, UserStatus,
};
use crate::server::{ConnectionState, MetadataServer};

use super::connection::{open, reader_loop, writer_loop, PendingCalls};
use super::envelope::Frame;
use super::types::TransportConfig;

// ---------------------------------------------------------------------------
// Transport
// ---------------------------------------------------------------------------

/// A live connection to the metadata hub.
///
/// Calls are multiplexed over one socket; each waits for its own completion
/// frame. When the socket closes every pending call fails with
/// `ConnectionError::Closed` and the state moves to `Disconnected`.
pub struct WsTransport {
    outgoing: mpsc::Sender<WsMessage>,
    pending: PendingCalls,
    state: Arc<watch::Sender<ConnectionState>>,
    next_id: AtomicU64,
    invoke_timeout: Duration,
}

impl WsTransport {
    /// Open the socket and start the background reader and writer.
    /// Returns the transport and the receiver for hub pushes.
    pub async fn connect(
        config: TransportConfig,
    ) -> Result<(Self, mpsc::Receiver<ServerEvent>), ConnectionError> {
        let (state, _) = watch::channel(ConnectionState::Connecting);
        let state = Arc::new(state);

        let stream = match open(&config).await {
            Ok(stream) => stream,
            Err(e) => {
                state.send_replace(ConnectionState::Disconnected);
                return Err(e);
            }
        };

        let (push_tx, push_rx) = mpsc::channel(config.push_capacity.max(1));
        let (outgoing, outgoing_rx) = mpsc::channel(64);
        let pending: PendingCalls = Arc::new(Mutex::new(HashMap::new()));

        let (write, read) = stream.split();
        tokio::spawn(writer_loop(write, outgoing_rx));
        tokio::spawn(reader_loop(
            read,
            Arc::clone(&pending),
            push_tx,
            Arc::clone(&state),
        ));

        state.send_replace(ConnectionState::Connected);
        info!(url = %config.url, "connected to metadata hub");

        let transport = Self {
            outgoing,
            pending,
            state,
            next_id: AtomicU64::new(1),
            invoke_timeout: config.invoke_timeout,
        };
        Ok((transport, push_rx))
    }

    pub fn is_connected(&self) -> bool {
        self.state.borrow().is_connected()
    }

    /// Ask the hub to close the socket. Pending calls fail once it does.
    pub async fn disconnect(&self) {
        if !self.is_connected() {
            return;
        }
        self.state.send_replace(ConnectionState::Disconnecting);
        if self.outgoing.send(WsMessage::Close(None)).await.is_err() {
            self.state.send_replace(ConnectionState::Disconnected);
        }
        info!("disconnecting from metadata hub");
    }

    /// Send one invocation and wait for its completion.
    pub async fn invoke(&self, method: &str, args: Vec<Value>) -> Result<Value, ConnectionError> {
        if !self.is_connected() {
            return Err(ConnectionError::NotConnected);
        }

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let text = Frame::Invoke {
            id,
            method: method.to_string(),
            args,
        }
        .encode()
        .map_err(|e| ConnectionError::Transport(e.to_string()))?;

        let (tx, rx) = oneshot::channel();
        self.pending.lock().await.insert(id, tx);

        // The reader may have drained pending calls between the check above
        // and the insert.
        if !self.is_connected() {
            self.pending.lock().await.remove(&id);
            return Err(ConnectionError::Closed);
        }

        debug!(id, method, "invoking");
        if self.outgoing.send(WsMessage::Text(text.into())).await.is_err() {
            self.pending.lock().await.remove(&id);
            return Err(ConnectionError::Closed);
        }

        match tokio::time::timeout(self.invoke_timeout, rx).await {
            Ok(Ok(outcome)) => outcome,
            Ok(Err(_)) => Err(ConnectionError::Closed),
            Err(_elapsed) => {
                self.pending.lock().await.remove(&id);
                debug!(id, method, "invocation timed out");
                Err(ConnectionError::Timeout)
            }
        }
    }

    async fn invoke_as<T: DeserializeOwned>(
        &self,
        method: &str,
        args: Vec<Value>,
    ) -> Result<T, ConnectionError> {
        let value = self.invoke(method, args).await?;
        serde_json::from_value(value)
            .map_err(|e| ConnectionError::Transport(format!("unexpected {method} result: {e}")))
    }

    async fn invoke_unit(&self, method: &str, args: Vec<Value>) -> Result<(), ConnectionError> {
        self.invoke(method, args).await.map(|_| ())
    }
}

fn arg<T: Serialize>(value: &T) -> Result<Value, ConnectionError> {
    serde_json::to_value(value).map_err(|e| ConnectionError::Transport(e.to_string()))
}

// ---------------------------------------------------------------------------
// MetadataServer
// ---------------------------------------------------------------------------

#[async_trait]
impl MetadataServer for WsTransport {
    fn connection_state(&self) -> watch::Receiver<ConnectionState> {
        self.state.subscribe()
    }

    async fn get_changes_since(
        &self,
        queue_id: QueueId,
    ) -> Result<BeatmapUpdates, ConnectionError> {
        self.invoke_as(methods::GET_CHANGES_SINCE, vec![arg(&queue_id)?])
            .await
    }

    async fn beatmap_sets_updated(&self, updates: BeatmapUpdates) -> Result<(), ConnectionError> {
        self.invoke_unit(methods::BEATMAP_SETS_UPDATED, vec![arg(&updates)?])
            .await
    }

    async fn update_activity(
        &self,
        activity: Option<UserActivity>,
    ) -> Result<(), ConnectionError> {
        self.invoke_unit(methods::UPDATE_ACTIVITY, vec![arg(&activity)?])
            .await
    }

    async fn update_status(&self, status: Option<UserStatus>) -> Result<(), ConnectionError> {
        self.invoke_unit(methods::UPDATE_STATUS, vec![arg(&status)?])
            .await
    }

    async fn begin_watching_user_presence(&self) -> Result<(), ConnectionError> {
        self.invoke_unit(methods::BEGIN_WATCHING_USER_PRESENCE, Vec::new())
            .await
    }

    async fn end_watching_user_presence(&self) -> Result<(), ConnectionError> {
        self.invoke_unit(methods::END_WATCHING_USER_PRESENCE, Vec::new())
            .await
    }

    async fn begin_watching_multiplayer_room(
        &self,
        room_id: RoomId,
    ) -> Result<Vec<MultiplayerPlaylistItemStats>, ConnectionError> {
        self.invoke_as(methods::BEGIN_WATCHING_MULTIPLAYER_ROOM, vec![arg(&room_id)?])
            .await
    }

    async fn end_watching_multiplayer_room(&self, room_id: RoomId) -> Result<(), ConnectionError> {
        self.invoke_unit(methods::END_WATCHING_MULTIPLAYER_ROOM, vec![arg(&room_id)?])
            .await
    }
}

impl std::fmt::Debug for WsTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WsTransport")
            .field("state", &*self.state.borrow())
            .field("invoke_timeout", &self.invoke_timeout)
            .finish()
    }
}
