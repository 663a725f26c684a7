//! In-process `MetadataServer` that records every call.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use metadata_common::ConnectionError;
use tokio::sync::{watch, Notify};

use crate::protocol::{
    methods, BeatmapUpdates, MultiplayerPlaylistItemStats, QueueId, RoomId, UserActivity,
    UserStatus,
};
use crate::server::{ConnectionState, MetadataServer};

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Call {
    GetChangesSince(QueueId),
    BeatmapSetsUpdated(BeatmapUpdates),
    UpdateActivity(Option<UserActivity>),
    UpdateStatus(Option<UserStatus>),
    BeginWatchingUserPresence,
    EndWatchingUserPresence,
    BeginWatchingMultiplayerRoom(RoomId),
    EndWatchingMultiplayerRoom(RoomId),
}

pub(crate) struct MockServer {
    state: watch::Sender<ConnectionState>,
    calls: Mutex<Vec<Call>>,
    changes: Mutex<VecDeque<BeatmapUpdates>>,
    failures: Mutex<HashMap<&'static str, ConnectionError>>,
    room_stats: Mutex<HashMap<RoomId, Vec<MultiplayerPlaylistItemStats>>>,
    held: Mutex<HashMap<&'static str, Arc<Notify>>>,
}

impl MockServer {
    pub(crate) fn new() -> Self {
        let (state, _) = watch::channel(ConnectionState::Connected);
        Self {
            state,
            calls: Mutex::new(Vec::new()),
            changes: Mutex::new(VecDeque::new()),
            failures: Mutex::new(HashMap::new()),
            room_stats: Mutex::new(HashMap::new()),
            held: Mutex::new(HashMap::new()),
        }
    }

    pub(crate) fn set_state(&self, state: ConnectionState) {
        self.state.send_replace(state);
    }

    pub(crate) fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub(crate) fn count(&self, call: &Call) -> usize {
        self.calls.lock().unwrap().iter().filter(|c| *c == call).count()
    }

    /// Queue a batch for `get_changes_since`. With nothing queued the mock
    /// answers with an empty batch at the requested cursor.
    pub(crate) fn queue_changes(&self, updates: BeatmapUpdates) {
        self.changes.lock().unwrap().push_back(updates);
    }

    /// Fail the next call of `method` with `err`.
    pub(crate) fn fail_next(&self, method: &'static str, err: ConnectionError) {
        self.failures.lock().unwrap().insert(method, err);
    }

    pub(crate) fn set_room_stats(&self, room_id: RoomId, stats: Vec<MultiplayerPlaylistItemStats>) {
        self.room_stats.lock().unwrap().insert(room_id, stats);
    }

    /// Hold calls of `method` until the returned handle is notified.
    pub(crate) fn hold(&self, method: &'static str) -> Arc<Notify> {
        let notify = Arc::new(Notify::new());
        self.held.lock().unwrap().insert(method, Arc::clone(&notify));
        notify
    }

    /// Yield until `call` has been recorded.
    pub(crate) async fn wait_for(&self, call: &Call) {
        self.wait_for_count(call, 1).await;
    }

    /// Yield until `call` has been recorded at least `times` times.
    pub(crate) async fn wait_for_count(&self, call: &Call, times: usize) {
        for _ in 0..1000 {
            if self.count(call) >= times {
                return;
            }
            tokio::task::yield_now().await;
        }
        panic!("call made fewer than {times} times: {call:?}");
    }

    async fn record(&self, method: &'static str, call: Call) -> Result<(), ConnectionError> {
        self.calls.lock().unwrap().push(call);

        let held = self.held.lock().unwrap().remove(method);
        if let Some(notify) = held {
            notify.notified().await;
        }

        match self.failures.lock().unwrap().remove(method) {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl MetadataServer for MockServer {
    fn connection_state(&self) -> watch::Receiver<ConnectionState> {
        self.state.subscribe()
    }

    async fn get_changes_since(
        &self,
        queue_id: QueueId,
    ) -> Result<BeatmapUpdates, ConnectionError> {
        self.record(methods::GET_CHANGES_SINCE, Call::GetChangesSince(queue_id))
            .await?;
        let next = self.changes.lock().unwrap().pop_front();
        Ok(next.unwrap_or(BeatmapUpdates {
            queue_id,
            beatmap_set_ids: Vec::new(),
        }))
    }

    async fn beatmap_sets_updated(&self, updates: BeatmapUpdates) -> Result<(), ConnectionError> {
        self.record(methods::BEATMAP_SETS_UPDATED, Call::BeatmapSetsUpdated(updates))
            .await
    }

    async fn update_activity(
        &self,
        activity: Option<UserActivity>,
    ) -> Result<(), ConnectionError> {
        self.record(methods::UPDATE_ACTIVITY, Call::UpdateActivity(activity))
            .await
    }

    async fn update_status(&self, status: Option<UserStatus>) -> Result<(), ConnectionError> {
        self.record(methods::UPDATE_STATUS, Call::UpdateStatus(status))
            .await
    }

    async fn begin_watching_user_presence(&self) -> Result<(), ConnectionError> {
        self.record(
            methods::BEGIN_WATCHING_USER_PRESENCE,
            Call::BeginWatchingUserPresence,
        )
        .await
    }

    async fn end_watching_user_presence(&self) -> Result<(), ConnectionError> {
        self.record(
            methods::END_WATCHING_USER_PRESENCE,
            Call::EndWatchingUserPresence,
        )
        .await
    }

    async fn begin_watching_multiplayer_room(
        &self,
        room_id: RoomId,
    ) -> Result<Vec<MultiplayerPlaylistItemStats>, ConnectionError> {
        self.record(
            methods::BEGIN_WATCHING_MULTIPLAYER_ROOM,
            Call::BeginWatchingMultiplayerRoom(room_id),
        )
        .await?;
        Ok(self
            .room_stats
            .lock()
            .unwrap()
            .get(&room_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn end_watching_multiplayer_room(&self, room_id: RoomId) -> Result<(), ConnectionError> {
        self.record(
            methods::END_WATCHING_MULTIPLAYER_ROOM,
            Call::EndWatchingMultiplayerRoom(room_id),
        )
        .await
    }
}
