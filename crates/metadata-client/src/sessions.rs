//! Watch subscriptions: user-presence watching and per-room score watching.
//!
//! A room watch is reserved before the hub is asked for its snapshot, so
//! score events racing the snapshot reach subscribers. Each reservation
//! carries a generation; a snapshot is only applied if the reservation it
//! was requested under is still the one on record. Concurrent begins for one
//! room share the reservation and count themselves on it, so a failing begin
//! only drops the entry when no other begin is still waiting.
//!
//! `invalidate` bumps an epoch. A presence begin captures the epoch before
//! its server call and only sets the flag if no invalidation happened since.

use std::collections::HashMap;

use tokio::sync::watch;
use tracing::debug;

use crate::protocol::RoomId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct RoomWatch {
    generation: u64,
    active: bool,
    /// Begins still waiting on their snapshot.
    pending: usize,
}

/// What `invalidate` dropped.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct Invalidated {
    pub presence: bool,
    pub rooms: Vec<RoomId>,
}

impl Invalidated {
    pub fn is_empty(&self) -> bool {
        !self.presence && self.rooms.is_empty()
    }
}

#[derive(Debug)]
pub struct WatchSessions {
    presence: watch::Sender<bool>,
    rooms: HashMap<RoomId, RoomWatch>,
    next_generation: u64,
    epoch: u64,
}

impl Default for WatchSessions {
    fn default() -> Self {
        Self::new()
    }
}

impl WatchSessions {
    pub fn new() -> Self {
        let (presence, _) = watch::channel(false);
        Self {
            presence,
            rooms: HashMap::new(),
            next_generation: 1,
            epoch: 0,
        }
    }

    /// Bumped by every `invalidate`.
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    // -- presence --------------------------------------------------------

    pub fn is_watching_presence(&self) -> bool {
        *self.presence.borrow()
    }

    pub fn subscribe_presence(&self) -> watch::Receiver<bool> {
        self.presence.subscribe()
    }

    /// Returns `true` if the flag changed.
    pub fn set_watching_presence(&self, watching: bool) -> bool {
        self.presence.send_if_modified(|current| {
            if *current == watching {
                return false;
            }
            *current = watching;
            true
        })
    }

    /// Set the flag for a begin acknowledged by the hub. Returns `false`
    /// without touching the flag if the sessions were invalidated after
    /// `epoch` was read.
    pub fn confirm_watching_presence(&self, epoch: u64) -> bool {
        if epoch != self.epoch {
            return false;
        }
        self.set_watching_presence(true);
        true
    }

    // -- rooms -----------------------------------------------------------

    /// Reserve a watch for `room_id` and return its generation.
    ///
    /// A room that is already reserved keeps its entry and generation; the
    /// new begin is counted as pending on it.
    pub fn reserve_room(&mut self, room_id: RoomId) -> u64 {
        if let Some(existing) = self.rooms.get_mut(&room_id) {
            debug!(room_id, active = existing.active, "room already watched");
            existing.pending += 1;
            return existing.generation;
        }

        let generation = self.next_generation;
        self.next_generation += 1;
        self.rooms.insert(
            room_id,
            RoomWatch {
                generation,
                active: false,
                pending: 1,
            },
        );
        generation
    }

    /// Mark the reservation active. Returns `false` if it was ended or
    /// replaced in the meantime, in which case the snapshot must be dropped.
    pub fn complete_room(&mut self, room_id: RoomId, generation: u64) -> bool {
        match self.rooms.get_mut(&room_id) {
            Some(watch) if watch.generation == generation => {
                watch.pending = watch.pending.saturating_sub(1);
                watch.active = true;
                true
            }
            _ => false,
        }
    }

    /// Release a begin whose snapshot request failed. The reservation is
    /// dropped only if it never became active and no other begin is still
    /// waiting on it.
    pub fn abandon_room(&mut self, room_id: RoomId, generation: u64) {
        let Some(watch) = self.rooms.get_mut(&room_id) else {
            return;
        };
        if watch.generation != generation {
            return;
        }
        watch.pending = watch.pending.saturating_sub(1);
        if !watch.active && watch.pending == 0 {
            self.rooms.remove(&room_id);
        }
    }

    /// Returns `true` if the room was being watched.
    pub fn end_room(&mut self, room_id: RoomId) -> bool {
        self.rooms.remove(&room_id).is_some()
    }

    /// Whether score events for `room_id` should be delivered.
    pub fn is_watching_room(&self, room_id: RoomId) -> bool {
        self.rooms.contains_key(&room_id)
    }

    /// Every reserved room, pending or active.
    pub fn watched_rooms(&self) -> Vec<RoomId> {
        let mut rooms: Vec<_> = self.rooms.keys().copied().collect();
        rooms.sort_unstable();
        rooms
    }

    /// Forget every subscription. Used when the connection leaves
    /// `Connected`; the host re-establishes watches after reconnecting.
    pub fn invalidate(&mut self) -> Invalidated {
        self.epoch += 1;
        let presence = self.set_watching_presence(false);
        let mut rooms: Vec<_> = self.rooms.drain().map(|(room_id, _)| room_id).collect();
        rooms.sort_unstable();
        Invalidated { presence, rooms }
    }
}
