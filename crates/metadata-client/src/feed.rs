//! Local notification fan-out.
//!
//! One `EventBus` per notification kind plus a `watch` channel for the
//! daily challenge. Subscribers hold `broadcast::Receiver`s; dropping one
//! unsubscribes it.

use std::collections::HashSet;

use metadata_common::EventBus;
use tokio::sync::{broadcast, watch};
use tracing::debug;

use crate::presence::PresenceChange;
use crate::protocol::{DailyChallengeInfo, MultiplayerRoomScoreSetEvent};

#[derive(Debug)]
pub struct ChangeFeed {
    beatmap_sets: EventBus<Vec<i32>>,
    room_scores: EventBus<MultiplayerRoomScoreSetEvent>,
    disconnecting: EventBus<()>,
    presence: EventBus<PresenceChange>,
    daily_challenge: watch::Sender<Option<DailyChallengeInfo>>,
}

impl ChangeFeed {
    pub fn new(capacity: usize) -> Self {
        let (daily_challenge, _) = watch::channel(None);
        Self {
            beatmap_sets: EventBus::new(capacity),
            room_scores: EventBus::new(capacity),
            disconnecting: EventBus::new(capacity),
            presence: EventBus::new(capacity),
            daily_challenge,
        }
    }

    /// Publish a batch of changed beatmap set ids with duplicates removed.
    /// Empty batches are not published.
    pub fn beatmap_sets_changed(&self, ids: &[i32]) -> usize {
        let ids = dedup_ids(ids);
        if ids.is_empty() {
            debug!("empty beatmap set batch skipped");
            return 0;
        }
        self.beatmap_sets.publish(ids)
    }

    pub fn room_score_set(&self, event: MultiplayerRoomScoreSetEvent) -> usize {
        self.room_scores.publish(event)
    }

    pub fn disconnecting(&self) -> usize {
        self.disconnecting.publish(())
    }

    pub fn presence_changed(&self, change: PresenceChange) -> usize {
        self.presence.publish(change)
    }

    /// Overwrite the daily challenge, including with `None`.
    pub fn daily_challenge_updated(&self, info: Option<DailyChallengeInfo>) {
        self.daily_challenge.send_replace(info);
    }

    pub fn daily_challenge(&self) -> Option<DailyChallengeInfo> {
        *self.daily_challenge.borrow()
    }

    pub fn watch_daily_challenge(&self) -> watch::Receiver<Option<DailyChallengeInfo>> {
        self.daily_challenge.subscribe()
    }

    pub fn subscribe_beatmap_sets(&self) -> broadcast::Receiver<Vec<i32>> {
        self.beatmap_sets.subscribe()
    }

    pub fn subscribe_room_scores(&self) -> broadcast::Receiver<MultiplayerRoomScoreSetEvent> {
        self.room_scores.subscribe()
    }

    pub fn subscribe_disconnecting(&self) -> broadcast::Receiver<()> {
        self.disconnecting.subscribe()
    }

    pub fn subscribe_presence(&self) -> broadcast::Receiver<PresenceChange> {
        self.presence.subscribe()
    }
}

/// Remove duplicates, keeping the first occurrence of each id in place.
pub fn dedup_ids(ids: &[i32]) -> Vec<i32> {
    let mut seen = HashSet::with_capacity(ids.len());
    ids.iter().copied().filter(|id| seen.insert(*id)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dedup_keeps_first_occurrence_order() {
        assert_eq!(dedup_ids(&[3, 3, 7, 1, 7, 3]), vec![3, 7, 1]);
        assert!(dedup_ids(&[]).is_empty());
    }

    #[tokio::test]
    async fn beatmap_sets_are_deduplicated() {
        let feed = ChangeFeed::new(8);
        let mut rx = feed.subscribe_beatmap_sets();

        feed.beatmap_sets_changed(&[5, 5, 5, 6, 5]);

        assert_eq!(rx.recv().await.unwrap(), vec![5, 6]);
    }

    #[test]
    fn empty_batch_is_not_published() {
        let feed = ChangeFeed::new(8);
        let mut rx = feed.subscribe_beatmap_sets();

        assert_eq!(feed.beatmap_sets_changed(&[]), 0);
        assert!(matches!(
            rx.try_recv(),
            Err(broadcast::error::TryRecvError::Empty)
        ));
    }

    #[test]
    fn daily_challenge_always_overwrites() {
        let feed = ChangeFeed::new(8);
        let rx = feed.watch_daily_challenge();

        feed.daily_challenge_updated(Some(DailyChallengeInfo { room_id: 1 }));
        assert_eq!(feed.daily_challenge(), Some(DailyChallengeInfo { room_id: 1 }));

        feed.daily_challenge_updated(None);
        assert_eq!(feed.daily_challenge(), None);
        assert_eq!(*rx.borrow(), None);
    }

    #[tokio::test]
    async fn disconnecting_reaches_every_subscriber_once() {
        let feed = ChangeFeed::new(8);
        let mut a = feed.subscribe_disconnecting();
        let mut b = feed.subscribe_disconnecting();

        assert_eq!(feed.disconnecting(), 2);

        a.recv().await.unwrap();
        b.recv().await.unwrap();
        assert!(a.try_recv().is_err());
        assert!(b.try_recv().is_err());
    }

    #[tokio::test]
    async fn dropped_subscriber_does_not_block_delivery() {
        let feed = ChangeFeed::new(8);
        let gone = feed.subscribe_room_scores();
        let mut kept = feed.subscribe_room_scores();
        drop(gone);

        let event = MultiplayerRoomScoreSetEvent {
            room_id: 1,
            playlist_item_id: 2,
            score_id: 3,
            user_id: 4,
            total_score: 5,
            new_rank: None,
        };
        assert_eq!(feed.room_score_set(event.clone()), 1);
        assert_eq!(kept.recv().await.unwrap(), event);
    }
}
