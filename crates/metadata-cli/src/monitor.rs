//! Log every client notification until the client goes away.

use metadata_client::{MetadataClient, PresenceChange};
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

pub(crate) fn spawn(client: &MetadataClient) -> Vec<JoinHandle<()>> {
    let mut daily = client.watch_daily_challenge();

    vec![
        tokio::spawn(follow(client.subscribe_beatmap_sets(), |ids| {
            info!(count = ids.len(), ids = ?ids, "beatmap sets changed");
        })),
        tokio::spawn(follow(client.subscribe_room_scores(), |event| {
            info!(
                room_id = event.room_id,
                user_id = event.user_id,
                score_id = event.score_id,
                total_score = event.total_score,
                new_rank = ?event.new_rank,
                "score set"
            );
        })),
        tokio::spawn(follow(client.subscribe_presence(), |change| match change {
            PresenceChange::Local(presence) => debug!(?presence, "local presence"),
            PresenceChange::Friend { user_id, presence } => {
                info!(user_id, ?presence, "friend presence")
            }
            PresenceChange::User { user_id, presence } => {
                debug!(user_id, ?presence, "user presence")
            }
        })),
        tokio::spawn(async move {
            while daily.changed().await.is_ok() {
                let room_id = daily.borrow_and_update().map(|info| info.room_id);
                info!(?room_id, "daily challenge");
            }
        }),
    ]
}

async fn follow<T, F>(mut rx: broadcast::Receiver<T>, log: F)
where
    T: Clone,
    F: Fn(&T),
{
    loop {
        match rx.recv().await {
            Ok(event) => log(&event),
            Err(RecvError::Lagged(skipped)) => warn!(skipped, "monitor fell behind"),
            Err(RecvError::Closed) => break,
        }
    }
}
