//! Beatmap catalogue catch-up.

use metadata_common::ConnectionError;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::feed::ChangeFeed;
use crate::protocol::QueueId;
use crate::server::MetadataServer;

/// Cursor value that asks the hub for its full change history.
pub const INITIAL_QUEUE_ID: QueueId = -1;

/// Cursor into the hub's catalogue change queue.
///
/// Held under a lock for the whole catch-up so two catch-ups never ask for
/// the same range.
#[derive(Debug)]
pub struct CatalogueCursor {
    queue_id: Mutex<QueueId>,
}

impl CatalogueCursor {
    pub fn new(initial: QueueId) -> Self {
        Self {
            queue_id: Mutex::new(initial),
        }
    }

    pub async fn get(&self) -> QueueId {
        *self.queue_id.lock().await
    }

    /// Pull changes until the hub returns an empty batch.
    ///
    /// Each non-empty batch is published, then acknowledged, then the cursor
    /// moves to the batch's `queue_id`. A failure leaves the cursor at the
    /// last acknowledged batch. A non-empty batch that does not move the
    /// cursor ends the catch-up without being applied.
    pub(crate) async fn catch_up(
        &self,
        server: &dyn MetadataServer,
        feed: &ChangeFeed,
    ) -> Result<QueueId, ConnectionError> {
        let mut cursor = self.queue_id.lock().await;
        let mut batches = 0usize;

        loop {
            let updates = server.get_changes_since(*cursor).await?;

            if updates.beatmap_set_ids.is_empty() {
                *cursor = updates.queue_id;
                break;
            }
            if updates.queue_id == *cursor {
                warn!(
                    queue_id = updates.queue_id,
                    count = updates.beatmap_set_ids.len(),
                    "catalogue batch did not advance the cursor; stopping catch-up"
                );
                break;
            }

            debug!(
                queue_id = updates.queue_id,
                count = updates.beatmap_set_ids.len(),
                "applying catalogue changes"
            );
            feed.beatmap_sets_changed(&updates.beatmap_set_ids);

            let queue_id = updates.queue_id;
            server.beatmap_sets_updated(updates).await?;
            *cursor = queue_id;
            batches += 1;
        }

        info!(queue_id = *cursor, batches, "catalogue caught up");
        Ok(*cursor)
    }
}
