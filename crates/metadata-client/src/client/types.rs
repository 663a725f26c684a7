use crate::catalogue::INITIAL_QUEUE_ID;
use crate::protocol::QueueId;

/// Construction options for `MetadataClient`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientOptions {
    /// Buffer size of each notification bus. Slow subscribers that fall
    /// further behind than this see `RecvError::Lagged`.
    pub event_capacity: usize,
    /// Catalogue cursor to resume from.
    pub initial_queue_id: QueueId,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            event_capacity: 256,
            initial_queue_id: INITIAL_QUEUE_ID,
        }
    }
}
