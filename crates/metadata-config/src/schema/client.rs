//! Client behaviour and catalogue cursor settings.

use serde::{Deserialize, Serialize};

/// Behaviour of the metadata client once connected.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Capacity of each notification channel (valid range: 1-65536).
    pub event_capacity: usize,
    /// Run a catalogue catch-up as soon as the client starts.
    pub catch_up_on_start: bool,
    /// Begin watching user presence as soon as the client starts.
    pub watch_presence_on_start: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            event_capacity: 256,
            catch_up_on_start: true,
            watch_presence_on_start: false,
        }
    }
}

/// Sentinel cursor meaning "nothing consumed yet".
pub const INITIAL_QUEUE_ID: i32 = -1;

/// Catalogue change feed cursor.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogueConfig {
    /// Last queue id the host applied; the next catch-up starts here.
    pub last_queue_id: i32,
}

impl Default for CatalogueConfig {
    fn default() -> Self {
        Self {
            last_queue_id: INITIAL_QUEUE_ID,
        }
    }
}
