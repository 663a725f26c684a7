//! Presence registry.
//!
//! Three independent tiers of presence: the local user, friends, and every
//! other user the hub tells us about while presence watching is active.
//! Lookups resolve local, then friend, then general.

mod registry;
mod types;

pub use registry::PresenceRegistry;
pub use types::PresenceChange;
