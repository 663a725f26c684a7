use crate::protocol::{UserId, UserPresence};

/// A change applied to the registry, republished to subscribers.
///
/// `presence: None` on the friend and general tiers means the entry was
/// removed.
#[derive(Debug, Clone, PartialEq)]
pub enum PresenceChange {
    Local(UserPresence),
    Friend {
        user_id: UserId,
        presence: Option<UserPresence>,
    },
    User {
        user_id: UserId,
        presence: Option<UserPresence>,
    },
}

impl PresenceChange {
    /// The user id the change is keyed by, if it belongs to a keyed tier.
    pub fn user_id(&self) -> Option<UserId> {
        match self {
            Self::Local(_) => None,
            Self::Friend { user_id, .. } | Self::User { user_id, .. } => Some(*user_id),
        }
    }
}
