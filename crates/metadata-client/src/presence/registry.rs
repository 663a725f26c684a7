use std::collections::HashMap;

use tracing::trace;

use crate::protocol::{UserActivity, UserId, UserPresence, UserStatus};

use super::types::PresenceChange;

/// In-memory presence state.
///
/// Every setter returns the change it applied, or `None` when the write left
/// the registry as it was.
#[derive(Debug, Default)]
pub struct PresenceRegistry {
    local: UserPresence,
    friends: HashMap<UserId, UserPresence>,
    users: HashMap<UserId, UserPresence>,
}

impl PresenceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a user's presence: local user, then friends, then everyone else.
    pub fn get_presence(
        &self,
        user_id: UserId,
        local_user_id: Option<UserId>,
    ) -> Option<&UserPresence> {
        if local_user_id == Some(user_id) {
            return Some(&self.local);
        }

        self.friends
            .get(&user_id)
            .or_else(|| self.users.get(&user_id))
    }

    pub fn local(&self) -> &UserPresence {
        &self.local
    }

    pub fn set_local_state(&mut self, presence: UserPresence) -> Option<PresenceChange> {
        if self.local == presence {
            return None;
        }
        self.local = presence.clone();
        Some(PresenceChange::Local(presence))
    }

    pub fn set_local_activity(&mut self, activity: Option<UserActivity>) -> Option<PresenceChange> {
        let presence = UserPresence {
            activity,
            ..self.local.clone()
        };
        self.set_local_state(presence)
    }

    pub fn set_local_status(&mut self, status: Option<UserStatus>) -> Option<PresenceChange> {
        let presence = UserPresence {
            status,
            ..self.local.clone()
        };
        self.set_local_state(presence)
    }

    pub fn upsert_friend(
        &mut self,
        user_id: UserId,
        presence: Option<UserPresence>,
    ) -> Option<PresenceChange> {
        upsert(&mut self.friends, user_id, presence.clone())?;
        trace!(user_id, removed = presence.is_none(), "friend presence updated");
        Some(PresenceChange::Friend { user_id, presence })
    }

    pub fn upsert_general(
        &mut self,
        user_id: UserId,
        presence: Option<UserPresence>,
    ) -> Option<PresenceChange> {
        upsert(&mut self.users, user_id, presence.clone())?;
        trace!(user_id, removed = presence.is_none(), "user presence updated");
        Some(PresenceChange::User { user_id, presence })
    }

    pub fn friends(&self) -> &HashMap<UserId, UserPresence> {
        &self.friends
    }

    pub fn users(&self) -> &HashMap<UserId, UserPresence> {
        &self.users
    }

    /// Drop every general-tier entry, returning one removal per dropped user.
    pub fn clear_users(&mut self) -> Vec<PresenceChange> {
        self.users
            .drain()
            .map(|(user_id, _)| PresenceChange::User {
                user_id,
                presence: None,
            })
            .collect()
    }

    pub fn clear(&mut self) {
        self.local = UserPresence::default();
        self.friends.clear();
        self.users.clear();
    }
}

/// Replace or remove an entry. `None` if the map is unchanged.
fn upsert(
    map: &mut HashMap<UserId, UserPresence>,
    user_id: UserId,
    presence: Option<UserPresence>,
) -> Option<()> {
    match presence {
        Some(presence) => {
            if map.get(&user_id) == Some(&presence) {
                return None;
            }
            map.insert(user_id, presence);
        }
        None => {
            map.remove(&user_id)?;
        }
    }
    Some(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn online(activity: Option<UserActivity>) -> UserPresence {
        UserPresence::new(activity, Some(UserStatus::Online))
    }

    #[test]
    fn friend_tier_beats_general_tier() {
        let mut registry = PresenceRegistry::new();
        let friend = online(Some(UserActivity::ChoosingBeatmap));
        let general = online(Some(UserActivity::Idle));

        registry.upsert_general(5, Some(general));
        registry.upsert_friend(5, Some(friend.clone()));

        assert_eq!(registry.get_presence(5, Some(1)), Some(&friend));
    }

    #[test]
    fn local_user_beats_everything() {
        let mut registry = PresenceRegistry::new();
        let local = online(Some(UserActivity::InDailyChallengeLobby));
        registry.set_local_state(local.clone());
        registry.upsert_friend(1, Some(online(None)));
        registry.upsert_general(1, Some(online(Some(UserActivity::Idle))));

        assert_eq!(registry.get_presence(1, Some(1)), Some(&local));
    }

    #[test]
    fn local_only_resolves_for_local_user() {
        let mut registry = PresenceRegistry::new();
        let local = online(Some(UserActivity::ChoosingBeatmap));
        registry.set_local_state(local.clone());

        assert_eq!(registry.get_presence(3, Some(3)), Some(&local));
        assert_eq!(registry.get_presence(3, None), None);
    }

    #[test]
    fn general_tier_beats_nothing() {
        let mut registry = PresenceRegistry::new();
        let general = online(None);
        registry.upsert_general(8, Some(general.clone()));

        assert_eq!(registry.get_presence(8, None), Some(&general));
        assert_eq!(registry.get_presence(9, None), None);
    }

    #[test]
    fn clearing_friend_does_not_fall_back_into_friend_tier() {
        let mut registry = PresenceRegistry::new();
        let general = online(Some(UserActivity::Idle));
        registry.upsert_general(4, Some(general.clone()));
        registry.upsert_friend(4, Some(online(None)));

        registry.upsert_friend(4, None);

        assert!(!registry.friends().contains_key(&4));
        assert_eq!(registry.users().get(&4), Some(&general));
        assert_eq!(registry.get_presence(4, None), Some(&general));
    }

    #[test]
    fn upsert_reports_changes() {
        let mut registry = PresenceRegistry::new();
        let presence = online(None);

        assert_eq!(
            registry.upsert_friend(2, Some(presence.clone())),
            Some(PresenceChange::Friend {
                user_id: 2,
                presence: Some(presence.clone())
            })
        );
        assert_eq!(registry.upsert_friend(2, Some(presence)), None);
        assert!(registry.upsert_friend(2, None).is_some());
        assert_eq!(registry.upsert_friend(2, None), None);
    }

    #[test]
    fn presence_is_replaced_wholesale() {
        let mut registry = PresenceRegistry::new();
        registry.upsert_general(6, Some(online(Some(UserActivity::Idle))));
        registry.upsert_general(6, Some(UserPresence::new(None, Some(UserStatus::DoNotDisturb))));

        let presence = registry.get_presence(6, None).unwrap();
        assert_eq!(presence.activity, None);
        assert_eq!(presence.status, Some(UserStatus::DoNotDisturb));
    }

    #[test]
    fn local_activity_and_status_compose() {
        let mut registry = PresenceRegistry::new();
        registry.set_local_status(Some(UserStatus::Online));
        let change = registry.set_local_activity(Some(UserActivity::ChoosingBeatmap));

        assert_eq!(
            change,
            Some(PresenceChange::Local(online(Some(
                UserActivity::ChoosingBeatmap
            ))))
        );
        assert_eq!(registry.set_local_status(Some(UserStatus::Online)), None);
    }

    #[test]
    fn clear_users_reports_removals() {
        let mut registry = PresenceRegistry::new();
        registry.upsert_general(1, Some(online(None)));
        registry.upsert_general(2, Some(online(None)));
        registry.upsert_friend(3, Some(online(None)));

        let mut removed: Vec<_> = registry
            .clear_users()
            .iter()
            .filter_map(PresenceChange::user_id)
            .collect();
        removed.sort_unstable();

        assert_eq!(removed, vec![1, 2]);
        assert!(registry.users().is_empty());
        assert_eq!(registry.friends().len(), 1);
    }

    #[test]
    fn clear_resets_every_tier() {
        let mut registry = PresenceRegistry::new();
        registry.set_local_status(Some(UserStatus::Online));
        registry.upsert_friend(1, Some(online(None)));
        registry.upsert_general(2, Some(online(None)));

        registry.clear();

        assert!(registry.local().is_empty());
        assert!(registry.friends().is_empty());
        assert!(registry.users().is_empty());
    }
}
