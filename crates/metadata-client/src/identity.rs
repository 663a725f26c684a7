use std::sync::{Arc, RwLock};

use serde::{Deserialize, Serialize};

use crate::protocol::UserId;

/// Supplies the id of the logged-in user, if any.
pub trait IdentityProvider: Send + Sync {
    fn local_user_id(&self) -> Option<UserId>;
}

#[derive(Clone, Serialize, Deserialize)]
pub struct Identity {
    pub user_id: UserId,
    pub username: String,
    /// Bearer token for the hub connection.
    #[serde(skip)]
    pub access_token: Option<String>,
}

impl std::fmt::Debug for Identity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Identity")
            .field("user_id", &self.user_id)
            .field("username", &self.username)
            .field("access_token", &"[REDACTED]")
            .finish()
    }
}

impl Identity {
    pub fn new(user_id: UserId, username: impl Into<String>) -> Self {
        Self {
            user_id,
            username: username.into(),
            access_token: None,
        }
    }

    pub fn with_access_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(token.into());
        self
    }
}

impl IdentityProvider for Identity {
    fn local_user_id(&self) -> Option<UserId> {
        Some(self.user_id)
    }
}

/// Cloneable handle to the current identity.
///
/// The host swaps the identity on login and logout while the client keeps
/// running; lookups always see the latest value.
#[derive(Debug, Clone, Default)]
pub struct SharedIdentity {
    inner: Arc<RwLock<Option<Identity>>>,
}

impl SharedIdentity {
    pub fn new(identity: Option<Identity>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(identity)),
        }
    }

    pub fn set(&self, identity: Option<Identity>) {
        let mut guard = self.inner.write().unwrap_or_else(|e| e.into_inner());
        *guard = identity;
    }

    pub fn get(&self) -> Option<Identity> {
        self.inner
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

impl IdentityProvider for SharedIdentity {
    fn local_user_id(&self) -> Option<UserId> {
        self.inner
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .as_ref()
            .map(|identity| identity.user_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_redacts_access_token() {
        let identity = Identity::new(7, "peppy").with_access_token("secret-token");
        let debug = format!("{identity:?}");
        assert!(debug.contains("peppy"));
        assert!(debug.contains("[REDACTED]"));
        assert!(!debug.contains("secret-token"));
    }

    #[test]
    fn access_token_not_serialized() {
        let identity = Identity::new(7, "peppy").with_access_token("secret-token");
        let json = serde_json::to_string(&identity).unwrap();
        assert!(!json.contains("secret-token"));

        let back: Identity = serde_json::from_str(&json).unwrap();
        assert_eq!(back.user_id, 7);
        assert!(back.access_token.is_none());
    }

    #[test]
    fn shared_identity_tracks_login_and_logout() {
        let shared = SharedIdentity::default();
        assert_eq!(shared.local_user_id(), None);

        let handle = shared.clone();
        handle.set(Some(Identity::new(2, "BanchoBot")));
        assert_eq!(shared.local_user_id(), Some(2));
        assert_eq!(shared.get().map(|i| i.username), Some("BanchoBot".into()));

        handle.set(None);
        assert_eq!(shared.local_user_id(), None);
    }
}
