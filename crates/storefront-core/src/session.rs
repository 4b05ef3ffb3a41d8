//! Session store: authentication state machine

use std::sync::Arc;
use storefront_api::{ProfileUpdate, SessionState, UserSession};
use storefront_store::{KeyValueStore, StorageKey, load_json, save_json};
use storefront_util::SessionToken;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::{CoreError, CoreResult, SessionEvent};

/// Avatar assigned to every new session
pub const DEFAULT_PROFILE_IMAGE: &str = "https://i.pravatar.cc/150";

/// A built-in demo account
#[derive(Debug, Clone, Copy)]
pub struct Credential {
    pub email: &'static str,
    pub password: &'static str,
    pub name: &'static str,
}

/// The closed set of accounts accepted by [`SessionStore::login`]
pub const DEMO_ACCOUNTS: &[Credential] = &[
    Credential {
        email: "test@zignuts.com",
        password: "123456",
        name: "Test User",
    },
    Credential {
        email: "practical@zignuts.com",
        password: "123456",
        name: "Practical User",
    },
];

fn find_account(email: &str, password: &str) -> Option<&'static Credential> {
    DEMO_ACCOUNTS
        .iter()
        .find(|c| c.email == email && c.password == password)
}

/// Owns the authenticated user identity
pub struct SessionStore {
    kv: Arc<dyn KeyValueStore>,
    state_tx: watch::Sender<SessionState>,
    state_rx: watch::Receiver<SessionState>,
}

impl SessionStore {
    /// Create a store in the `Uninitialized` state
    pub fn new(kv: Arc<dyn KeyValueStore>) -> Self {
        let (state_tx, state_rx) = watch::channel(SessionState::Uninitialized);
        Self {
            kv,
            state_tx,
            state_rx,
        }
    }

    fn key(&self) -> &'static str {
        StorageKey::Session.as_str()
    }

    /// Rehydrate from durable storage.
    ///
    /// A missing or unreadable record leaves the store `Anonymous`.
    pub async fn restore(&self) -> SessionEvent {
        self.state_tx.send_replace(SessionState::Loading);

        let user = match load_json::<UserSession>(self.kv.as_ref(), self.key()).await {
            Ok(Some(user)) => {
                info!(email = %user.email, "Session restored");
                Some(user)
            }
            Ok(None) => {
                debug!("No stored session");
                None
            }
            Err(e) => {
                warn!(error = %e, "Failed to load session, continuing signed out");
                None
            }
        };

        self.state_tx.send_replace(match &user {
            Some(user) => SessionState::Authenticated(user.clone()),
            None => SessionState::Anonymous,
        });

        SessionEvent::Restored { user }
    }

    /// Current state
    pub fn state(&self) -> SessionState {
        self.state_rx.borrow().clone()
    }

    /// The signed-in user, if any
    pub fn current_user(&self) -> Option<UserSession> {
        self.state_rx.borrow().user().cloned()
    }

    pub fn is_authenticated(&self) -> bool {
        self.state_rx.borrow().is_authenticated()
    }

    /// Subscribe to state changes
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state_rx.clone()
    }

    /// Validate credentials and start a new session.
    ///
    /// The record is persisted before the state changes, so a caller that
    /// sees `Ok` can rely on the session surviving a restart. Signing in
    /// while already authenticated replaces the previous session.
    pub async fn login(&self, email: &str, password: &str) -> CoreResult<SessionEvent> {
        let Some(account) = find_account(email, password) else {
            warn!(email, "Login rejected: invalid credentials");
            return Err(CoreError::InvalidCredentials);
        };

        let user = UserSession {
            email: account.email.to_string(),
            name: account.name.to_string(),
            token: SessionToken::generate(storefront_util::now()),
            profile_image: Some(DEFAULT_PROFILE_IMAGE.to_string()),
            address: Some(String::new()),
        };

        if let Err(e) = save_json(self.kv.as_ref(), self.key(), &user).await {
            warn!(email, error = %e, "Failed to persist session");
            return Err(e.into());
        }

        self.state_tx
            .send_replace(SessionState::Authenticated(user.clone()));
        info!(email = %user.email, "Signed in");

        Ok(SessionEvent::SignedIn { user })
    }

    /// End the session.
    ///
    /// In-memory state is always cleared; failing to remove the durable
    /// record is logged and otherwise ignored.
    pub async fn logout(&self) -> SessionEvent {
        if let Err(e) = self.kv.remove(self.key()).await {
            warn!(error = %e, "Failed to remove stored session");
        }

        let previous = self.state_tx.send_replace(SessionState::Anonymous);
        let email = previous.user().map(|u| u.email.clone());
        info!(email = ?email, "Signed out");

        SessionEvent::SignedOut { email }
    }

    /// Merge profile fields into the current session.
    ///
    /// Returns `Ok(None)` when nobody is signed in. The merged record is
    /// persisted first; if that fails the in-memory session is untouched.
    pub async fn update_profile(&self, update: ProfileUpdate) -> CoreResult<Option<SessionEvent>> {
        let Some(current) = self.current_user() else {
            debug!("Profile update ignored: no active session");
            return Ok(None);
        };

        let merged = current.merged(&update);

        if let Err(e) = save_json(self.kv.as_ref(), self.key(), &merged).await {
            warn!(email = %current.email, error = %e, "Failed to persist profile update");
            return Err(e.into());
        }

        self.state_tx
            .send_replace(SessionState::Authenticated(merged.clone()));
        debug!(email = %merged.email, "Profile updated");

        Ok(Some(SessionEvent::ProfileUpdated { user: merged }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use storefront_store::MemoryStore;

    fn make_store() -> (Arc<MemoryStore>, SessionStore) {
        let kv = Arc::new(MemoryStore::new());
        let store = SessionStore::new(kv.clone());
        (kv, store)
    }

    #[tokio::test]
    async fn test_initial_state() {
        let (_kv, store) = make_store();
        assert_eq!(store.state(), SessionState::Uninitialized);

        let event = store.restore().await;
        assert_eq!(event, SessionEvent::Restored { user: None });
        assert_eq!(store.state(), SessionState::Anonymous);
    }

    #[tokio::test]
    async fn test_login_success() {
        let (kv, store) = make_store();
        store.restore().await;

        let event = store.login("test@zignuts.com", "123456").await.unwrap();
        let user = event.user().unwrap();
        assert_eq!(user.name, "Test User");
        assert_eq!(user.profile_image.as_deref(), Some(DEFAULT_PROFILE_IMAGE));
        assert_eq!(user.address.as_deref(), Some(""));
        assert!(store.is_authenticated());

        // Persisted before returning
        assert!(kv.contains_key("AUTH_TOKEN"));
    }

    #[tokio::test]
    async fn test_login_invalid_credentials() {
        let (kv, store) = make_store();
        store.restore().await;

        let result = store.login("bad@x.com", "x").await;
        assert!(matches!(result, Err(CoreError::InvalidCredentials)));

        let wrong_password = store.login("test@zignuts.com", "654321").await;
        assert!(matches!(wrong_password, Err(CoreError::InvalidCredentials)));

        assert_eq!(store.state(), SessionState::Anonymous);
        assert!(!kv.contains_key("AUTH_TOKEN"));
    }

    #[tokio::test]
    async fn test_login_persistence_failure() {
        let (kv, store) = make_store();
        store.restore().await;
        kv.set_fail_writes(true);

        let result = store.login("test@zignuts.com", "123456").await;
        assert!(matches!(result, Err(CoreError::Storage(_))));
        assert_eq!(store.state(), SessionState::Anonymous);
    }

    #[tokio::test]
    async fn test_tokens_unique_per_login() {
        let (_kv, store) = make_store();
        store.restore().await;

        let first = store.login("test@zignuts.com", "123456").await.unwrap();
        store.logout().await;
        let second = store.login("test@zignuts.com", "123456").await.unwrap();

        assert_ne!(first.user().unwrap().token, second.user().unwrap().token);
    }

    #[tokio::test]
    async fn test_logout() {
        let (kv, store) = make_store();
        store.restore().await;
        store.login("practical@zignuts.com", "123456").await.unwrap();

        let event = store.logout().await;
        assert_eq!(
            event,
            SessionEvent::SignedOut {
                email: Some("practical@zignuts.com".into())
            }
        );
        assert_eq!(store.state(), SessionState::Anonymous);
        assert!(!kv.contains_key("AUTH_TOKEN"));
    }

    #[tokio::test]
    async fn test_logout_tolerates_storage_failure() {
        let (kv, store) = make_store();
        store.restore().await;
        store.login("test@zignuts.com", "123456").await.unwrap();
        kv.set_fail_removes(true);

        store.logout().await;
        assert_eq!(store.state(), SessionState::Anonymous);
    }

    #[tokio::test]
    async fn test_restore_survives_restart() {
        let (kv, store) = make_store();
        store.restore().await;
        store.login("test@zignuts.com", "123456").await.unwrap();
        store
            .update_profile(ProfileUpdate::new().address("221B Baker Street"))
            .await
            .unwrap();
        let before = store.current_user().unwrap();

        let restarted = SessionStore::new(kv.clone());
        let event = restarted.restore().await;
        let after = event.user().unwrap();

        assert_eq!(after.email, before.email);
        assert_eq!(after.name, before.name);
        assert_eq!(after.address, before.address);
        assert!(restarted.is_authenticated());
    }

    #[tokio::test]
    async fn test_restore_treats_garbage_as_anonymous() {
        let (kv, store) = make_store();
        kv.insert_raw("AUTH_TOKEN", "not json");

        store.restore().await;
        assert_eq!(store.state(), SessionState::Anonymous);
    }

    #[tokio::test]
    async fn test_restore_treats_read_failure_as_anonymous() {
        let (kv, store) = make_store();
        kv.insert_raw(
            "AUTH_TOKEN",
            r#"{"email":"test@zignuts.com","name":"Test User","token":"token-1"}"#,
        );
        kv.set_fail_reads(true);

        store.restore().await;
        assert_eq!(store.state(), SessionState::Anonymous);
    }

    #[tokio::test]
    async fn test_update_profile_without_session() {
        let (kv, store) = make_store();
        store.restore().await;

        let result = store
            .update_profile(ProfileUpdate::new().name("Nobody"))
            .await
            .unwrap();
        assert!(result.is_none());
        assert_eq!(kv.write_count(), 0);
    }

    #[tokio::test]
    async fn test_update_profile_merges_fields() {
        let (_kv, store) = make_store();
        store.restore().await;
        store.login("test@zignuts.com", "123456").await.unwrap();

        store
            .update_profile(ProfileUpdate::new().address("1 Main St"))
            .await
            .unwrap();
        store
            .update_profile(ProfileUpdate::new().name("Renamed"))
            .await
            .unwrap();

        let user = store.current_user().unwrap();
        assert_eq!(user.name, "Renamed");
        assert_eq!(user.address.as_deref(), Some("1 Main St"));

        // Explicit empty address clears it
        store
            .update_profile(ProfileUpdate::new().address(""))
            .await
            .unwrap();
        let user = store.current_user().unwrap();
        assert_eq!(user.address.as_deref(), Some(""));
        assert_eq!(user.name, "Renamed");
    }

    #[tokio::test]
    async fn test_update_profile_is_all_or_nothing() {
        let (kv, store) = make_store();
        store.restore().await;
        store.login("test@zignuts.com", "123456").await.unwrap();
        let before = store.current_user().unwrap();

        kv.set_fail_writes(true);
        let result = store
            .update_profile(ProfileUpdate::new().name("Lost"))
            .await;

        assert!(matches!(result, Err(CoreError::Storage(_))));
        assert_eq!(store.current_user().unwrap(), before);
    }

    #[tokio::test]
    async fn test_subscribers_see_transitions() {
        let (_kv, store) = make_store();
        let mut rx = store.subscribe();
        store.restore().await;

        store.login("test@zignuts.com", "123456").await.unwrap();
        assert!(rx.has_changed().unwrap());
        assert!(rx.borrow_and_update().is_authenticated());

        store.logout().await;
        assert!(rx.has_changed().unwrap());
        assert_eq!(*rx.borrow_and_update(), SessionState::Anonymous);
    }
}
