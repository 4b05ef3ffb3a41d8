//! Events emitted by the session store

use storefront_api::UserSession;

/// Session transitions, routed by [`crate::Storefront`] to the
/// session-scoped stores
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// Rehydration finished; `user` is the restored session, if any
    Restored { user: Option<UserSession> },

    /// Credentials accepted and the session persisted
    SignedIn { user: UserSession },

    /// Profile fields merged and persisted
    ProfileUpdated { user: UserSession },

    /// Session removed
    SignedOut { email: Option<String> },
}

impl SessionEvent {
    /// The user signed in after this event, if any
    pub fn user(&self) -> Option<&UserSession> {
        match self {
            SessionEvent::Restored { user } => user.as_ref(),
            SessionEvent::SignedIn { user } | SessionEvent::ProfileUpdated { user } => Some(user),
            SessionEvent::SignedOut { .. } => None,
        }
    }
}
