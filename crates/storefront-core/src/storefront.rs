//! Composition root: owns the four stores and routes session events

use std::sync::Arc;
use storefront_api::{Order, OrderDraft, ProfileUpdate, UserSession};
use storefront_store::{KeyScope, KeyValueStore};
use tracing::{debug, info, warn};

use crate::{
    CartStore, CoreError, CoreResult, FavoritesStore, Mutation, OrdersStore, SessionEvent,
    SessionStore,
};

/// The commerce state core.
///
/// Favorites and orders follow the session: they load when a user is
/// authenticated and are emptied in memory when the session ends. The cart
/// is independent of the session.
pub struct Storefront {
    session: SessionStore,
    cart: CartStore,
    favorites: FavoritesStore,
    orders: OrdersStore,
}

impl Storefront {
    /// Build the stores without touching storage
    pub fn new(kv: Arc<dyn KeyValueStore>, scope: KeyScope) -> Self {
        Self {
            session: SessionStore::new(kv.clone()),
            cart: CartStore::new(kv.clone()),
            favorites: FavoritesStore::new(kv.clone(), scope),
            orders: OrdersStore::new(kv, scope),
        }
    }

    /// Build the stores and rehydrate them
    pub async fn open(kv: Arc<dyn KeyValueStore>, scope: KeyScope) -> Self {
        let storefront = Self::new(kv, scope);
        storefront.rehydrate().await;
        storefront
    }

    /// Load every store from durable storage. Never fails; unreadable
    /// records come back empty.
    pub async fn rehydrate(&self) {
        let event = self.session.restore().await;
        self.cart.restore().await;
        self.apply_session_event(&event).await;
        debug!("Storefront rehydrated");
    }

    pub fn session(&self) -> &SessionStore {
        &self.session
    }

    pub fn cart(&self) -> &CartStore {
        &self.cart
    }

    pub fn favorites(&self) -> &FavoritesStore {
        &self.favorites
    }

    pub fn orders(&self) -> &OrdersStore {
        &self.orders
    }

    pub fn current_user(&self) -> Option<UserSession> {
        self.session.current_user()
    }

    pub async fn login(&self, email: &str, password: &str) -> CoreResult<UserSession> {
        let event = self.session.login(email, password).await?;
        self.apply_session_event(&event).await;
        event.user().cloned().ok_or(CoreError::NoActiveSession)
    }

    pub async fn logout(&self) {
        let event = self.session.logout().await;
        self.apply_session_event(&event).await;
    }

    /// Returns the updated user, or `None` when nobody is signed in
    pub async fn update_profile(&self, update: ProfileUpdate) -> CoreResult<Option<UserSession>> {
        let event = self.session.update_profile(update).await?;
        if let Some(event) = &event {
            self.apply_session_event(event).await;
        }
        Ok(event.and_then(|e| e.user().cloned()))
    }

    /// Turn the cart into an order, then empty the cart.
    ///
    /// The order is recorded before the cart is cleared. A failed cart
    /// write after a successful order is logged, not returned: the order
    /// already exists.
    pub async fn place_order(&self) -> CoreResult<Mutation<Order>> {
        let Some(user) = self.session.current_user() else {
            return Err(CoreError::NoActiveSession);
        };

        let items = self.cart.items();
        if items.is_empty() {
            debug!(email = %user.email, "Refusing to place an empty order");
            return Err(CoreError::EmptyCart);
        }

        let draft = OrderDraft::from_cart(&items, user.email.as_str());
        let placed = self.orders.add_order(draft).await?;

        let cleared = self.cart.clear_cart().await;
        if let Err(e) = &cleared.durable {
            warn!(order_id = %placed.value.id, error = %e, "Order placed but emptied cart was not persisted");
        }

        info!(
            order_id = %placed.value.id,
            reference = placed.value.id.short(),
            email = %user.email,
            "Checkout complete"
        );
        Ok(placed)
    }

    /// Bring the session-scoped stores in line with a session transition
    async fn apply_session_event(&self, event: &SessionEvent) {
        match event.user() {
            Some(user) => {
                let loaded_for = self.favorites.state().owner;
                // A profile update for the same user keeps what is loaded
                if matches!(event, SessionEvent::ProfileUpdated { .. })
                    && loaded_for.as_deref() == Some(user.email.as_str())
                {
                    return;
                }
                self.favorites.attach(&user.email).await;
                self.orders.attach(&user.email).await;
            }
            None => {
                self.favorites.detach();
                self.orders.detach();
            }
        }
    }
}
