//! Orders store

use std::sync::Arc;
use storefront_api::{Order, OrderDraft, OrderStatus};
use storefront_store::{KeyScope, KeyValueStore, StorageKey, StoreResult, load_json, save_json};
use storefront_util::OrderId;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::{CoreError, CoreResult, Mutation};

/// Order history as seen by readers, newest first.
///
/// `owner` is the email whose history is loaded; `None` means no session.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OrdersState {
    pub owner: Option<String>,
    pub orders: Vec<Order>,
}

impl OrdersState {
    pub fn is_loaded(&self) -> bool {
        self.owner.is_some()
    }
}

/// Session-scoped history of placed orders
pub struct OrdersStore {
    kv: Arc<dyn KeyValueStore>,
    scope: KeyScope,
    state_tx: watch::Sender<OrdersState>,
    state_rx: watch::Receiver<OrdersState>,
}

impl OrdersStore {
    pub fn new(kv: Arc<dyn KeyValueStore>, scope: KeyScope) -> Self {
        let (state_tx, state_rx) = watch::channel(OrdersState::default());
        Self {
            kv,
            scope,
            state_tx,
            state_rx,
        }
    }

    fn key_for(&self, owner: Option<&str>) -> String {
        self.scope.resolve(StorageKey::Orders, owner)
    }

    async fn load(&self, owner: &str) -> StoreResult<Vec<Order>> {
        let mut orders = load_json::<Vec<Order>>(self.kv.as_ref(), &self.key_for(Some(owner)))
            .await?
            .unwrap_or_default();
        // Stable, so equal timestamps keep their stored order
        orders.sort_by(|a, b| b.date.cmp(&a.date));
        Ok(orders)
    }

    /// Load the durable order history of `owner`.
    ///
    /// Called when a session becomes authenticated. Unreadable data yields
    /// an empty history.
    pub async fn attach(&self, owner: &str) {
        let orders = match self.load(owner).await {
            Ok(orders) => {
                info!(owner, count = orders.len(), "Orders restored");
                orders
            }
            Err(e) => {
                warn!(owner, error = %e, "Failed to load orders, starting empty");
                Vec::new()
            }
        };

        self.state_tx.send_replace(OrdersState {
            owner: Some(owner.to_string()),
            orders,
        });
    }

    /// Forget the in-memory history; the durable record is kept
    pub fn detach(&self) {
        self.state_tx.send_if_modified(|state| {
            let changed = state.owner.is_some() || !state.orders.is_empty();
            *state = OrdersState::default();
            changed
        });
        debug!("Orders detached");
    }

    pub fn state(&self) -> OrdersState {
        self.state_rx.borrow().clone()
    }

    /// Orders, newest first
    pub fn orders(&self) -> Vec<Order> {
        self.state_rx.borrow().orders.clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<OrdersState> {
        self.state_rx.clone()
    }

    /// Look up an order; `None` when no order has this id
    pub fn get_order_by_id(&self, id: &str) -> Option<Order> {
        self.state_rx
            .borrow()
            .orders
            .iter()
            .find(|order| order.id.as_str() == id)
            .cloned()
    }

    /// Record a new order from `draft`.
    ///
    /// The id, date and `Pending` status are assigned here. The draft must be
    /// assembled by the caller before the cart is cleared; this store never
    /// looks at the cart.
    pub async fn add_order(&self, draft: OrderDraft) -> CoreResult<Mutation<Order>> {
        let owner = self.state_rx.borrow().owner.clone();
        let Some(owner) = owner else {
            debug!("Order rejected: no active session");
            return Err(CoreError::NoActiveSession);
        };

        let date = storefront_util::now();
        let order = Order {
            id: OrderId::generate(date),
            date,
            items: draft.items,
            total_price: draft.total_price,
            status: OrderStatus::Pending,
            user_email: draft.user_email,
        };

        self.state_tx
            .send_modify(|state| state.orders.insert(0, order.clone()));
        info!(
            order_id = %order.id,
            item_count = order.item_count(),
            total = order.total_price,
            "Order placed"
        );

        let durable = self.persist(&owner).await;
        Ok(Mutation::new(order, durable))
    }

    /// Empty the history and delete the durable record
    pub async fn clear_orders(&self) -> Mutation<()> {
        let owner = self.state_rx.borrow().owner.clone();
        self.state_tx.send_modify(|state| state.orders.clear());

        let key = self.key_for(owner.as_deref());
        let durable = self.kv.remove(&key).await;
        if let Err(e) = &durable {
            warn!(key = %key, error = %e, "Failed to remove stored orders");
        }
        info!(owner = ?owner, "Orders cleared");
        Mutation::new((), durable)
    }

    /// Re-read the durable history into memory.
    ///
    /// Does nothing without an active session. On a read failure the
    /// in-memory history is left as it was.
    pub async fn refresh_orders(&self) -> CoreResult<()> {
        let owner = self.state_rx.borrow().owner.clone();
        let Some(owner) = owner else {
            debug!("Order refresh skipped: no active session");
            return Ok(());
        };

        let orders = self.load(&owner).await.map_err(|e| {
            warn!(owner = %owner, error = %e, "Failed to refresh orders");
            e
        })?;

        debug!(owner = %owner, count = orders.len(), "Orders refreshed");
        self.state_tx.send_modify(|state| state.orders = orders);
        Ok(())
    }

    async fn persist(&self, owner: &str) -> StoreResult<()> {
        let key = self.key_for(Some(owner));
        let snapshot = self.orders();
        let result = save_json(self.kv.as_ref(), &key, &snapshot).await;
        if let Err(e) = &result {
            warn!(key = %key, error = %e, "Failed to persist orders");
        }
        result
    }
}
