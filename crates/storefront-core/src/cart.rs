//! Cart store

use std::sync::Arc;
use storefront_api::{CartItem, total_price};
use storefront_store::{KeyValueStore, StorageKey, StoreResult, load_json, save_json};
use storefront_util::ProductId;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::Mutation;

/// Ordered, duplicate-free working set of items to purchase.
///
/// The cart is not tied to the session and survives logout.
pub struct CartStore {
    kv: Arc<dyn KeyValueStore>,
    items_tx: watch::Sender<Vec<CartItem>>,
    items_rx: watch::Receiver<Vec<CartItem>>,
}

impl CartStore {
    pub fn new(kv: Arc<dyn KeyValueStore>) -> Self {
        let (items_tx, items_rx) = watch::channel(Vec::new());
        Self {
            kv,
            items_tx,
            items_rx,
        }
    }

    fn key(&self) -> &'static str {
        StorageKey::Cart.as_str()
    }

    /// Load the persisted cart. Unreadable data yields an empty cart.
    pub async fn restore(&self) {
        let items = match load_json::<Vec<CartItem>>(self.kv.as_ref(), self.key()).await {
            Ok(Some(items)) => {
                info!(count = items.len(), "Cart restored");
                dedup_by_id(items)
            }
            Ok(None) => {
                debug!("No stored cart");
                Vec::new()
            }
            Err(e) => {
                warn!(error = %e, "Failed to load cart, starting empty");
                Vec::new()
            }
        };
        self.items_tx.send_replace(items);
    }

    /// Snapshot of the current items, in insertion order
    pub fn items(&self) -> Vec<CartItem> {
        self.items_rx.borrow().clone()
    }

    pub fn len(&self) -> usize {
        self.items_rx.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items_rx.borrow().is_empty()
    }

    pub fn contains(&self, id: ProductId) -> bool {
        self.items_rx.borrow().iter().any(|item| item.id == id)
    }

    /// Sum of item prices, computed from the current items on every call
    pub fn total_price(&self) -> f64 {
        total_price(&self.items_rx.borrow())
    }

    pub fn subscribe(&self) -> watch::Receiver<Vec<CartItem>> {
        self.items_rx.clone()
    }

    /// Append `item` unless an entry with the same id is already present.
    ///
    /// The returned value is `true` when the item was added.
    pub async fn add_to_cart(&self, item: CartItem) -> Mutation<bool> {
        let id = item.id;
        let added = self.items_tx.send_if_modified(|items| {
            if items.iter().any(|existing| existing.id == id) {
                return false;
            }
            items.push(item);
            true
        });

        if !added {
            debug!(product_id = %id, "Item already in cart");
            return Mutation::unchanged(false);
        }

        debug!(product_id = %id, "Item added to cart");
        Mutation::new(true, self.persist().await)
    }

    /// Remove the entry with `id`; absent ids are not an error.
    ///
    /// The returned value is `true` when an entry was removed.
    pub async fn remove_from_cart(&self, id: ProductId) -> Mutation<bool> {
        let removed = self.items_tx.send_if_modified(|items| {
            let before = items.len();
            items.retain(|item| item.id != id);
            items.len() != before
        });

        if !removed {
            return Mutation::unchanged(false);
        }

        debug!(product_id = %id, "Item removed from cart");
        Mutation::new(true, self.persist().await)
    }

    /// Empty the cart
    pub async fn clear_cart(&self) -> Mutation<()> {
        self.items_tx.send_modify(|items| items.clear());
        debug!("Cart cleared");
        Mutation::new((), self.persist().await)
    }

    async fn persist(&self) -> StoreResult<()> {
        let snapshot = self.items();
        let result = save_json(self.kv.as_ref(), self.key(), &snapshot).await;
        if let Err(e) = &result {
            warn!(key = self.key(), error = %e, "Failed to persist cart");
        }
        result
    }
}

/// Keep the first entry for each id; guards against hand-edited records
fn dedup_by_id(items: Vec<CartItem>) -> Vec<CartItem> {
    let mut seen = std::collections::HashSet::new();
    items.into_iter().filter(|item| seen.insert(item.id)).collect()
}
