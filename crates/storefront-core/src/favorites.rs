//! Favorites store

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use storefront_store::{KeyScope, KeyValueStore, StorageKey, StoreResult, load_json, save_json};
use storefront_util::ProductId;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::{CoreError, CoreResult, Mutation};

/// Favorited product ids in the order they were added.
///
/// Persisted as a plain JSON array of ids.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<ProductId>", into = "Vec<ProductId>")]
pub struct FavoriteSet {
    order: Vec<ProductId>,
    index: HashSet<ProductId>,
}

impl FavoriteSet {
    pub fn contains(&self, id: ProductId) -> bool {
        self.index.contains(&id)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = ProductId> + '_ {
        self.order.iter().copied()
    }

    /// Flip membership of `id`; returns whether it is now a favorite
    pub fn toggle(&mut self, id: ProductId) -> bool {
        if self.index.remove(&id) {
            self.order.retain(|existing| *existing != id);
            false
        } else {
            self.index.insert(id);
            self.order.push(id);
            true
        }
    }

    pub fn to_vec(&self) -> Vec<ProductId> {
        self.order.clone()
    }
}

impl From<Vec<ProductId>> for FavoriteSet {
    fn from(ids: Vec<ProductId>) -> Self {
        let mut set = FavoriteSet::default();
        for id in ids {
            if set.index.insert(id) {
                set.order.push(id);
            }
        }
        set
    }
}

impl From<FavoriteSet> for Vec<ProductId> {
    fn from(set: FavoriteSet) -> Self {
        set.order
    }
}

/// Favorites as seen by readers.
///
/// `owner` is the email whose favorites are loaded; `None` means no
/// session, in which case `ids` is always empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FavoritesState {
    pub owner: Option<String>,
    pub ids: FavoriteSet,
}

impl FavoritesState {
    pub fn is_loaded(&self) -> bool {
        self.owner.is_some()
    }
}

/// Session-scoped set of favorited product ids
pub struct FavoritesStore {
    kv: Arc<dyn KeyValueStore>,
    scope: KeyScope,
    state_tx: watch::Sender<FavoritesState>,
    state_rx: watch::Receiver<FavoritesState>,
}

impl FavoritesStore {
    pub fn new(kv: Arc<dyn KeyValueStore>, scope: KeyScope) -> Self {
        let (state_tx, state_rx) = watch::channel(FavoritesState::default());
        Self {
            kv,
            scope,
            state_tx,
            state_rx,
        }
    }

    fn key_for(&self, owner: &str) -> String {
        self.scope.resolve(StorageKey::Favorites, Some(owner))
    }

    /// Load the durable favorites of `owner`.
    ///
    /// Called when a session becomes authenticated. Unreadable data yields
    /// an empty set.
    pub async fn attach(&self, owner: &str) {
        let key = self.key_for(owner);
        let ids = match load_json::<FavoriteSet>(self.kv.as_ref(), &key).await {
            Ok(Some(ids)) => {
                info!(owner, count = ids.len(), "Favorites restored");
                ids
            }
            Ok(None) => {
                debug!(owner, "No stored favorites");
                FavoriteSet::default()
            }
            Err(e) => {
                warn!(owner, key = %key, error = %e, "Failed to load favorites, starting empty");
                FavoriteSet::default()
            }
        };

        self.state_tx.send_replace(FavoritesState {
            owner: Some(owner.to_string()),
            ids,
        });
    }

    /// Forget the in-memory favorites; the durable record is kept
    pub fn detach(&self) {
        self.state_tx.send_if_modified(|state| {
            let changed = state.owner.is_some() || !state.ids.is_empty();
            *state = FavoritesState::default();
            changed
        });
        debug!("Favorites detached");
    }

    pub fn state(&self) -> FavoritesState {
        self.state_rx.borrow().clone()
    }

    /// Favorited ids in the order they were added
    pub fn favorites(&self) -> Vec<ProductId> {
        self.state_rx.borrow().ids.to_vec()
    }

    pub fn is_favorite(&self, id: ProductId) -> bool {
        self.state_rx.borrow().ids.contains(id)
    }

    pub fn subscribe(&self) -> watch::Receiver<FavoritesState> {
        self.state_rx.clone()
    }

    /// Add `id` if absent, remove it if present.
    ///
    /// The returned value is whether `id` is a favorite afterwards. Fails
    /// with `NoActiveSession` when no owner is attached.
    pub async fn toggle_favorite(&self, id: ProductId) -> CoreResult<Mutation<bool>> {
        let mut outcome = None;
        self.state_tx.send_if_modified(|state| match &state.owner {
            Some(owner) => {
                let now_favorite = state.ids.toggle(id);
                outcome = Some((owner.clone(), now_favorite, state.ids.clone()));
                true
            }
            None => false,
        });

        let Some((owner, now_favorite, snapshot)) = outcome else {
            debug!(product_id = %id, "Favorite toggle rejected: no active session");
            return Err(CoreError::NoActiveSession);
        };

        debug!(owner = %owner, product_id = %id, now_favorite, "Favorite toggled");
        let durable = self.persist(&owner, &snapshot).await;
        Ok(Mutation::new(now_favorite, durable))
    }

    /// Empty the set and delete the durable record
    pub async fn clear_favorites(&self) -> Mutation<()> {
        let owner = self.state_rx.borrow().owner.clone();
        self.state_tx.send_modify(|state| state.ids = FavoriteSet::default());

        // Without an owner the shared slot is the only one we can address
        let key = match owner.as_deref() {
            Some(owner) => self.key_for(owner),
            None => self.scope.resolve(StorageKey::Favorites, None),
        };

        let durable = self.kv.remove(&key).await;
        if let Err(e) = &durable {
            warn!(key = %key, error = %e, "Failed to remove stored favorites");
        }
        info!(owner = ?owner, "Favorites cleared");
        Mutation::new((), durable)
    }

    async fn persist(&self, owner: &str, ids: &FavoriteSet) -> StoreResult<()> {
        let key = self.key_for(owner);
        let result = save_json(self.kv.as_ref(), &key, ids).await;
        if let Err(e) = &result {
            warn!(key = %key, error = %e, "Failed to persist favorites");
        }
        result
    }
}
