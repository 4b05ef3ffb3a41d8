//! Key-value store contract and storage keys

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::StoreResult;

/// Asynchronous durable string-keyed storage.
///
/// Values are whole JSON documents; each store owns exactly one key.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Read a value; `None` when the key is absent
    async fn get(&self, key: &str) -> StoreResult<Option<String>>;

    /// Write a value, replacing any previous one
    async fn set(&self, key: &str, value: &str) -> StoreResult<()>;

    /// Delete a value. Removing an absent key is not an error.
    async fn remove(&self, key: &str) -> StoreResult<()>;

    /// Check if the backing medium is usable
    fn is_healthy(&self) -> bool {
        true
    }
}

/// The fixed durable key of each store.
///
/// The strings are part of the on-disk format and must never change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StorageKey {
    Session,
    Cart,
    Favorites,
    Orders,
}

impl StorageKey {
    pub const fn as_str(&self) -> &'static str {
        match self {
            StorageKey::Session => "AUTH_TOKEN",
            StorageKey::Cart => "CART_ITEMS",
            StorageKey::Favorites => "USER_FAVORITES",
            StorageKey::Orders => "USER_ORDERS",
        }
    }

    /// Whether the key holds data belonging to the signed-in user
    pub const fn is_user_scoped(&self) -> bool {
        matches!(self, StorageKey::Favorites | StorageKey::Orders)
    }
}

impl std::fmt::Display for StorageKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How user-scoped keys are laid out
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum KeyScope {
    /// One slot shared by every account on the installation
    #[default]
    Shared,
    /// User-scoped keys get an `:<email>` suffix
    PerUser,
}

impl KeyScope {
    /// Resolve the concrete storage key for `key` owned by `owner`
    pub fn resolve(&self, key: StorageKey, owner: Option<&str>) -> String {
        match (self, owner) {
            (KeyScope::PerUser, Some(owner)) if key.is_user_scoped() => {
                format!("{}:{}", key.as_str(), owner)
            }
            _ => key.as_str().to_string(),
        }
    }
}

/// Read and decode a JSON document
pub async fn load_json<T: DeserializeOwned>(
    store: &dyn KeyValueStore,
    key: &str,
) -> StoreResult<Option<T>> {
    match store.get(key).await? {
        Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
        None => Ok(None),
    }
}

/// Encode and write a JSON document
pub async fn save_json<T: Serialize + Sync + ?Sized>(
    store: &dyn KeyValueStore,
    key: &str,
    value: &T,
) -> StoreResult<()> {
    let raw = serde_json::to_string(value)?;
    store.set(key, &raw).await
}
