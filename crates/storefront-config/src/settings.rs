//! Validated settings

use crate::schema::{RawCatalogConfig, RawConfig, RawStorageConfig};
use std::path::PathBuf;
use std::time::Duration;
use storefront_store::KeyScope;
use storefront_util::default_data_dir;

/// Default product catalog root
pub const DEFAULT_CATALOG_URL: &str = "https://fakestoreapi.com";

/// Default products per listing page
pub const DEFAULT_PAGE_SIZE: usize = 5;

/// Default catalog request timeout
pub const DEFAULT_CATALOG_TIMEOUT: Duration = Duration::from_secs(10);

/// Validated configuration
#[derive(Debug, Clone, Default)]
pub struct Settings {
    pub storage: StorageSettings,
    pub catalog: CatalogSettings,
}

impl Settings {
    /// Convert from raw config (after validation)
    pub fn from_raw(raw: RawConfig) -> Self {
        Self {
            storage: StorageSettings::from_raw(raw.storage),
            catalog: CatalogSettings::from_raw(raw.catalog),
        }
    }
}

/// Where and how store data is persisted
#[derive(Debug, Clone)]
pub struct StorageSettings {
    pub data_dir: PathBuf,
    pub key_scope: KeyScope,
}

impl StorageSettings {
    fn from_raw(raw: RawStorageConfig) -> Self {
        Self {
            data_dir: raw.data_dir.unwrap_or_else(default_data_dir),
            key_scope: if raw.namespace_by_user {
                KeyScope::PerUser
            } else {
                KeyScope::Shared
            },
        }
    }
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self::from_raw(RawStorageConfig::default())
    }
}

/// Product catalog client settings
#[derive(Debug, Clone)]
pub struct CatalogSettings {
    pub base_url: String,
    pub page_size: usize,
    pub timeout: Duration,
}

impl CatalogSettings {
    fn from_raw(raw: RawCatalogConfig) -> Self {
        Self {
            base_url: raw
                .base_url
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or_else(|| DEFAULT_CATALOG_URL.to_string()),
            page_size: raw.page_size.unwrap_or(DEFAULT_PAGE_SIZE),
            timeout: raw
                .timeout_seconds
                .map(Duration::from_secs)
                .unwrap_or(DEFAULT_CATALOG_TIMEOUT),
        }
    }
}

impl Default for CatalogSettings {
    fn default() -> Self {
        Self::from_raw(RawCatalogConfig::default())
    }
}
