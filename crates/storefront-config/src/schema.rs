//! Raw configuration schema (as parsed from TOML)

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Raw configuration as parsed from TOML
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RawConfig {
    /// Config schema version
    pub config_version: u32,

    /// Durable storage settings
    #[serde(default)]
    pub storage: RawStorageConfig,

    /// Product catalog settings
    #[serde(default)]
    pub catalog: RawCatalogConfig,
}

/// Storage settings
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawStorageConfig {
    /// Directory holding the database
    pub data_dir: Option<PathBuf>,

    /// Give favorites and orders one storage slot per account
    #[serde(default)]
    pub namespace_by_user: bool,
}

/// Catalog settings
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawCatalogConfig {
    /// API root, e.g. "https://fakestoreapi.com"
    pub base_url: Option<String>,

    /// Products per listing page
    pub page_size: Option<usize>,

    /// Request timeout in seconds
    pub timeout_seconds: Option<u64>,
}
