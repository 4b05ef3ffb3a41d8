//! Default paths for storefront components
//!
//! Paths are user-writable (no root required):
//! - Data: `$XDG_DATA_HOME/storefront` or `~/.local/share/storefront`
//! - Config: `$XDG_CONFIG_HOME/storefront/config.toml` or `~/.config/storefront/config.toml`

use std::path::PathBuf;

/// Environment variable for overriding the data directory
pub const STOREFRONT_DATA_DIR_ENV: &str = "STOREFRONT_DATA_DIR";

/// File name of the durable key-value database inside the data directory
pub const DATABASE_FILENAME: &str = "storefront.db";

/// Application subdirectory name
const APP_DIR: &str = "storefront";

/// Config filename within the config directory
const CONFIG_FILENAME: &str = "config.toml";

/// Get the default data directory.
///
/// Order of precedence:
/// 1. `$STOREFRONT_DATA_DIR` environment variable (if set)
/// 2. `$XDG_DATA_HOME/storefront` (if XDG_DATA_HOME is set)
/// 3. `~/.local/share/storefront` (fallback)
pub fn default_data_dir() -> PathBuf {
    if let Ok(path) = std::env::var(STOREFRONT_DATA_DIR_ENV) {
        return PathBuf::from(path);
    }

    data_dir_without_env()
}

/// Get the data directory without checking STOREFRONT_DATA_DIR.
/// Used for config defaults where the env var is checked separately.
pub fn data_dir_without_env() -> PathBuf {
    if let Ok(data_home) = std::env::var("XDG_DATA_HOME") {
        return PathBuf::from(data_home).join(APP_DIR);
    }

    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home)
            .join(".local")
            .join("share")
            .join(APP_DIR);
    }

    // Last resort
    PathBuf::from("/tmp").join(APP_DIR).join("data")
}

/// Get the default configuration file path.
///
/// Order of precedence:
/// 1. `$XDG_CONFIG_HOME/storefront/config.toml`
/// 2. `~/.config/storefront/config.toml`
pub fn default_config_path() -> PathBuf {
    if let Ok(config_home) = std::env::var("XDG_CONFIG_HOME") {
        return PathBuf::from(config_home).join(APP_DIR).join(CONFIG_FILENAME);
    }

    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home)
            .join(".config")
            .join(APP_DIR)
            .join(CONFIG_FILENAME);
    }

    PathBuf::from("/tmp").join(APP_DIR).join(CONFIG_FILENAME)
}
