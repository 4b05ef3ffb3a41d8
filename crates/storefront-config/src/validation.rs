//! Configuration validation

use crate::schema::RawConfig;
use thiserror::Error;

/// Validation error
#[derive(Debug, Clone, Error)]
pub enum ValidationError {
    #[error("Catalog base_url '{0}' must start with http:// or https://")]
    InvalidBaseUrl(String),

    #[error("Catalog page_size must be at least 1")]
    ZeroPageSize,

    #[error("Catalog timeout_seconds must be at least 1")]
    ZeroTimeout,

    #[error("Storage data_dir cannot be empty")]
    EmptyDataDir,
}

/// Validate a raw configuration, collecting every problem
pub fn validate_config(config: &RawConfig) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if let Some(dir) = &config.storage.data_dir {
        if dir.as_os_str().is_empty() {
            errors.push(ValidationError::EmptyDataDir);
        }
    }

    if let Some(url) = &config.catalog.base_url {
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            errors.push(ValidationError::InvalidBaseUrl(url.clone()));
        }
    }

    if config.catalog.page_size == Some(0) {
        errors.push(ValidationError::ZeroPageSize);
    }

    if config.catalog.timeout_seconds == Some(0) {
        errors.push(ValidationError::ZeroTimeout);
    }

    errors
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(toml_str: &str) -> RawConfig {
        toml::from_str(toml_str).unwrap()
    }

    #[test]
    fn defaults_are_valid() {
        let config = parse("config_version = 1");
        assert!(validate_config(&config).is_empty());
    }

    #[test]
    fn empty_base_url_rejected() {
        let config = parse("config_version = 1\n[catalog]\nbase_url = \"\"");
        let errors = validate_config(&config);
        assert!(matches!(errors.as_slice(), [ValidationError::InvalidBaseUrl(_)]));
    }

    #[test]
    fn zero_timeout_rejected() {
        let config = parse("config_version = 1\n[catalog]\ntimeout_seconds = 0");
        let errors = validate_config(&config);
        assert!(matches!(errors.as_slice(), [ValidationError::ZeroTimeout]));
    }

    #[test]
    fn empty_data_dir_rejected() {
        let config = parse("config_version = 1\n[storage]\ndata_dir = \"\"");
        let errors = validate_config(&config);
        assert!(matches!(errors.as_slice(), [ValidationError::EmptyDataDir]));
    }
}
