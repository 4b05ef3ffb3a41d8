//! Error types for the commerce stores

use storefront_store::StoreError;
use thiserror::Error;

/// Core error type for store operations
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("No active session")]
    NoActiveSession,

    #[error("Cart is empty")]
    EmptyCart,

    #[error("Storage error: {0}")]
    Storage(#[from] StoreError),
}

pub type CoreResult<T> = std::result::Result<T, CoreError>;
