//! Shared utilities for the storefront
//!
//! This crate provides:
//! - ID types (ProductId, OrderId, SessionToken)
//! - Clock utilities (wall-clock `now()` with a debug-only override)
//! - Default paths for data and configuration

mod ids;
mod paths;
mod time;

pub use ids::*;
pub use paths::*;
pub use time::*;
