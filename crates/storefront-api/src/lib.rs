//! Shared data model for the storefront
//!
//! These are the JSON shapes persisted by the stores and returned by the
//! product catalog. Field names are camelCase on the wire so records written
//! by earlier releases stay readable.

mod product;
mod types;

pub use product::*;
pub use types::*;
