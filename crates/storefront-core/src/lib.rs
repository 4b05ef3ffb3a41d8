//! Commerce state core for the storefront
//!
//! This crate contains the four cooperating stores:
//! - Session (Uninitialized -> Loading -> Anonymous <-> Authenticated)
//! - Cart (ordered, duplicate-free, independent of the session)
//! - Favorites (session-scoped set of product ids)
//! - Orders (session-scoped, newest-first order history)
//!
//! Each store keeps its state in a `tokio::sync::watch` channel so readers
//! can subscribe, and owns exactly one durable key. [`Storefront`] wires
//! them together and routes session events to the session-scoped stores.

mod cart;
mod error;
mod events;
mod favorites;
mod mutation;
mod orders;
mod session;
mod storefront;

pub use cart::*;
pub use error::*;
pub use events::*;
pub use favorites::*;
pub use mutation::*;
pub use orders::*;
pub use session::*;
pub use storefront::*;
