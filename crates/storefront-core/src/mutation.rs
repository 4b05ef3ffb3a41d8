//! Outcome of optimistic mutations

use storefront_store::StoreError;

use crate::{CoreError, CoreResult};

/// Result of a cart, favorites or orders mutation.
///
/// The in-memory change is already visible to readers when this is
/// returned and is never rolled back; `durable` reports whether the write
/// reached storage.
#[derive(Debug)]
#[must_use]
pub struct Mutation<T> {
    pub value: T,
    pub durable: Result<(), StoreError>,
}

impl<T> Mutation<T> {
    pub(crate) fn new(value: T, durable: Result<(), StoreError>) -> Self {
        Self { value, durable }
    }

    /// A mutation that changed nothing and so needed no write
    pub(crate) fn unchanged(value: T) -> Self {
        Self {
            value,
            durable: Ok(()),
        }
    }

    pub fn is_durable(&self) -> bool {
        self.durable.is_ok()
    }

    /// Treat a failed write as an error
    pub fn into_result(self) -> CoreResult<T> {
        match self.durable {
            Ok(()) => Ok(self.value),
            Err(e) => Err(CoreError::Storage(e)),
        }
    }
}
