//! Hard-failing decorator over any [`ItemStorage`].
//!
//! The plain store clamps silently; the strict store turns a clamp into an
//! error instead. Running the scheduler against a strict store in debug
//! mode surfaces arithmetic or availability bugs at the call site that
//! caused them.

use crate::store::{ItemKey, ItemStorage, StoreError};
use serde::{Deserialize, Serialize};

/// Forwarding wrapper that replaces silent clamping with hard failures.
///
/// Reads delegate untouched. `withdraw` fails when the request exceeds the
/// observed stored amount; `deposit` fails when the request exceeds free
/// capacity or would overflow the raw counter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StrictStore<S> {
    inner: S,
}

impl<S> StrictStore<S> {
    pub fn new(inner: S) -> Self {
        Self { inner }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    pub fn into_inner(self) -> S {
        self.inner
    }
}

impl<I: ItemKey, S: ItemStorage<I>> ItemStorage<I> for StrictStore<S> {
    fn capacity(&self, item: I) -> u64 {
        self.inner.capacity(item)
    }

    fn stored_amount(&self, item: I) -> u64 {
        self.inner.stored_amount(item)
    }

    fn free_capacity(&self, item: I) -> u64 {
        self.inner.free_capacity(item)
    }

    fn withdraw(&mut self, item: I, amount: u64) -> Result<u64, StoreError> {
        if amount == 0 {
            return Err(StoreError::ZeroAmount);
        }
        let available = self.inner.stored_amount(item);
        if amount > available {
            return Err(StoreError::InsufficientStock {
                requested: amount,
                available,
            });
        }
        self.inner.withdraw(item, amount)
    }

    fn deposit(&mut self, item: I, amount: u64) -> Result<u64, StoreError> {
        if amount == 0 {
            return Err(StoreError::ZeroAmount);
        }
        let free = self.inner.free_capacity(item);
        if amount > free {
            return Err(StoreError::InsufficientCapacity {
                requested: amount,
                free,
            });
        }
        if self.inner.stored_amount(item).checked_add(amount).is_none() {
            return Err(StoreError::AmountOverflow);
        }
        self.inner.deposit(item, amount)
    }
}
