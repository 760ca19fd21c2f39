//! Per-item capacity and stored-amount bookkeeping.
//!
//! [`ItemStore`] keeps a raw stored amount per item and clamps every
//! observation against the current capacity: `stored_amount = min(raw,
//! capacity)`. Shrinking a capacity below the raw amount hides the excess;
//! growing it again re-exposes the hidden remainder. Capacity manipulation
//! is the caller's lever, so the store never deletes overflow on its own.
//!
//! [`ItemStorage`] is the capability seam shared by the plain store and the
//! strict decorator in [`crate::strict`].

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::Debug;
use std::hash::Hash;

// ---------------------------------------------------------------------------
// Item key bound
// ---------------------------------------------------------------------------

/// Caller-supplied item identifiers: cheap to copy, hashable, and totally
/// ordered so map iteration stays deterministic across runs.
pub trait ItemKey: Copy + Eq + Ord + Hash + Debug {}

impl<T: Copy + Eq + Ord + Hash + Debug> ItemKey for T {}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors produced by the store layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("amount must be positive")]
    ZeroAmount,
    #[error("insufficient stock: requested {requested}, available {available}")]
    InsufficientStock { requested: u64, available: u64 },
    #[error("insufficient free capacity: requested {requested}, free {free}")]
    InsufficientCapacity { requested: u64, free: u64 },
    #[error("stored amount would overflow")]
    AmountOverflow,
}

// ---------------------------------------------------------------------------
// Storage capability
// ---------------------------------------------------------------------------

/// The storage capability the scheduler runs against. Implemented by
/// [`ItemStore`] and by [`crate::strict::StrictStore`].
pub trait ItemStorage<I: ItemKey> {
    /// Current capacity for an item. Unknown items report 0.
    fn capacity(&self, item: I) -> u64;

    /// Observed stored amount: raw stored amount clamped by capacity.
    fn stored_amount(&self, item: I) -> u64;

    /// Room left for an item: `capacity - stored_amount`, floored at 0.
    fn free_capacity(&self, item: I) -> u64 {
        self.capacity(item).saturating_sub(self.stored_amount(item))
    }

    /// Take up to `amount` of an item out of storage. Returns the amount
    /// actually withdrawn. `amount` must be positive.
    fn withdraw(&mut self, item: I, amount: u64) -> Result<u64, StoreError>;

    /// Put up to `amount` of an item into storage. Returns the amount
    /// actually deposited. `amount` must be positive.
    fn deposit(&mut self, item: I, amount: u64) -> Result<u64, StoreError>;
}

// ---------------------------------------------------------------------------
// ItemStore
// ---------------------------------------------------------------------------

/// The plain item store. Withdrawals and deposits clamp silently against
/// availability and free capacity; see [`crate::strict::StrictStore`] for
/// the hard-failing variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemStore<I: Ord> {
    capacities: BTreeMap<I, u64>,
    raw: BTreeMap<I, u64>,
}

impl<I: ItemKey> ItemStore<I> {
    /// Create a store from per-item capacities. Every capacity key starts
    /// with a raw stored amount of 0. Items absent from the map are unknown
    /// until [`ItemStore::set_capacity`] introduces them.
    pub fn new(capacities: BTreeMap<I, u64>) -> Self {
        let raw = capacities.keys().map(|&item| (item, 0)).collect();
        Self { capacities, raw }
    }

    /// Current capacity settings, observed live by every query.
    pub fn capacities(&self) -> &BTreeMap<I, u64> {
        &self.capacities
    }

    /// Change an item's capacity between scheduler calls. Introducing a new
    /// item starts it at raw 0. Shrinking below the raw stored amount hides
    /// the excess without deleting it.
    pub fn set_capacity(&mut self, item: I, capacity: u64) {
        self.capacities.insert(item, capacity);
        self.raw.entry(item).or_insert(0);
    }

    /// The raw stored amount, ignoring the capacity clamp. Exposed for
    /// inspection; scheduling code goes through `stored_amount`.
    pub fn raw_stored(&self, item: I) -> u64 {
        self.raw.get(&item).copied().unwrap_or(0)
    }
}

impl<I: ItemKey> ItemStorage<I> for ItemStore<I> {
    fn capacity(&self, item: I) -> u64 {
        self.capacities.get(&item).copied().unwrap_or(0)
    }

    fn stored_amount(&self, item: I) -> u64 {
        self.raw_stored(item).min(self.capacity(item))
    }

    fn withdraw(&mut self, item: I, amount: u64) -> Result<u64, StoreError> {
        if amount == 0 {
            return Err(StoreError::ZeroAmount);
        }
        let withdrawn = amount.min(self.stored_amount(item));
        if withdrawn > 0 {
            if let Some(raw) = self.raw.get_mut(&item) {
                *raw -= withdrawn;
            }
        }
        Ok(withdrawn)
    }

    fn deposit(&mut self, item: I, amount: u64) -> Result<u64, StoreError> {
        if amount == 0 {
            return Err(StoreError::ZeroAmount);
        }
        let deposited = amount.min(self.free_capacity(item));
        if deposited > 0 {
            if let Some(raw) = self.raw.get_mut(&item) {
                *raw = raw.saturating_add(deposited);
            }
        }
        Ok(deposited)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store(entries: &[(u32, u64)]) -> ItemStore<u32> {
        ItemStore::new(entries.iter().copied().collect())
    }

    #[test]
    fn deposit_then_withdraw_round_trip() {
        let mut s = store(&[(0, 100)]);
        assert_eq!(s.deposit(0, 40), Ok(40));
        assert_eq!(s.stored_amount(0), 40);
        assert_eq!(s.withdraw(0, 40), Ok(40));
        assert_eq!(s.stored_amount(0), 0);
        // Repeating leaves state unchanged.
        assert_eq!(s.deposit(0, 40), Ok(40));
        assert_eq!(s.withdraw(0, 40), Ok(40));
        assert_eq!(s.stored_amount(0), 0);
    }

    #[test]
    fn deposit_clamps_to_free_capacity() {
        let mut s = store(&[(0, 10)]);
        assert_eq!(s.deposit(0, 15), Ok(10));
        assert_eq!(s.stored_amount(0), 10);
        assert_eq!(s.free_capacity(0), 0);
    }

    #[test]
    fn withdraw_clamps_to_stored() {
        let mut s = store(&[(0, 100)]);
        s.deposit(0, 5).unwrap();
        assert_eq!(s.withdraw(0, 10), Ok(5));
        assert_eq!(s.stored_amount(0), 0);
    }

    #[test]
    fn zero_amount_is_rejected() {
        let mut s = store(&[(0, 100)]);
        assert_eq!(s.withdraw(0, 0), Err(StoreError::ZeroAmount));
        assert_eq!(s.deposit(0, 0), Err(StoreError::ZeroAmount));
    }

    #[test]
    fn unknown_item_operations_return_zero() {
        let mut s = store(&[(0, 100)]);
        assert_eq!(s.stored_amount(99), 0);
        assert_eq!(s.free_capacity(99), 0);
        assert_eq!(s.deposit(99, 5), Ok(0));
        assert_eq!(s.withdraw(99, 5), Ok(0));
    }

    #[test]
    fn capacity_shrink_hides_raw_and_growth_re_exposes_it() {
        let mut s = store(&[(0, 100)]);
        s.deposit(0, 80).unwrap();

        s.set_capacity(0, 30);
        assert_eq!(s.stored_amount(0), 30);
        assert_eq!(s.raw_stored(0), 80);
        assert_eq!(s.free_capacity(0), 0);

        s.set_capacity(0, 60);
        assert_eq!(s.stored_amount(0), 60);

        s.set_capacity(0, 100);
        assert_eq!(s.stored_amount(0), 80);
        assert_eq!(s.free_capacity(0), 20);
    }

    #[test]
    fn withdraw_under_shrunk_capacity_follows_the_clamp() {
        let mut s = store(&[(0, 100)]);
        s.deposit(0, 80).unwrap();
        s.set_capacity(0, 30);

        // Only the observed 30 can come out; the hidden 50 stays raw.
        assert_eq!(s.withdraw(0, 80), Ok(30));
        assert_eq!(s.raw_stored(0), 50);
        assert_eq!(s.stored_amount(0), 30);
    }

    #[test]
    fn set_capacity_introduces_unknown_items() {
        let mut s = store(&[]);
        assert_eq!(s.deposit(7, 5), Ok(0));
        s.set_capacity(7, 50);
        assert_eq!(s.deposit(7, 5), Ok(5));
        assert_eq!(s.stored_amount(7), 5);
    }

    #[test]
    fn zero_capacity_is_allowed() {
        let mut s = store(&[(0, 0)]);
        assert_eq!(s.capacity(0), 0);
        assert_eq!(s.deposit(0, 1), Ok(0));
    }
}
