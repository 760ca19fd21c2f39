//! Proportional rationing of unsatisfiable request groups.
//!
//! When a connected group of item requests cannot be met in full, every
//! competing line is scaled down by the same factor: the smallest
//! stored-to-demanded ratio across the group's items. Producers are
//! integral, so the scaled count is floored; slack from the floor idles
//! for this step.
//!
//! The limiting ratio is kept as an exact fraction and applied with u128
//! integer arithmetic, so the plan is bit-for-bit reproducible. The
//! fixed-point view exists only for reporting.

use crate::request::ItemRequest;
use crate::store::{ItemKey, ItemStorage};
use crate::units::Fixed64;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

// ---------------------------------------------------------------------------
// Ration ratio
// ---------------------------------------------------------------------------

/// The limiting stored-to-demanded fraction of a rationed group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RationRatio {
    pub stored: u64,
    pub demanded: u64,
}

impl RationRatio {
    /// The neutral ratio: demand fully covered.
    pub const FULL: Self = Self {
        stored: 1,
        demanded: 1,
    };

    /// True when this fraction is strictly smaller than `other`.
    /// Compared by cross-multiplication; no rounding.
    pub fn lt(&self, other: &Self) -> bool {
        u128::from(self.stored) * u128::from(other.demanded)
            < u128::from(other.stored) * u128::from(self.demanded)
    }

    /// `floor(count * stored / demanded)`, saturating at the input count.
    pub fn scale(&self, count: u32) -> u32 {
        if self.demanded == 0 {
            return 0;
        }
        let scaled = u128::from(count) * u128::from(self.stored) / u128::from(self.demanded);
        scaled.min(u128::from(count)) as u32
    }

    /// Fixed-point view for reports. Saturates at 1.0, which the limiting
    /// ratio of a genuinely unsatisfiable group never reaches.
    pub fn to_fixed(&self) -> Fixed64 {
        if self.demanded == 0 {
            return Fixed64::from_num(0);
        }
        let bits = (u128::from(self.stored) << 32) / u128::from(self.demanded);
        Fixed64::from_bits(bits.min(1u128 << 32) as i64)
    }
}

// ---------------------------------------------------------------------------
// Ration plan
// ---------------------------------------------------------------------------

/// The outcome of rationing one unsatisfiable group: the limiting ratio and
/// the producer count granted to each competing line (possibly 0). Entries
/// follow the group's deterministic iteration order, one per line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RationPlan {
    pub ratio: RationRatio,
    pub activations: Vec<(usize, u32)>,
}

/// Compute the proportional plan for one request group.
///
/// The ratio is the minimum of `stored / total_requested` over the group's
/// items, read from the store at call time; each line appearing in the
/// group is granted `floor(requested_producers * ratio)` producers. Lines
/// appearing under several items carry the same requested count, so the
/// first occurrence wins.
pub fn plan_rationing<I, S>(
    group: &BTreeMap<I, ItemRequest>,
    store: &S,
) -> RationPlan
where
    I: ItemKey,
    S: ItemStorage<I>,
{
    let mut ratio = RationRatio::FULL;
    for (&item, request) in group {
        let candidate = RationRatio {
            stored: store.stored_amount(item),
            demanded: request.total_requested_amount.max(1),
        };
        if candidate.lt(&ratio) {
            ratio = candidate;
        }
    }

    let mut planned: BTreeSet<usize> = BTreeSet::new();
    let mut activations = Vec::new();
    for request in group.values() {
        for p in &request.productions {
            if planned.insert(p.line) {
                activations.push((p.line, ratio.scale(p.requested_producers)));
            }
        }
    }

    RationPlan { ratio, activations }
}
