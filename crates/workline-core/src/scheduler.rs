//! The step-wise production scheduler.
//!
//! # Step pipeline
//!
//! [`update`] advances the simulation one unit step at a time. Each step:
//!
//! 1. **Activate raw lines** -- idle lines with no ingredients start as many
//!    producers as their future output can fit.
//! 2. **Collect & partition demand** -- see [`crate::request`].
//! 3. **Start simple requests** -- guaranteed-full withdrawals.
//! 4. **Start satisfiable mixed requests** -- contested but fully covered.
//! 5. **Ration unsatisfiable groups** -- see [`crate::rationing`].
//! 6. **Advance** -- every active line gains one tick of progress; finished
//!    lines deposit results all-or-none per producer, or output-stall.
//! 7. **Offload pass** -- one more deposit attempt for stalled lines.
//!
//! Phases 3-5 must run in this order: each withdraws items the partition in
//! phase 2 accounted for against the pre-withdrawal store state.
//!
//! The scheduler holds no state of its own; everything lives on the lines
//! and the store. Non-debug runs never construct errors inside the
//! scheduler -- the only error surface is the store layer.

use crate::line::ProductionLine;
use crate::rationing::plan_rationing;
use crate::request::{
    collect_item_requests, grouped_unsatisfiable_item_requests,
    satisfiable_mixed_item_requests, simple_item_requests, ItemRequest,
};
use crate::store::{ItemKey, ItemStorage, StoreError};
use crate::units::Ticks;
use std::collections::{BTreeMap, BTreeSet};

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors surfaced by [`update`]. The invariant variants fire only in debug
/// mode; store failures pass through unchanged.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SchedulerError {
    #[error("time delta must be a positive number of ticks")]
    InvalidTimeDelta,
    #[error("scheduler invariant violated: {0}")]
    InvariantViolated(&'static str),
    #[error(transparent)]
    Store(#[from] StoreError),
}

// ---------------------------------------------------------------------------
// update
// ---------------------------------------------------------------------------

/// Advance every line by `time_delta` unit steps against the store.
///
/// Returns the unconsumed remainder of the delta, which is always 0 with
/// unit steps; the return value exists for future sub-step support.
///
/// With `debug` set, a zero delta is rejected and every internal
/// inconsistency (malformed simple request, short withdrawal or deposit,
/// broken per-line invariant) fails the call instead of being absorbed.
pub fn update<I, S>(
    lines: &mut [ProductionLine<I>],
    store: &mut S,
    time_delta: Ticks,
    debug: bool,
) -> Result<Ticks, SchedulerError>
where
    I: ItemKey,
    S: ItemStorage<I>,
{
    if debug && time_delta == 0 {
        return Err(SchedulerError::InvalidTimeDelta);
    }
    for _ in 0..time_delta {
        step(lines, store, debug)?;
    }
    Ok(0)
}

fn step<I, S>(
    lines: &mut [ProductionLine<I>],
    store: &mut S,
    debug: bool,
) -> Result<(), SchedulerError>
where
    I: ItemKey,
    S: ItemStorage<I>,
{
    activate_raw_lines(lines, store);

    let requests = collect_item_requests(lines, store);
    let simple = simple_item_requests(&requests, lines);
    let satisfiable = satisfiable_mixed_item_requests(&requests, &simple, lines, store);
    let groups = grouped_unsatisfiable_item_requests(&requests, &simple, &satisfiable, lines);

    start_simple(lines, store, &requests, &simple, debug)?;
    start_satisfiable(lines, store, &requests, &satisfiable, debug)?;
    for group in &groups {
        start_rationed(lines, store, group, debug)?;
    }

    advance(lines, store, debug)?;
    offload_stalled(lines, store, debug)?;

    if debug {
        for line in lines.iter() {
            line.check_invariants()
                .map_err(SchedulerError::InvariantViolated)?;
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Activation phases
// ---------------------------------------------------------------------------

/// Start idle no-ingredient lines. Producer count is capped by the room
/// their future output needs, so a full cycle can always be deposited when
/// capacities stay put.
fn activate_raw_lines<I, S>(lines: &mut [ProductionLine<I>], store: &S)
where
    I: ItemKey,
    S: ItemStorage<I>,
{
    for line in lines.iter_mut() {
        if line.active_producers != 0 || !line.recipe.is_raw() {
            continue;
        }
        let handleable = line
            .recipe
            .results
            .iter()
            .map(|r| store.free_capacity(r.item) / r.amount.max(1))
            .min()
            .unwrap_or(0);
        line.active_producers = handleable.min(u64::from(line.total_producers)) as u32;
    }
}

fn start_simple<I, S>(
    lines: &mut [ProductionLine<I>],
    store: &mut S,
    all: &BTreeMap<I, ItemRequest>,
    simple: &BTreeSet<I>,
    debug: bool,
) -> Result<(), SchedulerError>
where
    I: ItemKey,
    S: ItemStorage<I>,
{
    for &item in simple {
        let Some(request) = all.get(&item) else {
            continue;
        };
        if debug
            && (request.productions.len() != 1
                || request.productions[0].requested_amount != request.total_requested_amount)
        {
            return Err(SchedulerError::InvariantViolated(
                "simple request must hold exactly one entry",
            ));
        }
        let Some(entry) = request.productions.first() else {
            continue;
        };
        if entry.requested_amount > 0 {
            let withdrawn = store.withdraw(item, entry.requested_amount)?;
            if debug && withdrawn < entry.requested_amount {
                return Err(SchedulerError::InvariantViolated(
                    "simple withdrawal came up short",
                ));
            }
        }
        lines[entry.line].active_producers = entry.requested_producers;
    }
    Ok(())
}

fn start_satisfiable<I, S>(
    lines: &mut [ProductionLine<I>],
    store: &mut S,
    all: &BTreeMap<I, ItemRequest>,
    satisfiable: &BTreeSet<I>,
    debug: bool,
) -> Result<(), SchedulerError>
where
    I: ItemKey,
    S: ItemStorage<I>,
{
    for &item in satisfiable {
        let Some(request) = all.get(&item) else {
            continue;
        };
        for entry in &request.productions {
            if entry.requested_amount > 0 {
                let withdrawn = store.withdraw(item, entry.requested_amount)?;
                if debug && withdrawn < entry.requested_amount {
                    return Err(SchedulerError::InvariantViolated(
                        "satisfiable withdrawal came up short",
                    ));
                }
            }
            // Every entry of the same line carries the same producer count.
            lines[entry.line].active_producers = entry.requested_producers;
        }
    }
    Ok(())
}

fn start_rationed<I, S>(
    lines: &mut [ProductionLine<I>],
    store: &mut S,
    group: &BTreeMap<I, ItemRequest>,
    debug: bool,
) -> Result<(), SchedulerError>
where
    I: ItemKey,
    S: ItemStorage<I>,
{
    let plan = plan_rationing(group, store);
    for &(index, producers) in &plan.activations {
        if producers == 0 {
            continue;
        }
        for ing in &lines[index].recipe.ingredients {
            let amount = ing.amount.saturating_mul(u64::from(producers));
            if amount == 0 {
                continue;
            }
            let withdrawn = store.withdraw(ing.item, amount)?;
            if debug && withdrawn < amount {
                return Err(SchedulerError::InvariantViolated(
                    "rationed withdrawal came up short",
                ));
            }
        }
        lines[index].active_producers = producers;
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Advance & deposit
// ---------------------------------------------------------------------------

/// Give every active line one tick of progress; deposit at completion.
fn advance<I, S>(
    lines: &mut [ProductionLine<I>],
    store: &mut S,
    debug: bool,
) -> Result<(), SchedulerError>
where
    I: ItemKey,
    S: ItemStorage<I>,
{
    for line in lines.iter_mut() {
        if line.active_producers == 0 {
            continue;
        }
        line.production_progress = line
            .production_progress
            .saturating_add(1)
            .min(line.recipe.duration);
        if line.production_progress == line.recipe.duration {
            deposit_results(line, store, debug)?;
        }
    }
    Ok(())
}

/// One more deposit attempt for lines still holding finished output, using
/// the same all-or-none rule but without touching progress.
fn offload_stalled<I, S>(
    lines: &mut [ProductionLine<I>],
    store: &mut S,
    debug: bool,
) -> Result<(), SchedulerError>
where
    I: ItemKey,
    S: ItemStorage<I>,
{
    for line in lines.iter_mut() {
        if line.active_producers > 0 && line.production_progress == line.recipe.duration {
            deposit_results(line, store, debug)?;
        }
    }
    Ok(())
}

/// Deposit as many finished producers' results as fit, all-or-none per
/// producer. A line that cannot offload anything stays output-stalled at
/// full progress; a fully offloaded line resets to idle.
fn deposit_results<I, S>(
    line: &mut ProductionLine<I>,
    store: &mut S,
    debug: bool,
) -> Result<(), SchedulerError>
where
    I: ItemKey,
    S: ItemStorage<I>,
{
    let admissible = line
        .recipe
        .results
        .iter()
        .map(|r| store.free_capacity(r.item) / r.amount.max(1))
        .min()
        .unwrap_or(0)
        .min(u64::from(line.active_producers)) as u32;
    if admissible == 0 {
        return Ok(());
    }

    for r in &line.recipe.results {
        let amount = r.amount.saturating_mul(u64::from(admissible));
        if amount == 0 {
            continue;
        }
        let deposited = store.deposit(r.item, amount)?;
        if debug && deposited < amount {
            return Err(SchedulerError::InvariantViolated(
                "result deposit came up short",
            ));
        }
    }

    line.active_producers -= admissible;
    if line.active_producers == 0 {
        line.production_progress = 0;
    }
    Ok(())
}
