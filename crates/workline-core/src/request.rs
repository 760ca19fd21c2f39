//! Per-item demand collection and classification.
//!
//! At the start of a scheduling step, every idle line that could start at
//! least one producer files a request for each of its ingredients. The
//! resulting per-item tabulation is partitioned three ways:
//!
//! - **simple** -- an item wanted by exactly one line whose every ingredient
//!   is wanted by that same line alone. Withdrawable as-is.
//! - **satisfiable mixed** -- contested items where every touching line
//!   could still receive all of its ingredients in full from storage.
//! - **unsatisfiable mixed** -- everything else, grouped into connected
//!   components over shared ingredients and rationed proportionally
//!   (see [`crate::rationing`]).
//!
//! All four functions are pure: they read lines and storage but mutate
//! nothing, so callers can inspect scheduling decisions before they land.
//! Iteration is over `BTreeMap`/`BTreeSet`, keeping every partition
//! deterministic for identical inputs.

use crate::line::ProductionLine;
use crate::store::{ItemKey, ItemStorage};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

// ---------------------------------------------------------------------------
// Request types
// ---------------------------------------------------------------------------

/// One line's share of the demand for a single item. Lines are referenced
/// by their index in the slice handed to the scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductionRequest {
    /// Index of the requesting line.
    pub line: usize,
    /// Item amount wanted by that line this step.
    pub requested_amount: u64,
    /// Producers the line would start if the amount arrives in full.
    pub requested_producers: u32,
}

/// All demand for a single item in this step, in line iteration order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemRequest {
    pub productions: Vec<ProductionRequest>,
    pub total_requested_amount: u64,
}

// ---------------------------------------------------------------------------
// Collection
// ---------------------------------------------------------------------------

/// Tabulate per-item demand over all idle lines.
///
/// A line contributes when its progress is 0, it has ingredients, and the
/// largest producer count that is simultaneously ingredient-sustainable,
/// result-handleable, and within the pool is at least 1. Raw lines (no
/// ingredients) never file requests; the scheduler starts them directly
/// from free result capacity.
pub fn collect_item_requests<I, S>(
    lines: &[ProductionLine<I>],
    store: &S,
) -> BTreeMap<I, ItemRequest>
where
    I: ItemKey,
    S: ItemStorage<I>,
{
    let mut requests: BTreeMap<I, ItemRequest> = BTreeMap::new();

    for (index, line) in lines.iter().enumerate() {
        if line.production_progress != 0 || line.recipe.is_raw() {
            continue;
        }

        let sustainable = line
            .recipe
            .ingredients
            .iter()
            .map(|ing| store.stored_amount(ing.item) / ing.amount.max(1))
            .min()
            .unwrap_or(u64::MAX);

        let handleable = line
            .recipe
            .results
            .iter()
            .map(|r| store.free_capacity(r.item) / r.amount.max(1))
            .min()
            .unwrap_or(0);

        let max_safe = sustainable
            .min(handleable)
            .min(u64::from(line.total_producers));
        if max_safe == 0 {
            continue;
        }
        let producers = max_safe as u32;

        for ing in &line.recipe.ingredients {
            let requested = ing.amount.saturating_mul(u64::from(producers));
            let entry = requests.entry(ing.item).or_default();
            entry.productions.push(ProductionRequest {
                line: index,
                requested_amount: requested,
                requested_producers: producers,
            });
            entry.total_requested_amount =
                entry.total_requested_amount.saturating_add(requested);
        }
    }

    requests
}

// ---------------------------------------------------------------------------
// Simple requests
// ---------------------------------------------------------------------------

/// Items wanted by exactly one line whose every ingredient is also wanted
/// by that line alone: a connected component of a single line. These
/// withdrawals are guaranteed to succeed in full.
pub fn simple_item_requests<I: ItemKey>(
    all: &BTreeMap<I, ItemRequest>,
    lines: &[ProductionLine<I>],
) -> BTreeSet<I> {
    let mut simple = BTreeSet::new();

    for (&item, request) in all {
        if request.productions.len() != 1 {
            continue;
        }
        let owner = request.productions[0].line;

        let unshared = lines[owner].recipe.ingredients.iter().all(|ing| {
            all.get(&ing.item)
                .is_some_and(|r| r.productions.len() == 1 && r.productions[0].line == owner)
        });
        if unshared {
            simple.insert(item);
        }
    }

    simple
}

// ---------------------------------------------------------------------------
// Satisfiable mixed requests
// ---------------------------------------------------------------------------

/// Contested items whose every touching line could still receive all of its
/// ingredients in full: for each line in the item's request list, each of
/// that line's ingredients has a request whose total demand fits within the
/// currently stored amount.
pub fn satisfiable_mixed_item_requests<I, S>(
    all: &BTreeMap<I, ItemRequest>,
    simple: &BTreeSet<I>,
    lines: &[ProductionLine<I>],
    store: &S,
) -> BTreeSet<I>
where
    I: ItemKey,
    S: ItemStorage<I>,
{
    let mut satisfiable = BTreeSet::new();

    for (&item, request) in all {
        if simple.contains(&item) {
            continue;
        }
        let covered = request.productions.iter().all(|p| {
            lines[p.line].recipe.ingredients.iter().all(|ing| {
                all.get(&ing.item)
                    .is_some_and(|r| store.stored_amount(ing.item) >= r.total_requested_amount)
            })
        });
        if covered {
            satisfiable.insert(item);
        }
    }

    satisfiable
}

// ---------------------------------------------------------------------------
// Unsatisfiable groups
// ---------------------------------------------------------------------------

/// Partition the remaining requests into connected components.
///
/// Two items belong together when some requesting line has both among its
/// ingredients, transitively closed. Each component seed is the smallest
/// remaining item key; the seed set is expanded with the ingredients of
/// every line mentioned in the current seed's requests until it stops
/// growing, then extracted.
pub fn grouped_unsatisfiable_item_requests<I: ItemKey>(
    all: &BTreeMap<I, ItemRequest>,
    simple: &BTreeSet<I>,
    satisfiable: &BTreeSet<I>,
    lines: &[ProductionLine<I>],
) -> Vec<BTreeMap<I, ItemRequest>> {
    let mut remaining: BTreeMap<I, ItemRequest> = all
        .iter()
        .filter(|(item, _)| !simple.contains(item) && !satisfiable.contains(item))
        .map(|(&item, request)| (item, request.clone()))
        .collect();

    let mut groups = Vec::new();

    while let Some(&seed_item) = remaining.keys().next() {
        let mut seed: BTreeSet<I> = BTreeSet::new();
        seed.insert(seed_item);

        loop {
            let mut grew = false;
            for item in seed.iter().copied().collect::<Vec<_>>() {
                let Some(request) = remaining.get(&item) else {
                    continue;
                };
                for p in &request.productions {
                    for ing in &lines[p.line].recipe.ingredients {
                        grew |= seed.insert(ing.item);
                    }
                }
            }
            if !grew {
                break;
            }
        }

        let mut group = BTreeMap::new();
        for item in seed {
            if let Some(request) = remaining.remove(&item) {
                group.insert(item, request);
            }
        }
        groups.push(group);
    }

    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::ItemStore;
    use crate::test_utils::*;

    fn requests_for(
        lines: &[ProductionLine<Material>],
        store: &ItemStore<Material>,
    ) -> BTreeMap<Material, ItemRequest> {
        collect_item_requests(lines, store)
    }

    #[test]
    fn lone_line_files_a_simple_request() {
        let lines = vec![trunk_mill(128)];
        let store = store_with(1024, &[(Material::TreeTrunk, 32)]);

        let all = requests_for(&lines, &store);
        assert_eq!(all.len(), 1);
        let req = &all[&Material::TreeTrunk];
        assert_eq!(req.productions.len(), 1);
        // Ingredient-limited: 32 trunks sustain 32 producers of the 128 pool.
        assert_eq!(req.productions[0].requested_producers, 32);
        assert_eq!(req.productions[0].requested_amount, 32);
        assert_eq!(req.total_requested_amount, 32);

        let simple = simple_item_requests(&all, &lines);
        assert!(simple.contains(&Material::TreeTrunk));
    }

    #[test]
    fn result_capacity_limits_the_request() {
        let lines = vec![trunk_mill(128)];
        let mut store = store_with(1024, &[(Material::TreeTrunk, 32)]);
        // Only 80 bark fit; 80 / 16 = 5 producers are result-handleable.
        store.set_capacity(Material::TreeBark, 80);

        let all = requests_for(&lines, &store);
        assert_eq!(all[&Material::TreeTrunk].productions[0].requested_producers, 5);
    }

    #[test]
    fn busy_and_raw_lines_file_nothing() {
        let mut busy = trunk_mill(128);
        busy.active_producers = 4;
        busy.production_progress = 2;
        let lines = vec![busy, tree_harvest(4)];
        let store = store_with(1024, &[(Material::TreeTrunk, 32)]);

        assert!(requests_for(&lines, &store).is_empty());
    }

    #[test]
    fn starved_line_is_skipped() {
        let lines = vec![table_shop(128)];
        // Plenty of planks and bark but no nails: max sustainable is 0.
        let store = store_with(
            1024,
            &[(Material::WoodPlank, 600), (Material::TreeBark, 400)],
        );

        assert!(requests_for(&lines, &store).is_empty());
    }

    #[test]
    fn contested_ingredient_is_not_simple() {
        let lines = vec![nail_press(128), table_shop(128)];
        let store = store_with(
            1024,
            &[
                (Material::WoodPlank, 6),
                (Material::WoodenNail, 12),
                (Material::TreeBark, 64),
            ],
        );

        let all = requests_for(&lines, &store);
        // Plank is wanted by both lines; nail and bark only by the table
        // shop, but the shop also wants the contested plank.
        assert_eq!(all[&Material::WoodPlank].productions.len(), 2);
        assert_eq!(all[&Material::WoodPlank].total_requested_amount, 12);

        let simple = simple_item_requests(&all, &lines);
        assert!(simple.is_empty());
    }

    #[test]
    fn covered_contention_is_satisfiable() {
        let lines = vec![nail_press(6), table_shop(128)];
        let store = store_with(
            1024,
            &[
                (Material::WoodPlank, 12),
                (Material::WoodenNail, 12),
                (Material::TreeBark, 64),
            ],
        );

        let all = requests_for(&lines, &store);
        // Press wants 6 planks (pool-limited), shop wants 6: total 12 fits.
        assert_eq!(all[&Material::WoodPlank].total_requested_amount, 12);

        let simple = simple_item_requests(&all, &lines);
        let satisfiable = satisfiable_mixed_item_requests(&all, &simple, &lines, &store);
        assert!(satisfiable.contains(&Material::WoodPlank));
        assert!(satisfiable.contains(&Material::WoodenNail));
        assert!(satisfiable.contains(&Material::TreeBark));
    }

    #[test]
    fn short_contention_is_unsatisfiable_and_groups_transitively() {
        let lines = vec![nail_press(128), table_shop(128)];
        let store = store_with(
            1024,
            &[
                (Material::WoodPlank, 6),
                (Material::WoodenNail, 12),
                (Material::TreeBark, 64),
            ],
        );

        let all = requests_for(&lines, &store);
        let simple = simple_item_requests(&all, &lines);
        let satisfiable = satisfiable_mixed_item_requests(&all, &simple, &lines, &store);
        assert!(satisfiable.is_empty());

        let groups = grouped_unsatisfiable_item_requests(&all, &simple, &satisfiable, &lines);
        // Plank is short; nail and bark ride along through the table shop.
        assert_eq!(groups.len(), 1);
        let group = &groups[0];
        assert!(group.contains_key(&Material::WoodPlank));
        assert!(group.contains_key(&Material::WoodenNail));
        assert!(group.contains_key(&Material::TreeBark));
    }

    #[test]
    fn independent_shortages_form_separate_groups() {
        // Two disjoint contention clusters: planks fought over by two
        // plank-only consumers, trunks fought over by two trunk-only ones.
        let plank_a = line_for(
            recipe(
                &[(Material::WoodPlank, 2)],
                &[(Material::Table, 1)],
                4,
            ),
            8,
        );
        let plank_b = line_for(
            recipe(
                &[(Material::WoodPlank, 3)],
                &[(Material::WoodenNail, 1)],
                4,
            ),
            8,
        );
        let trunk_a = line_for(
            recipe(&[(Material::TreeTrunk, 2)], &[(Material::TreeBark, 1)], 4),
            8,
        );
        let trunk_b = trunk_mill(8);
        let lines = vec![plank_a, plank_b, trunk_a, trunk_b];
        let store = store_with(
            1024,
            &[(Material::WoodPlank, 7), (Material::TreeTrunk, 5)],
        );

        let all = requests_for(&lines, &store);
        let simple = simple_item_requests(&all, &lines);
        let satisfiable = satisfiable_mixed_item_requests(&all, &simple, &lines, &store);
        let groups = grouped_unsatisfiable_item_requests(&all, &simple, &satisfiable, &lines);

        assert_eq!(groups.len(), 2);
        let trunk_group = groups
            .iter()
            .find(|g| g.contains_key(&Material::TreeTrunk))
            .unwrap();
        assert!(!trunk_group.contains_key(&Material::WoodPlank));
    }

    #[test]
    fn insertion_order_of_entries_follows_line_order() {
        let lines = vec![table_shop(128), nail_press(128)];
        let store = store_with(
            1024,
            &[
                (Material::WoodPlank, 6),
                (Material::WoodenNail, 12),
                (Material::TreeBark, 64),
            ],
        );

        let all = requests_for(&lines, &store);
        let entries = &all[&Material::WoodPlank].productions;
        assert_eq!(entries[0].line, 0);
        assert_eq!(entries[1].line, 1);
    }
}
