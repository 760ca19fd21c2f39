//! Shared fixtures for unit tests, integration tests and benchmarks.
//!
//! Gated behind `#[cfg(any(test, feature = "test-utils"))]` so the helpers
//! are available to unit tests directly and to `tests/`/`benches/` through
//! the `test-utils` feature.
//!
//! The fixture economy is a small carpentry chain: harvested trunks are
//! milled into planks and bark, planks become nails, and planks + nails +
//! bark become tables.

use crate::line::ProductionLine;
use crate::recipe::{Ingredient, Product, Recipe};
use crate::store::{ItemStore, ItemStorage};
use serde::{Deserialize, Serialize};

// ===========================================================================
// Materials
// ===========================================================================

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum Material {
    TreeTrunk,
    WoodPlank,
    TreeBark,
    WoodenNail,
    Table,
}

impl Material {
    pub const ALL: [Material; 5] = [
        Material::TreeTrunk,
        Material::WoodPlank,
        Material::TreeBark,
        Material::WoodenNail,
        Material::Table,
    ];
}

// ===========================================================================
// Recipe constructors
// ===========================================================================

pub fn recipe(
    ingredients: &[(Material, u64)],
    results: &[(Material, u64)],
    duration: u32,
) -> Recipe<Material> {
    Recipe::new(
        ingredients
            .iter()
            .map(|&(item, amount)| Ingredient { item, amount })
            .collect(),
        results
            .iter()
            .map(|&(item, amount)| Product { item, amount })
            .collect(),
        duration,
    )
}

pub fn line_for(recipe: Recipe<Material>, total_producers: u32) -> ProductionLine<Material> {
    ProductionLine::new(recipe, total_producers)
}

// ===========================================================================
// Carpentry lines
// ===========================================================================

/// Raw harvest: nothing -> 1 trunk, 16 ticks.
pub fn tree_harvest(total_producers: u32) -> ProductionLine<Material> {
    line_for(recipe(&[], &[(Material::TreeTrunk, 1)], 16), total_producers)
}

/// 1 trunk -> 8 planks + 16 bark, 4 ticks.
pub fn trunk_mill(total_producers: u32) -> ProductionLine<Material> {
    line_for(
        recipe(
            &[(Material::TreeTrunk, 1)],
            &[(Material::WoodPlank, 8), (Material::TreeBark, 16)],
            4,
        ),
        total_producers,
    )
}

/// 1 plank -> 24 nails, 1 tick.
pub fn nail_press(total_producers: u32) -> ProductionLine<Material> {
    line_for(
        recipe(&[(Material::WoodPlank, 1)], &[(Material::WoodenNail, 24)], 1),
        total_producers,
    )
}

/// 6 planks + 12 nails + 4 bark -> 1 table, 16 ticks.
pub fn table_shop(total_producers: u32) -> ProductionLine<Material> {
    line_for(
        recipe(
            &[
                (Material::WoodPlank, 6),
                (Material::WoodenNail, 12),
                (Material::TreeBark, 4),
            ],
            &[(Material::Table, 1)],
            16,
        ),
        total_producers,
    )
}

// ===========================================================================
// Store constructors
// ===========================================================================

/// A store with the given capacity for every material and nothing stored.
pub fn empty_store(capacity: u64) -> ItemStore<Material> {
    ItemStore::new(Material::ALL.iter().map(|&m| (m, capacity)).collect())
}

/// A store with the given capacity for every material, pre-loaded with the
/// given contents.
pub fn store_with(capacity: u64, contents: &[(Material, u64)]) -> ItemStore<Material> {
    let mut store = empty_store(capacity);
    for &(item, amount) in contents {
        let deposited = store.deposit(item, amount).unwrap();
        assert_eq!(deposited, amount, "fixture contents must fit the capacity");
    }
    store
}
