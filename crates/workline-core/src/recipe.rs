//! Recipe templates: what a production line consumes and produces.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors reported by [`Recipe::validate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum RecipeError {
    #[error("recipe must produce at least one result")]
    EmptyResults,
    #[error("ingredient and result amounts must be positive")]
    ZeroAmount,
    #[error("production duration must be positive")]
    ZeroDuration,
}

// ---------------------------------------------------------------------------
// Recipe types
// ---------------------------------------------------------------------------

/// An input requirement of a recipe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ingredient<I> {
    pub item: I,
    pub amount: u64,
}

/// An output product of a recipe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product<I> {
    pub item: I,
    pub amount: u64,
}

/// An immutable production template: ingredients go in, results come out,
/// one cycle takes `duration` ticks.
///
/// Ingredients may be empty ("raw" recipes that need no input, e.g. harvest
/// or mining lines). Results must be non-empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recipe<I> {
    pub ingredients: Vec<Ingredient<I>>,
    pub results: Vec<Product<I>>,
    /// Ticks for one full production cycle.
    pub duration: u32,
}

impl<I> Recipe<I> {
    pub fn new(ingredients: Vec<Ingredient<I>>, results: Vec<Product<I>>, duration: u32) -> Self {
        Self {
            ingredients,
            results,
            duration,
        }
    }

    /// A raw recipe consumes nothing and is started straight from free
    /// result capacity.
    pub fn is_raw(&self) -> bool {
        self.ingredients.is_empty()
    }

    /// Structural validation: non-empty results, positive amounts, positive
    /// duration.
    pub fn validate(&self) -> Result<(), RecipeError> {
        if self.results.is_empty() {
            return Err(RecipeError::EmptyResults);
        }
        if self.ingredients.iter().any(|i| i.amount == 0)
            || self.results.iter().any(|r| r.amount == 0)
        {
            return Err(RecipeError::ZeroAmount);
        }
        if self.duration == 0 {
            return Err(RecipeError::ZeroDuration);
        }
        Ok(())
    }
}
