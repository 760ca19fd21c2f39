//! Production lines: a pool of identical producers bound to one recipe.

use crate::recipe::Recipe;
use serde::{Deserialize, Serialize};

/// A pool of up to `total_producers` identical producers sharing one recipe,
/// one `active_producers` count and one `production_progress` counter.
///
/// Lines are owned by the collaborator and passed to the scheduler by
/// mutable slice; the scheduler mutates only `active_producers` and
/// `production_progress`.
///
/// Invariants (checked in scheduler debug mode):
/// - `active_producers <= total_producers`
/// - `production_progress <= recipe.duration`
/// - `active_producers == 0` implies `production_progress == 0`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductionLine<I> {
    pub recipe: Recipe<I>,
    /// Configured upper bound of concurrent producers.
    pub total_producers: u32,
    /// Producers currently holding ingredients and producing.
    pub active_producers: u32,
    /// Progress shared by every active producer of this line.
    pub production_progress: u32,
}

impl<I> ProductionLine<I> {
    /// A fresh, idle line.
    pub fn new(recipe: Recipe<I>, total_producers: u32) -> Self {
        Self {
            recipe,
            total_producers,
            active_producers: 0,
            production_progress: 0,
        }
    }

    pub fn is_idle(&self) -> bool {
        self.active_producers == 0
    }

    /// Structural invariant check. Returns a description of the first
    /// violated invariant, if any.
    pub fn check_invariants(&self) -> Result<(), &'static str> {
        if self.active_producers > self.total_producers {
            return Err("active producers exceed the configured pool");
        }
        if self.production_progress > self.recipe.duration {
            return Err("production progress exceeds the recipe duration");
        }
        if self.active_producers == 0 && self.production_progress != 0 {
            return Err("idle line carries production progress");
        }
        Ok(())
    }
}
