//! Diagnostic views over lines and storage.
//!
//! The scheduler itself is silent; when a line is not producing, these
//! helpers explain why. Always available (not feature-gated).

use crate::line::ProductionLine;
use crate::store::{ItemKey, ItemStorage};
use serde::{Deserialize, Serialize};

/// Externally observable state of a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LineState {
    Idle,
    Working { progress: u32 },
    /// Finished producers are holding output that storage cannot take yet.
    OutputStalled,
}

/// Why an idle line did not start this step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IdleReason {
    /// The configured pool is empty.
    NoProducers,
    /// Storage cannot feed even a single producer.
    MissingInputs,
    /// Storage cannot take even a single producer's output.
    OutputFull,
    /// Inputs and room exist; the line lost them to competing lines.
    Rationed,
}

/// A breakdown of one line's situation against current storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineDiagnostic<I> {
    pub line: usize,
    pub state: LineState,
    pub idle_reason: Option<IdleReason>,
    /// `(item, stored, needed)` per ingredient, for one producer.
    pub input_summary: Vec<(I, u64, u64)>,
    /// `(item, free, needed)` per result, for one producer.
    pub output_summary: Vec<(I, u64, u64)>,
}

/// Derive the externally observable state from the line's fields.
pub fn line_state<I>(line: &ProductionLine<I>) -> LineState {
    if line.active_producers == 0 {
        LineState::Idle
    } else if line.production_progress == line.recipe.duration {
        LineState::OutputStalled
    } else {
        LineState::Working {
            progress: line.production_progress,
        }
    }
}

/// Explain line `index` against the current store. Returns `None` when the
/// index is out of range.
pub fn diagnose_line<I, S>(
    lines: &[ProductionLine<I>],
    index: usize,
    store: &S,
) -> Option<LineDiagnostic<I>>
where
    I: ItemKey,
    S: ItemStorage<I>,
{
    let line = lines.get(index)?;
    let state = line_state(line);

    let input_summary: Vec<(I, u64, u64)> = line
        .recipe
        .ingredients
        .iter()
        .map(|ing| (ing.item, store.stored_amount(ing.item), ing.amount))
        .collect();
    let output_summary: Vec<(I, u64, u64)> = line
        .recipe
        .results
        .iter()
        .map(|r| (r.item, store.free_capacity(r.item), r.amount))
        .collect();

    let idle_reason = if state == LineState::Idle {
        if line.total_producers == 0 {
            Some(IdleReason::NoProducers)
        } else if input_summary.iter().any(|&(_, stored, needed)| stored < needed) {
            Some(IdleReason::MissingInputs)
        } else if output_summary.iter().any(|&(_, free, needed)| free < needed) {
            Some(IdleReason::OutputFull)
        } else {
            Some(IdleReason::Rationed)
        }
    } else {
        None
    };

    Some(LineDiagnostic {
        line: index,
        state,
        idle_reason,
        input_summary,
        output_summary,
    })
}
