//! Trigger evaluation.
//!
//! Decides whether a single [`Trigger`] holds against a [`WorldState`],
//! and folds a whole gate (ANDed trigger list) into one outcome with the
//! descriptions of whatever failed.
//!
//! Randomized triggers draw from the supplied RNG; the plain entry points
//! use the thread RNG, and `*_with_rng` variants exist for deterministic
//! tests.

use crate::story::Trigger;
use crate::world::WorldState;
use rand::Rng;

/// Result of evaluating a list of triggers as one gate.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TriggerOutcome {
    /// True when every trigger in the list held.
    pub all_met: bool,

    /// Descriptions of the triggers that did not hold, in input order.
    pub failed: Vec<String>,
}

/// Evaluate a single trigger against the state.
pub fn evaluate(trigger: &Trigger, state: &WorldState) -> bool {
    evaluate_with_rng(trigger, state, &mut rand::thread_rng())
}

/// Evaluate with a specific RNG (useful for testing).
pub fn evaluate_with_rng<R: Rng>(trigger: &Trigger, state: &WorldState, rng: &mut R) -> bool {
    match trigger {
        Trigger::Resource { key, value, op, .. } => op.compare(state.resource(key), *value),
        Trigger::Relationship {
            character,
            value,
            op,
            ..
        } => op.compare(state.relationship(*character), *value),
        Trigger::Time { value, op, .. } => op.compare(state.time, *value),
        Trigger::Clue { clue, .. } => state.has_clue(*clue),
        Trigger::StoryletCompletion { storylet, .. } => state.is_completed(*storylet),
        // A chance of 100 always passes, 0 never does.
        Trigger::Random { chance, .. } => rng.gen_range(0.0..100.0) < *chance,
    }
}

/// Evaluate a list of triggers as an ANDed gate.
pub fn evaluate_all(triggers: &[Trigger], state: &WorldState) -> TriggerOutcome {
    evaluate_all_with_rng(triggers, state, &mut rand::thread_rng())
}

/// Evaluate a gate with a specific RNG (useful for testing).
pub fn evaluate_all_with_rng<R: Rng>(
    triggers: &[Trigger],
    state: &WorldState,
    rng: &mut R,
) -> TriggerOutcome {
    let mut failed = Vec::new();
    for trigger in triggers {
        if !evaluate_with_rng(trigger, state, rng) {
            failed.push(trigger.description().to_string());
        }
    }
    TriggerOutcome {
        all_met: failed.is_empty(),
        failed,
    }
}
