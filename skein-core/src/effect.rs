//! Effect application.
//!
//! Applies authored [`Effect`]s to a [`WorldState`], producing a typed
//! [`StateChange`] record per effect. Batch application is partial by
//! design: a failing effect is recorded and its siblings still apply.

use crate::story::{ArcId, CharacterId, ClueId, Effect, StoryletId};
use crate::world::WorldState;
use thiserror::Error;

/// Relationship values stay within this band.
const RELATIONSHIP_MIN: f64 = -100.0;
const RELATIONSHIP_MAX: f64 = 100.0;

/// Error from applying a single effect. The state is left untouched when
/// application fails.
#[derive(Debug, Error)]
pub enum EffectError {
    #[error("non-finite result for \"{target}\"")]
    NonFiniteResult { target: String },
}

/// A typed record of one applied state change.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StateChange {
    ResourceChanged {
        key: String,
        previous: f64,
        current: f64,
    },

    RelationshipChanged {
        character: CharacterId,
        previous: f64,
        current: f64,
    },

    ClueDiscovered {
        clue: ClueId,
        /// True when the clue was already in the discovered set.
        already_known: bool,
    },

    /// Recorded for the caller to persist; the engine does not decide
    /// where unlock state lives.
    StoryletUnlocked { storylet: StoryletId },

    /// Recorded for the caller to persist.
    ArcProgressed { arc: ArcId, amount: f64 },

    TimeAdvanced { amount: f64, current: f64 },
}

/// Outcome of applying a batch of effects.
#[derive(Debug, Clone, Default)]
pub struct EffectReport {
    /// Changes from the effects that applied, in input order.
    pub changes: Vec<StateChange>,

    /// One entry per failed effect, keyed by position and description.
    pub errors: Vec<String>,
}

/// Apply a single effect to the state.
pub fn apply_effect(state: &mut WorldState, effect: &Effect) -> Result<StateChange, EffectError> {
    match effect {
        Effect::Resource { key, value, op, .. } => {
            let previous = state.resource(key);
            let raw = op.apply(previous, *value);
            if !raw.is_finite() {
                return Err(EffectError::NonFiniteResult { target: key.clone() });
            }
            // Resources never go negative.
            let current = raw.max(0.0);
            state.resources.insert(key.clone(), current);
            Ok(StateChange::ResourceChanged {
                key: key.clone(),
                previous,
                current,
            })
        }

        Effect::Relationship {
            character,
            value,
            op,
            ..
        } => {
            let previous = state.relationship(*character);
            let raw = op.apply(previous, *value);
            if !raw.is_finite() {
                return Err(EffectError::NonFiniteResult {
                    target: character.to_string(),
                });
            }
            let current = raw.clamp(RELATIONSHIP_MIN, RELATIONSHIP_MAX);
            state.relationships.insert(*character, current);
            Ok(StateChange::RelationshipChanged {
                character: *character,
                previous,
                current,
            })
        }

        Effect::ClueDiscovery { clue, .. } => {
            // Rediscovery is a successful no-op.
            let already_known = !state.discovered_clues.insert(*clue);
            Ok(StateChange::ClueDiscovered {
                clue: *clue,
                already_known,
            })
        }

        Effect::StoryletUnlock { storylet, .. } => Ok(StateChange::StoryletUnlocked {
            storylet: *storylet,
        }),

        Effect::ArcProgress { arc, amount, .. } => Ok(StateChange::ArcProgressed {
            arc: *arc,
            amount: *amount,
        }),

        Effect::TimeAdvance { amount, .. } => {
            // Time may move backwards; no clamp.
            state.time += amount;
            Ok(StateChange::TimeAdvanced {
                amount: *amount,
                current: state.time,
            })
        }
    }
}

/// Apply a batch of effects, continuing past failures.
pub fn apply_effects(state: &mut WorldState, effects: &[Effect]) -> EffectReport {
    let mut report = EffectReport::default();
    for (index, effect) in effects.iter().enumerate() {
        match apply_effect(state, effect) {
            Ok(change) => report.changes.push(change),
            Err(err) => {
                tracing::warn!(effect = %effect.description(), %err, "effect failed to apply");
                report
                    .errors
                    .push(format!("effect {index} ({}): {err}", effect.description()));
            }
        }
    }
    report
}
