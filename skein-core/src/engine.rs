//! Storylet execution engine.
//!
//! A small state machine over play: idle, or holding exactly one current
//! [`ExecutionResult`] for an active storylet. Entering a storylet
//! evaluates its entry gate, applies entry effects, and resolves the
//! presentable choices; taking a choice applies its effects, records
//! completion, and optionally chains into the follow-on storylet.
//!
//! Engines are plain constructible values. Each holds its own state
//! snapshot, history, and RNG; independent engines never share state.

use crate::choice;
use crate::effect::{self, StateChange};
use crate::repository::StoryletRepository;
use crate::story::{Choice, ChoiceId, Effect, Storylet, StoryletId};
use crate::trigger;
use crate::world::{StatePatch, WorldState};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::Arc;

/// Outcome of entering a storylet or taking a choice.
#[derive(Debug, Clone)]
pub struct ExecutionResult {
    /// False when the operation was rejected; `errors` says why.
    pub success: bool,

    /// The storylet this result concerns, when one was resolved.
    pub storylet: Option<Storylet>,

    /// Choices currently presentable to the player.
    pub available_choices: Vec<Choice>,

    /// Effects that were applied (entry effects or the taken choice's).
    pub applied_effects: Vec<Effect>,

    /// Result-failing conditions: missing storylet, unmet gate, stale
    /// choice.
    pub errors: Vec<String>,

    /// Non-fatal notes, including per-effect application failures.
    pub warnings: Vec<String>,

    /// Structured diff of what changed in the world state.
    pub changes: Vec<StateChange>,
}

impl ExecutionResult {
    fn failure(errors: Vec<String>) -> Self {
        Self {
            success: false,
            storylet: None,
            available_choices: Vec::new(),
            applied_effects: Vec::new(),
            errors,
            warnings: Vec::new(),
            changes: Vec::new(),
        }
    }
}

/// Drives play through a story held in a [`StoryletRepository`].
pub struct ExecutionEngine {
    repository: Arc<dyn StoryletRepository>,
    state: WorldState,
    rng: StdRng,
    current: Option<ExecutionResult>,
    history: Vec<ExecutionResult>,
}

impl ExecutionEngine {
    /// Create an engine over the given repository with a fresh state.
    pub fn new(repository: Arc<dyn StoryletRepository>) -> Self {
        Self {
            repository,
            state: WorldState::new(),
            rng: StdRng::from_entropy(),
            current: None,
            history: Vec::new(),
        }
    }

    /// Create an engine with a seeded RNG for deterministic stochastic
    /// gates (useful for testing).
    pub fn with_seed(repository: Arc<dyn StoryletRepository>, seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            ..Self::new(repository)
        }
    }

    /// Replace the starting world state.
    pub fn with_state(mut self, state: WorldState) -> Self {
        self.state = state;
        self
    }

    /// Get a reference to the world state.
    pub fn state(&self) -> &WorldState {
        &self.state
    }

    /// Get a mutable reference to the world state.
    ///
    /// Use with caution - direct modifications bypass the effect applier.
    pub fn state_mut(&mut self) -> &mut WorldState {
        &mut self.state
    }

    /// The current execution, if a storylet is active.
    pub fn current(&self) -> Option<&ExecutionResult> {
        self.current.as_ref()
    }

    /// True while a storylet is active.
    pub fn is_active(&self) -> bool {
        self.current.is_some()
    }

    /// Append-only record of successful storylet entries.
    pub fn history(&self) -> &[ExecutionResult] {
        &self.history
    }

    pub fn clear_history(&mut self) {
        self.history.clear();
    }

    /// Force the engine back to idle without touching world state.
    pub fn cancel_current_execution(&mut self) {
        self.current = None;
    }

    /// Enter a storylet: gate check, entry effects, choice resolution.
    pub async fn enter_storylet(&mut self, id: StoryletId) -> ExecutionResult {
        self.enter_storylet_with(id, StatePatch::default()).await
    }

    /// Enter a storylet after merging extra context over the state.
    pub async fn enter_storylet_with(
        &mut self,
        id: StoryletId,
        patch: StatePatch,
    ) -> ExecutionResult {
        let storylet = match self.repository.storylet(id).await {
            Ok(Some(storylet)) => storylet,
            Ok(None) => {
                return ExecutionResult::failure(vec![format!(
                    "Storylet with ID \"{id}\" not found"
                )]);
            }
            Err(err) => {
                return ExecutionResult::failure(vec![format!(
                    "Storylet with ID \"{id}\" not found: {err}"
                )]);
            }
        };

        self.state.apply_patch(patch);

        let gate = trigger::evaluate_all_with_rng(&storylet.entry_triggers, &self.state, &mut self.rng);
        if !gate.all_met {
            tracing::warn!(
                storylet = %storylet.id,
                title = %storylet.title,
                unmet = gate.failed.len(),
                "entry triggers unmet"
            );
            // The state machine is untouched: whatever was current stays
            // current.
            return ExecutionResult::failure(gate.failed);
        }

        let report = effect::apply_effects(&mut self.state, &storylet.entry_effects);
        let available =
            choice::available_choices_with_rng(&storylet.choices, &self.state, &mut self.rng);

        let result = ExecutionResult {
            success: true,
            storylet: Some(storylet.clone()),
            available_choices: available,
            applied_effects: storylet.entry_effects.clone(),
            errors: Vec::new(),
            warnings: report.errors,
            changes: report.changes,
        };

        self.current = Some(result.clone());
        self.history.push(result.clone());
        result
    }

    /// Take one of the current storylet's presentable choices.
    ///
    /// Requirements are re-checked at take time: a choice resolved a
    /// moment ago may have gone stale if the state moved underneath it.
    /// On success the engine returns to idle, then chains into the
    /// choice's follow-on storylet if it has one.
    pub async fn take_choice(&mut self, choice_id: ChoiceId) -> ExecutionResult {
        let Some(current) = self.current.clone() else {
            return ExecutionResult::failure(vec!["No active storylet execution".to_string()]);
        };

        let Some(choice) = current
            .available_choices
            .iter()
            .find(|c| c.id == choice_id)
            .cloned()
        else {
            return ExecutionResult::failure(vec![format!(
                "Choice \"{choice_id}\" not found in current storylet"
            )]);
        };

        if !choice.requirements.is_empty() {
            let recheck =
                trigger::evaluate_all_with_rng(&choice.requirements, &self.state, &mut self.rng);
            if !recheck.all_met {
                return ExecutionResult::failure(vec![
                    "Choice requirements no longer met".to_string()
                ]);
            }
        }

        let report = effect::apply_effects(&mut self.state, &choice.effects);
        if let Some(storylet) = &current.storylet {
            self.state.completed_storylets.insert(storylet.id);
        }

        // Always clear the slot before possibly establishing a new one.
        self.current = None;

        if let Some(next) = choice.next_storylet {
            return self.enter_storylet(next).await;
        }

        ExecutionResult {
            success: true,
            storylet: current.storylet,
            available_choices: Vec::new(),
            applied_effects: choice.effects,
            errors: Vec::new(),
            warnings: report.errors,
            changes: report.changes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::InMemoryRepository;
    use crate::story::{Comparison, NumericOp, Trigger};

    fn engine_with(storylets: Vec<Storylet>) -> ExecutionEngine {
        let repo = Arc::new(InMemoryRepository::with_storylets(storylets));
        ExecutionEngine::with_seed(repo, 42)
    }

    #[tokio::test]
    async fn test_missing_storylet_fails_without_state_change() {
        let mut engine = engine_with(vec![]);
        let id = StoryletId::new();

        let result = engine.enter_storylet(id).await;

        assert!(!result.success);
        assert_eq!(
            result.errors,
            vec![format!("Storylet with ID \"{id}\" not found")]
        );
        assert!(!engine.is_active());
        assert!(engine.history().is_empty());
    }

    #[tokio::test]
    async fn test_unmet_gate_reports_descriptions_and_stays_idle() {
        let storylet = Storylet::new("The Vault")
            .with_entry_trigger(Trigger::resource("energy", Comparison::Ge, 150.0));
        let id = storylet.id;

        let mut engine = engine_with(vec![storylet]);
        engine.state_mut().set_resource("energy", 100.0);

        let result = engine.enter_storylet(id).await;

        assert!(!result.success);
        assert_eq!(result.errors, vec!["energy >= 150"]);
        assert!(!engine.is_active());
    }

    #[tokio::test]
    async fn test_enter_applies_effects_and_resolves_choices() {
        let storylet = Storylet::new("Dawn Patrol")
            .with_entry_effect(Effect::resource("energy", NumericOp::Subtract, 10.0))
            .with_choice(Choice::new("head home"))
            .with_choice(Choice::new("keep watch").locked());
        let id = storylet.id;

        let mut engine = engine_with(vec![storylet]);
        engine.state_mut().set_resource("energy", 50.0);

        let result = engine.enter_storylet(id).await;

        assert!(result.success);
        assert_eq!(engine.state().resource("energy"), 40.0);
        assert_eq!(result.available_choices.len(), 1);
        assert_eq!(result.available_choices[0].text, "head home");
        assert!(engine.is_active());
        assert_eq!(engine.history().len(), 1);
    }

    #[tokio::test]
    async fn test_take_choice_without_active_execution() {
        let mut engine = engine_with(vec![]);
        let result = engine.take_choice(ChoiceId::new()).await;

        assert!(!result.success);
        assert_eq!(result.errors, vec!["No active storylet execution"]);
    }

    #[tokio::test]
    async fn test_take_unknown_choice_keeps_current() {
        let storylet = Storylet::new("Crossroads").with_choice(Choice::new("north"));
        let id = storylet.id;

        let mut engine = engine_with(vec![storylet]);
        engine.enter_storylet(id).await;

        let result = engine.take_choice(ChoiceId::new()).await;
        assert!(!result.success);
        assert!(result.errors[0].contains("not found in current storylet"));
        assert!(engine.is_active());
    }

    #[tokio::test]
    async fn test_take_choice_rechecks_requirements() {
        let choice = Choice::new("bribe the guard")
            .with_requirement(Trigger::resource("gold", Comparison::Ge, 10.0));
        let choice_id = choice.id;
        let storylet = Storylet::new("The Gate").with_choice(choice);
        let id = storylet.id;

        let mut engine = engine_with(vec![storylet]);
        engine.state_mut().set_resource("gold", 20.0);
        engine.enter_storylet(id).await;

        // The state moves underneath the resolved choice.
        engine.state_mut().set_resource("gold", 0.0);

        let result = engine.take_choice(choice_id).await;
        assert!(!result.success);
        assert_eq!(result.errors, vec!["Choice requirements no longer met"]);
        assert!(engine.is_active());
    }

    #[tokio::test]
    async fn test_take_choice_completes_and_returns_to_idle() {
        let choice = Choice::new("walk away")
            .with_effect(Effect::resource("gold", NumericOp::Add, 5.0));
        let choice_id = choice.id;
        let storylet = Storylet::new("Street Corner").with_choice(choice);
        let id = storylet.id;

        let mut engine = engine_with(vec![storylet]);
        engine.enter_storylet(id).await;

        let result = engine.take_choice(choice_id).await;

        assert!(result.success);
        assert_eq!(engine.state().resource("gold"), 5.0);
        assert!(engine.state().is_completed(id));
        assert!(!engine.is_active());
        assert!(engine.current().is_none());
    }

    #[tokio::test]
    async fn test_take_choice_chains_into_next_storylet() {
        let second = Storylet::new("The Cellar").with_choice(Choice::new("look around"));
        let second_id = second.id;

        let choice = Choice::new("descend").with_next(second_id);
        let choice_id = choice.id;
        let first = Storylet::new("The Trapdoor").with_choice(choice);
        let first_id = first.id;

        let mut engine = engine_with(vec![first, second]);
        engine.enter_storylet(first_id).await;

        let result = engine.take_choice(choice_id).await;

        assert!(result.success);
        assert_eq!(result.storylet.as_ref().unwrap().id, second_id);
        assert!(engine.is_active());
        assert!(engine.state().is_completed(first_id));
        // Both entries were recorded.
        assert_eq!(engine.history().len(), 2);
    }

    #[tokio::test]
    async fn test_cancel_and_clear_history() {
        let storylet = Storylet::new("Quiet Morning");
        let id = storylet.id;

        let mut engine = engine_with(vec![storylet]);
        engine.state_mut().set_resource("energy", 3.0);
        engine.enter_storylet(id).await;

        engine.cancel_current_execution();
        assert!(!engine.is_active());
        assert_eq!(engine.state().resource("energy"), 3.0);

        engine.clear_history();
        assert!(engine.history().is_empty());
    }

    #[tokio::test]
    async fn test_enter_with_patch_feeds_the_gate() {
        let storylet = Storylet::new("Back Room")
            .with_entry_trigger(Trigger::resource("reputation", Comparison::Ge, 5.0));
        let id = storylet.id;

        let mut engine = engine_with(vec![storylet]);

        let patch = StatePatch::new().with_resource("reputation", 10.0);
        let result = engine.enter_storylet_with(id, patch).await;

        assert!(result.success);
        assert_eq!(engine.state().resource("reputation"), 10.0);
    }
}
