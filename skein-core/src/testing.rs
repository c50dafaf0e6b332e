//! Testing utilities.
//!
//! This module provides tools for integration testing:
//! - `sample_story` for ready-made story content
//! - `StoryHarness` for scripted, deterministic playthroughs
//! - Assertion helpers for verifying world state

use crate::engine::{ExecutionEngine, ExecutionResult};
use crate::repository::InMemoryRepository;
use crate::story::{
    Choice, ClueId, Comparison, Effect, NumericOp, Storylet, StoryletId, Trigger,
};
use crate::world::WorldState;
use std::sync::Arc;

/// A small waterfront mystery exercising triggers, effects, probability
/// gates, and chained storylets. The first element is the opening
/// storylet.
pub fn sample_story() -> Vec<Storylet> {
    let manifest = ClueId::new();

    let office = Storylet::new("The Shipping Office")
        .with_description("A cramped office above the warehouse floor.")
        .with_content("The clerk looks up, startled, as you wave the manifest.")
        .with_entry_trigger(Trigger::clue(manifest, "you have found the manifest"))
        .with_choice(
            Choice::new("Press the clerk for names")
                .with_effect(Effect::resource("leads", NumericOp::Add, 1.0)),
        );

    let warehouse = Storylet::new("The Bonded Warehouse")
        .with_description("Stacked crates, tar and salt in the air.")
        .with_content("The night watchman is asleep. The crates are not locked.")
        .with_entry_trigger(Trigger::resource("energy", Comparison::Ge, 10.0))
        .with_entry_effect(Effect::resource("energy", NumericOp::Subtract, 10.0))
        .with_choice(
            Choice::new("Search the crates")
                .with_effect(Effect::discover_clue(manifest, "a doctored cargo manifest"))
                .with_next(office.id),
        )
        .with_choice(Choice::new("Slip back out").with_effect(Effect::advance_time(0.5)));

    let quay = Storylet::new("The Quay at Dusk")
        .with_description("Gulls, rope, and low talk of a missing ship.")
        .with_content("The tide is out. A fisherman nods toward the bonded warehouse.")
        .with_entry_effect(Effect::advance_time(1.0))
        .with_choice(Choice::new("Head for the warehouse").with_next(warehouse.id))
        .with_choice(
            Choice::new("Rest at the inn first")
                .with_effect(Effect::resource("energy", NumericOp::Add, 20.0)),
        )
        .with_choice(
            // A long shot the player only sometimes spots.
            Choice::new("Notice a skiff slipping its moorings").with_probability(25.0),
        );

    vec![quay, warehouse, office]
}

/// A minimal storylet with one unconditional choice.
pub fn sample_storylet(title: impl Into<String>) -> Storylet {
    Storylet::new(title).with_choice(Choice::new("Continue"))
}

/// An engine wired to a seeded in-memory repository for scripted,
/// deterministic playthroughs.
pub struct StoryHarness {
    pub repository: Arc<InMemoryRepository>,
    pub engine: ExecutionEngine,
}

impl StoryHarness {
    /// Create a harness over the given storylets with a fixed RNG seed.
    pub fn new(storylets: Vec<Storylet>) -> Self {
        Self::with_seed(storylets, 0)
    }

    pub fn with_seed(storylets: Vec<Storylet>, seed: u64) -> Self {
        let repository = Arc::new(InMemoryRepository::with_storylets(storylets));
        let engine = ExecutionEngine::with_seed(repository.clone(), seed);
        Self { repository, engine }
    }

    pub async fn enter(&mut self, id: StoryletId) -> ExecutionResult {
        self.engine.enter_storylet(id).await
    }

    /// Take the currently-available choice with the given display text.
    ///
    /// Panics when no such choice is presentable - a scripted test that
    /// loses its footing should fail loudly.
    pub async fn choose(&mut self, text: &str) -> ExecutionResult {
        let choice_id = self
            .engine
            .current()
            .and_then(|result| result.available_choices.iter().find(|c| c.text == text))
            .map(|c| c.id)
            .unwrap_or_else(|| panic!("no available choice with text {text:?}"));
        self.engine.take_choice(choice_id).await
    }

    pub fn state(&self) -> &WorldState {
        self.engine.state()
    }

    pub fn state_mut(&mut self) -> &mut WorldState {
        self.engine.state_mut()
    }

    /// Assert a resource holds the expected value.
    pub fn assert_resource(&self, key: &str, expected: f64) {
        assert_eq!(
            self.state().resource(key),
            expected,
            "resource {key:?} mismatch"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_story_shape() {
        let story = sample_story();
        assert_eq!(story.len(), 3);
        assert_eq!(story[0].title, "The Quay at Dusk");
        // Every next_storylet points inside the story.
        for storylet in &story {
            for choice in &storylet.choices {
                if let Some(next) = choice.next_storylet {
                    assert!(story.iter().any(|s| s.id == next));
                }
            }
        }
    }

    #[tokio::test]
    async fn test_harness_scripted_run() {
        let story = sample_story();
        let start = story[0].id;
        let mut harness = StoryHarness::new(story);

        harness.state_mut().set_resource("energy", 30.0);
        let entered = harness.enter(start).await;
        assert!(entered.success);

        let result = harness.choose("Head for the warehouse").await;
        assert!(result.success);
        // Chained into the warehouse, which drained entry energy.
        harness.assert_resource("energy", 20.0);
        assert!(harness.engine.is_active());
    }
}
