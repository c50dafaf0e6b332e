//! End-to-end tests for the execution engine over an in-memory story.

use skein_core::story::{Choice, Comparison, Effect, NumericOp, Storylet, Trigger};
use skein_core::testing::{sample_story, StoryHarness};
use skein_core::{ExecutionEngine, InMemoryRepository};
use std::sync::Arc;

#[tokio::test]
async fn gated_storylet_reports_trigger_and_stays_idle() {
    let storylet = Storylet::new("The Climb")
        .with_entry_trigger(Trigger::resource("energy", Comparison::Ge, 150.0));
    let id = storylet.id;

    let repo = Arc::new(InMemoryRepository::with_storylets(vec![storylet]));
    let mut engine = ExecutionEngine::new(repo);
    engine.state_mut().set_resource("energy", 100.0);

    let result = engine.enter_storylet(id).await;

    assert!(!result.success);
    assert_eq!(result.errors, vec!["energy >= 150"]);
    assert!(!engine.is_active());
    assert!(engine.history().is_empty());
    // The gate did not consume anything.
    assert_eq!(engine.state().resource("energy"), 100.0);
}

#[tokio::test]
async fn unconditional_choice_completes_and_returns_to_idle() {
    let choice = Choice::new("Walk on").with_effect(Effect::resource("steps", NumericOp::Add, 1.0));
    let choice_id = choice.id;
    let storylet = Storylet::new("A Quiet Road").with_choice(choice);
    let id = storylet.id;

    let repo = Arc::new(InMemoryRepository::with_storylets(vec![storylet]));
    let mut engine = ExecutionEngine::new(repo);

    let entered = engine.enter_storylet(id).await;
    assert!(entered.success);
    assert_eq!(entered.available_choices.len(), 1);

    let taken = engine.take_choice(choice_id).await;
    assert!(taken.success);
    assert_eq!(engine.state().resource("steps"), 1.0);
    assert!(engine.state().is_completed(id));
    assert!(!engine.is_active());
    assert!(engine.current().is_none());
}

#[tokio::test]
async fn sample_story_scripted_playthrough() {
    let story = sample_story();
    let quay = story[0].id;
    let warehouse = story[1].id;
    let office = story[2].id;

    let mut harness = StoryHarness::new(story);

    // Too tired for the warehouse; rest first.
    harness.enter(quay).await;
    harness.choose("Rest at the inn first").await;
    harness.assert_resource("energy", 20.0);
    assert!(!harness.engine.is_active());

    // Back to the quay, then through the warehouse into the office.
    harness.enter(quay).await;
    let into_warehouse = harness.choose("Head for the warehouse").await;
    assert!(into_warehouse.success);
    harness.assert_resource("energy", 10.0);

    let into_office = harness.choose("Search the crates").await;
    assert!(into_office.success);
    assert_eq!(into_office.storylet.as_ref().unwrap().id, office);
    assert_eq!(harness.state().discovered_clues.len(), 1);

    let done = harness.choose("Press the clerk for names").await;
    assert!(done.success);
    harness.assert_resource("leads", 1.0);
    assert!(!harness.engine.is_active());

    // Both quay visits and both chained entries were recorded.
    assert_eq!(harness.engine.history().len(), 4);
    assert!(harness.state().is_completed(quay));
    assert!(harness.state().is_completed(warehouse));
    assert!(harness.state().is_completed(office));
    // One hour per quay entry, nothing else touched the clock.
    assert_eq!(harness.state().time, 2.0);
}

#[tokio::test]
async fn chained_entry_can_fail_its_gate() {
    let locked = Storylet::new("The Vault")
        .with_entry_trigger(Trigger::resource("keys", Comparison::Ge, 1.0));
    let choice = Choice::new("Try the vault door").with_next(locked.id);
    let choice_id = choice.id;
    let lobby = Storylet::new("The Lobby").with_choice(choice);
    let lobby_id = lobby.id;

    let repo = Arc::new(InMemoryRepository::with_storylets(vec![lobby, locked]));
    let mut engine = ExecutionEngine::new(repo);

    engine.enter_storylet(lobby_id).await;
    let result = engine.take_choice(choice_id).await;

    // The choice itself succeeded and completed the lobby, but the
    // chained entry was rejected, so the engine is idle.
    assert!(!result.success);
    assert_eq!(result.errors, vec!["keys >= 1"]);
    assert!(engine.state().is_completed(lobby_id));
    assert!(!engine.is_active());
}

#[tokio::test]
async fn second_enter_replaces_current_execution() {
    let first = Storylet::new("First");
    let second = Storylet::new("Second");
    let first_id = first.id;
    let second_id = second.id;

    let repo = Arc::new(InMemoryRepository::with_storylets(vec![first, second]));
    let mut engine = ExecutionEngine::new(repo);

    engine.enter_storylet(first_id).await;
    engine.enter_storylet(second_id).await;

    // The later writer wins the current slot; history keeps both.
    assert_eq!(
        engine.current().unwrap().storylet.as_ref().unwrap().id,
        second_id
    );
    assert_eq!(engine.history().len(), 2);
}
