//! Scripted playthrough of the sample story.

use skein_core::testing::sample_story;
use skein_core::{ExecutionEngine, ExecutionResult, InMemoryRepository};
use std::sync::Arc;

#[tokio::main]
async fn main() {
    let story = sample_story();
    let start = story[0].id;

    let repository = Arc::new(InMemoryRepository::with_storylets(story));
    let mut engine = ExecutionEngine::new(repository);
    engine.state_mut().set_resource("energy", 30.0);

    println!("=== Playthrough ===\n");

    let mut result = engine.enter_storylet(start).await;
    print_result(&result);

    // Always take the first available choice until the story goes quiet.
    while let Some(choice) = result.available_choices.first().cloned() {
        println!("\n> {}\n", choice.text);
        result = engine.take_choice(choice.id).await;
        print_result(&result);
        if !engine.is_active() {
            break;
        }
    }

    let state = engine.state();
    println!("\n=== Final state ===");
    println!("time elapsed: {}", state.time);
    println!("clues discovered: {}", state.discovered_clues.len());
    println!("storylets completed: {}", state.completed_storylets.len());
}

fn print_result(result: &ExecutionResult) {
    if !result.success {
        println!("[blocked] {}", result.errors.join("; "));
        return;
    }
    if let Some(storylet) = &result.storylet {
        println!("-- {} --", storylet.title);
        println!("{}", storylet.content);
    }
    for choice in &result.available_choices {
        println!("  * {}", choice.text);
    }
}
