//! Branching narrative engine with a graph-backed storylet editor model.
//!
//! This crate provides:
//! - A storylet data model: choices gated by triggers, mutating state
//!   through effects
//! - A graph projection of the story, synchronized with choice data in
//!   both directions
//! - A deterministic execution engine for playing and testing stories
//! - Versioned save/load of whole story projects
//!
//! # Quick Start
//!
//! ```ignore
//! use skein_core::{ExecutionEngine, InMemoryRepository};
//! use skein_core::testing::sample_story;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() {
//!     let story = sample_story();
//!     let start = story[0].id;
//!
//!     let repository = Arc::new(InMemoryRepository::with_storylets(story));
//!     let mut engine = ExecutionEngine::new(repository);
//!
//!     let result = engine.enter_storylet(start).await;
//!     println!("{}", result.storylet.unwrap().content);
//!     for choice in &result.available_choices {
//!         println!("  - {}", choice.text);
//!     }
//! }
//! ```

pub mod choice;
pub mod effect;
pub mod engine;
pub mod graph;
pub mod persist;
pub mod repository;
pub mod story;
pub mod testing;
pub mod trigger;
pub mod world;

// Primary public API
pub use effect::{apply_effect, apply_effects, EffectReport, StateChange};
pub use engine::{ExecutionEngine, ExecutionResult};
pub use graph::{Connection, ConnectionNotice, GraphStore, Node, NodeKind, Position};
pub use repository::{InMemoryRepository, RepositoryError, StoryletRepository};
pub use story::{
    ArcId, Character, CharacterId, Choice, ChoiceId, Clue, ClueId, Comparison, ConnectionId,
    Effect, NodeId, NumericOp, StoryArc, Storylet, StoryletId, StoryletStatus, Trigger,
};
pub use trigger::{evaluate, evaluate_all, TriggerOutcome};
pub use world::{StatePatch, WorldState};
