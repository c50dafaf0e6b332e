//! World state for a play session.
//!
//! A [`WorldState`] is the snapshot triggers read and effects mutate:
//! named resources, elapsed time, discovered clues, completed storylets,
//! per-character relationship values, and named flags. Nothing outside the
//! effect applier should mutate it during play.

use crate::story::{CharacterId, ClueId, StoryletId};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// The complete mutable state of one play session.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorldState {
    /// Named numeric resources. Missing entries read as zero.
    pub resources: HashMap<String, f64>,

    /// Elapsed game time.
    pub time: f64,

    /// Clues the player has discovered.
    pub discovered_clues: HashSet<ClueId>,

    /// Storylets the player has completed.
    pub completed_storylets: HashSet<StoryletId>,

    /// Relationship values per character. Missing entries read as zero.
    pub relationships: HashMap<CharacterId, f64>,

    /// Arbitrary named flags.
    pub flags: HashMap<String, bool>,
}

impl WorldState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read a resource, defaulting to zero when absent.
    pub fn resource(&self, key: &str) -> f64 {
        self.resources.get(key).copied().unwrap_or(0.0)
    }

    pub fn set_resource(&mut self, key: impl Into<String>, value: f64) {
        self.resources.insert(key.into(), value);
    }

    /// Read a relationship value, defaulting to zero when absent.
    pub fn relationship(&self, character: CharacterId) -> f64 {
        self.relationships.get(&character).copied().unwrap_or(0.0)
    }

    pub fn set_relationship(&mut self, character: CharacterId, value: f64) {
        self.relationships.insert(character, value);
    }

    /// Read a flag, defaulting to false when absent.
    pub fn flag(&self, name: &str) -> bool {
        self.flags.get(name).copied().unwrap_or(false)
    }

    pub fn set_flag(&mut self, name: impl Into<String>, value: bool) {
        self.flags.insert(name.into(), value);
    }

    pub fn has_clue(&self, clue: ClueId) -> bool {
        self.discovered_clues.contains(&clue)
    }

    pub fn is_completed(&self, storylet: StoryletId) -> bool {
        self.completed_storylets.contains(&storylet)
    }

    /// Merge a patch over this state. Patch entries win on key collisions.
    pub fn apply_patch(&mut self, patch: StatePatch) {
        self.resources.extend(patch.resources);
        if let Some(time) = patch.time {
            self.time = time;
        }
        self.discovered_clues.extend(patch.discovered_clues);
        self.completed_storylets.extend(patch.completed_storylets);
        self.relationships.extend(patch.relationships);
        self.flags.extend(patch.flags);
    }
}

/// A partial overlay merged over a [`WorldState`], used to supply extra
/// context when entering a storylet.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatePatch {
    pub resources: HashMap<String, f64>,
    pub time: Option<f64>,
    pub discovered_clues: Vec<ClueId>,
    pub completed_storylets: Vec<StoryletId>,
    pub relationships: HashMap<CharacterId, f64>,
    pub flags: HashMap<String, bool>,
}

impl StatePatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_resource(mut self, key: impl Into<String>, value: f64) -> Self {
        self.resources.insert(key.into(), value);
        self
    }

    pub fn with_time(mut self, time: f64) -> Self {
        self.time = Some(time);
        self
    }

    pub fn with_relationship(mut self, character: CharacterId, value: f64) -> Self {
        self.relationships.insert(character, value);
        self
    }

    pub fn with_flag(mut self, name: impl Into<String>, value: bool) -> Self {
        self.flags.insert(name.into(), value);
        self
    }

    pub fn with_clue(mut self, clue: ClueId) -> Self {
        self.discovered_clues.push(clue);
        self
    }
}
