//! Core narrative data types.
//!
//! Contains the authored story model: storylets, the choices that link
//! them, and the triggers/effects that gate and mutate play. Triggers and
//! effects are closed enums so every kind is handled exhaustively at
//! compile time.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

// ============================================================================
// ID Types
// ============================================================================

macro_rules! define_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $name(pub Uuid);

        impl $name {
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

define_id!(
    /// Unique identifier for storylets.
    StoryletId
);
define_id!(
    /// Unique identifier for choices within a storylet.
    ChoiceId
);
define_id!(
    /// Unique identifier for story arcs.
    ArcId
);
define_id!(
    /// Unique identifier for characters.
    CharacterId
);
define_id!(
    /// Unique identifier for clues.
    ClueId
);
define_id!(
    /// Unique identifier for graph nodes.
    NodeId
);
define_id!(
    /// Unique identifier for graph connections.
    ConnectionId
);

// ============================================================================
// Operators
// ============================================================================

/// Comparison operator used by numeric triggers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Comparison {
    Gt,
    Lt,
    Eq,
    Ge,
    Le,
    Ne,
}

impl Comparison {
    /// Compare `left` against `right` under this operator.
    pub fn compare(&self, left: f64, right: f64) -> bool {
        match self {
            Comparison::Gt => left > right,
            Comparison::Lt => left < right,
            Comparison::Eq => left == right,
            Comparison::Ge => left >= right,
            Comparison::Le => left <= right,
            Comparison::Ne => left != right,
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            Comparison::Gt => ">",
            Comparison::Lt => "<",
            Comparison::Eq => "=",
            Comparison::Ge => ">=",
            Comparison::Le => "<=",
            Comparison::Ne => "!=",
        }
    }
}

impl fmt::Display for Comparison {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

/// Numeric operator used by resource and relationship effects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NumericOp {
    Add,
    Subtract,
    Set,
    Multiply,
}

impl NumericOp {
    /// Apply this operator to a current value. Clamping is the caller's
    /// concern; the raw arithmetic result is returned.
    pub fn apply(&self, current: f64, value: f64) -> f64 {
        match self {
            NumericOp::Add => current + value,
            NumericOp::Subtract => current - value,
            NumericOp::Set => value,
            NumericOp::Multiply => current * value,
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            NumericOp::Add => "+",
            NumericOp::Subtract => "-",
            NumericOp::Set => "=",
            NumericOp::Multiply => "*",
        }
    }
}

impl fmt::Display for NumericOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

// ============================================================================
// Triggers
// ============================================================================

/// A condition gating a storylet entry or a choice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Trigger {
    /// A named resource compared against a value.
    Resource {
        key: String,
        value: f64,
        op: Comparison,
        description: String,
    },

    /// A relationship value for one character compared against a value.
    Relationship {
        character: CharacterId,
        value: f64,
        op: Comparison,
        description: String,
    },

    /// Elapsed game time compared against a value.
    Time {
        value: f64,
        op: Comparison,
        description: String,
    },

    /// Satisfied once the clue has been discovered.
    Clue { clue: ClueId, description: String },

    /// Satisfied once the storylet has been completed.
    StoryletCompletion {
        storylet: StoryletId,
        description: String,
    },

    /// Satisfied with `chance` percent probability per evaluation.
    Random { chance: f64, description: String },
}

impl Trigger {
    /// Human-readable description, shown when the trigger blocks entry.
    pub fn description(&self) -> &str {
        match self {
            Trigger::Resource { description, .. }
            | Trigger::Relationship { description, .. }
            | Trigger::Time { description, .. }
            | Trigger::Clue { description, .. }
            | Trigger::StoryletCompletion { description, .. }
            | Trigger::Random { description, .. } => description,
        }
    }

    /// Shorthand for a resource comparison trigger.
    pub fn resource(key: impl Into<String>, op: Comparison, value: f64) -> Self {
        let key = key.into();
        let description = format!("{key} {} {value}", op.symbol());
        Trigger::Resource {
            key,
            value,
            op,
            description,
        }
    }

    /// Shorthand for a discovered-clue trigger.
    pub fn clue(clue: ClueId, description: impl Into<String>) -> Self {
        Trigger::Clue {
            clue,
            description: description.into(),
        }
    }

    /// Shorthand for a completed-storylet trigger.
    pub fn completion(storylet: StoryletId, description: impl Into<String>) -> Self {
        Trigger::StoryletCompletion {
            storylet,
            description: description.into(),
        }
    }
}

// ============================================================================
// Effects
// ============================================================================

/// A mutation applied to the world state when a storylet is entered or a
/// choice is taken.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Effect {
    /// Adjust a named resource. Results clamp at zero.
    Resource {
        key: String,
        value: f64,
        op: NumericOp,
        description: String,
    },

    /// Adjust a relationship value. Results clamp into [-100, 100].
    Relationship {
        character: CharacterId,
        value: f64,
        op: NumericOp,
        description: String,
    },

    /// Add a clue to the discovered set. Idempotent.
    ClueDiscovery { clue: ClueId, description: String },

    /// Record that a storylet should become reachable.
    StoryletUnlock {
        storylet: StoryletId,
        description: String,
    },

    /// Record progress on a story arc.
    ArcProgress {
        arc: ArcId,
        amount: f64,
        description: String,
    },

    /// Advance elapsed time. May be fractional or negative; never clamped.
    TimeAdvance { amount: f64, description: String },
}

impl Effect {
    pub fn description(&self) -> &str {
        match self {
            Effect::Resource { description, .. }
            | Effect::Relationship { description, .. }
            | Effect::ClueDiscovery { description, .. }
            | Effect::StoryletUnlock { description, .. }
            | Effect::ArcProgress { description, .. }
            | Effect::TimeAdvance { description, .. } => description,
        }
    }

    /// Shorthand for a resource effect.
    pub fn resource(key: impl Into<String>, op: NumericOp, value: f64) -> Self {
        let key = key.into();
        let description = format!("{key} {} {value}", op.symbol());
        Effect::Resource {
            key,
            value,
            op,
            description,
        }
    }

    /// Shorthand for a clue discovery effect.
    pub fn discover_clue(clue: ClueId, description: impl Into<String>) -> Self {
        Effect::ClueDiscovery {
            clue,
            description: description.into(),
        }
    }

    /// Shorthand for a time advance effect.
    pub fn advance_time(amount: f64) -> Self {
        Effect::TimeAdvance {
            amount,
            description: format!("time +{amount}"),
        }
    }
}

// ============================================================================
// Choices and Storylets
// ============================================================================

/// Lifecycle status of an authored storylet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StoryletStatus {
    #[default]
    Dev,
    Stage,
    Live,
}

fn default_unlocked() -> bool {
    true
}

/// A player-facing choice belonging to a storylet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Choice {
    pub id: ChoiceId,

    /// Display text.
    pub text: String,

    pub description: Option<String>,

    /// Effects applied when the choice is taken.
    pub effects: Vec<Effect>,

    /// Requirement triggers, ANDed. Empty means always presentable.
    pub requirements: Vec<Trigger>,

    /// Selection probability in percent (0-100). Absent means certain.
    pub probability: Option<f64>,

    /// A locked choice is never presented.
    #[serde(default = "default_unlocked")]
    pub unlocked: bool,

    /// Follow-on storylet entered automatically after this choice.
    pub next_storylet: Option<StoryletId>,
}

impl Choice {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            id: ChoiceId::new(),
            text: text.into(),
            description: None,
            effects: Vec::new(),
            requirements: Vec::new(),
            probability: None,
            unlocked: true,
            next_storylet: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_effect(mut self, effect: Effect) -> Self {
        self.effects.push(effect);
        self
    }

    pub fn with_requirement(mut self, trigger: Trigger) -> Self {
        self.requirements.push(trigger);
        self
    }

    pub fn with_probability(mut self, probability: f64) -> Self {
        self.probability = Some(probability);
        self
    }

    pub fn with_next(mut self, storylet: StoryletId) -> Self {
        self.next_storylet = Some(storylet);
        self
    }

    pub fn locked(mut self) -> Self {
        self.unlocked = false;
        self
    }
}

/// A discrete narrative unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Storylet {
    pub id: StoryletId,
    pub title: String,
    pub description: String,

    /// Narrative text presented when the storylet is entered.
    pub content: String,

    /// Ordered player choices.
    pub choices: Vec<Choice>,

    /// Effects applied on entry, before choices are resolved.
    pub entry_effects: Vec<Effect>,

    /// Entry gate, ANDed. Empty means always enterable.
    pub entry_triggers: Vec<Trigger>,

    pub status: StoryletStatus,

    pub arc: Option<ArcId>,
}

impl Storylet {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            id: StoryletId::new(),
            title: title.into(),
            description: String::new(),
            content: String::new(),
            choices: Vec::new(),
            entry_effects: Vec::new(),
            entry_triggers: Vec::new(),
            status: StoryletStatus::default(),
            arc: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = content.into();
        self
    }

    pub fn with_choice(mut self, choice: Choice) -> Self {
        self.choices.push(choice);
        self
    }

    pub fn with_entry_effect(mut self, effect: Effect) -> Self {
        self.entry_effects.push(effect);
        self
    }

    pub fn with_entry_trigger(mut self, trigger: Trigger) -> Self {
        self.entry_triggers.push(trigger);
        self
    }

    pub fn with_status(mut self, status: StoryletStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_arc(mut self, arc: ArcId) -> Self {
        self.arc = Some(arc);
        self
    }

    /// Look up a choice by id.
    pub fn choice(&self, id: ChoiceId) -> Option<&Choice> {
        self.choices.iter().find(|c| c.id == id)
    }
}

// ============================================================================
// Supporting entities
// ============================================================================

/// A story arc grouping related storylets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoryArc {
    pub id: ArcId,
    pub title: String,
    pub description: String,
    pub progress: f64,
}

impl StoryArc {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            id: ArcId::new(),
            title: title.into(),
            description: String::new(),
            progress: 0.0,
        }
    }
}

/// A character participating in the story.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Character {
    pub id: CharacterId,
    pub name: String,
    pub description: String,
}

impl Character {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: CharacterId::new(),
            name: name.into(),
            description: String::new(),
        }
    }
}

/// A discoverable clue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Clue {
    pub id: ClueId,
    pub title: String,
    pub description: String,
}

impl Clue {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            id: ClueId::new(),
            title: title.into(),
            description: String::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_comparison_operators() {
        assert!(Comparison::Gt.compare(2.0, 1.0));
        assert!(!Comparison::Gt.compare(1.0, 1.0));
        assert!(Comparison::Ge.compare(1.0, 1.0));
        assert!(Comparison::Lt.compare(0.5, 1.0));
        assert!(Comparison::Le.compare(1.0, 1.0));
        assert!(Comparison::Eq.compare(3.0, 3.0));
        assert!(Comparison::Ne.compare(3.0, 4.0));
    }

    #[test]
    fn test_numeric_ops() {
        assert_eq!(NumericOp::Add.apply(10.0, 5.0), 15.0);
        assert_eq!(NumericOp::Subtract.apply(10.0, 5.0), 5.0);
        assert_eq!(NumericOp::Set.apply(10.0, 5.0), 5.0);
        assert_eq!(NumericOp::Multiply.apply(10.0, 5.0), 50.0);
    }

    #[test]
    fn test_choice_builder() {
        let next = StoryletId::new();
        let choice = Choice::new("Open the door")
            .with_probability(75.0)
            .with_next(next);

        assert_eq!(choice.text, "Open the door");
        assert_eq!(choice.probability, Some(75.0));
        assert_eq!(choice.next_storylet, Some(next));
        assert!(choice.unlocked);
    }

    #[test]
    fn test_trigger_serde_round_trip() {
        let trigger = Trigger::resource("energy", Comparison::Ge, 150.0);
        let json = serde_json::to_string(&trigger).unwrap();
        assert!(json.contains("\"kind\":\"resource\""));

        let back: Trigger = serde_json::from_str(&json).unwrap();
        assert_eq!(back, trigger);
    }

    #[test]
    fn test_choice_unlocked_defaults_true_when_absent() {
        let json = format!(
            "{{\"id\":\"{}\",\"text\":\"go\",\"description\":null,\"effects\":[],\
             \"requirements\":[],\"probability\":null,\"next_storylet\":null}}",
            ChoiceId::new()
        );
        let choice: Choice = serde_json::from_str(&json).unwrap();
        assert!(choice.unlocked);
    }
}
