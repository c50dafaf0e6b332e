//! Choice resolution.
//!
//! Filters a storylet's choices down to the subset currently presentable
//! to the player. A choice is presented when it is unlocked, its
//! requirement triggers (if any) all hold, and its probability gate (if
//! any) passes a fresh draw. Output order equals input order.

use crate::story::Choice;
use crate::trigger;
use crate::world::WorldState;
use rand::Rng;

/// Filter choices down to the presentable subset.
pub fn available_choices(choices: &[Choice], state: &WorldState) -> Vec<Choice> {
    available_choices_with_rng(choices, state, &mut rand::thread_rng())
}

/// Filter with a specific RNG (useful for testing).
pub fn available_choices_with_rng<R: Rng>(
    choices: &[Choice],
    state: &WorldState,
    rng: &mut R,
) -> Vec<Choice> {
    choices
        .iter()
        .filter(|choice| is_available_with_rng(choice, state, rng))
        .cloned()
        .collect()
}

/// Decide whether a single choice is currently presentable.
pub fn is_available_with_rng<R: Rng>(choice: &Choice, state: &WorldState, rng: &mut R) -> bool {
    if !choice.unlocked {
        return false;
    }

    // Requirements take precedence over the probability gate.
    if !choice.requirements.is_empty() {
        return trigger::evaluate_all_with_rng(&choice.requirements, state, rng).all_met;
    }

    if let Some(probability) = choice.probability {
        if probability < 100.0 {
            return rng.gen_range(0.0..100.0) < probability;
        }
    }

    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::story::{Comparison, Trigger};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_locked_choice_excluded() {
        let choices = vec![Choice::new("hidden").locked(), Choice::new("shown")];
        let available = available_choices(&choices, &WorldState::new());

        assert_eq!(available.len(), 1);
        assert_eq!(available[0].text, "shown");
    }

    #[test]
    fn test_requirements_gate_inclusion() {
        let mut state = WorldState::new();
        state.set_resource("gold", 5.0);

        let affordable =
            Choice::new("buy bread").with_requirement(Trigger::resource("gold", Comparison::Ge, 2.0));
        let expensive =
            Choice::new("buy a horse").with_requirement(Trigger::resource("gold", Comparison::Ge, 50.0));

        let available = available_choices(&[affordable, expensive], &state);
        assert_eq!(available.len(), 1);
        assert_eq!(available[0].text, "buy bread");
    }

    #[test]
    fn test_probability_bounds() {
        let state = WorldState::new();
        let mut rng = StdRng::seed_from_u64(11);

        let certain = Choice::new("certain").with_probability(100.0);
        let impossible = Choice::new("impossible").with_probability(0.0);

        for _ in 0..100 {
            let available =
                available_choices_with_rng(&[certain.clone(), impossible.clone()], &state, &mut rng);
            assert_eq!(available.len(), 1);
            assert_eq!(available[0].text, "certain");
        }
    }

    #[test]
    fn test_requirements_skip_probability_gate() {
        // A choice with satisfied requirements is included even with an
        // impossible probability attached.
        let mut state = WorldState::new();
        state.set_resource("gold", 10.0);

        let choice = Choice::new("haggle")
            .with_requirement(Trigger::resource("gold", Comparison::Gt, 0.0))
            .with_probability(0.0);

        let mut rng = StdRng::seed_from_u64(3);
        assert!(is_available_with_rng(&choice, &state, &mut rng));
    }

    #[test]
    fn test_order_preserved() {
        let choices = vec![
            Choice::new("first"),
            Choice::new("second"),
            Choice::new("third"),
        ];
        let available = available_choices(&choices, &WorldState::new());
        let texts: Vec<_> = available.iter().map(|c| c.text.as_str()).collect();
        assert_eq!(texts, vec!["first", "second", "third"]);
    }
}
