use thiserror::Error;
use tracing::{debug, trace};

use crate::automaton::{Automaton, State, StateId};

/// Suffix appended to the initial state's identifier when relabeling frees the original
/// name for the dedicated start state.
pub const RENAME_SUFFIX: &str = "1";

/// Errors that reject the conversion of a single automaton. They are fatal for the
/// affected record only, a batch carries on with its siblings.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StarError {
    /// The identifier derived for the renamed initial state already names another state.
    /// Proceeding would collapse two distinct states, so the record is rejected instead.
    #[error("cannot rename initial state \"{initial}\": \"{derived}\" already names a state")]
    IdentifierCollision {
        /// The identifier of the initial state.
        initial: StateId,
        /// The derived identifier that turned out to be taken.
        derived: StateId,
    },
    /// The automaton declares an initial state that none of its state records carries.
    #[error("no state with the initial identifier \"{initial}\" exists")]
    MissingInitialState {
        /// The declared initial identifier.
        initial: StateId,
    },
}

/// Renames the initial state to its identifier with [`RENAME_SUFFIX`] appended and
/// rewrites every transition that referenced the old name, freeing that name up for the
/// start state [`augment`] introduces. Returns the replacement identifier.
///
/// The renamed state keeps its transitions as they were, up to reference rewriting; if it
/// was accepting it stays accepting under the new name. Fails without having touched the
/// automaton when the derived identifier is already taken or the initial state is absent.
pub fn relabel(automaton: &mut Automaton) -> Result<StateId, StarError> {
    let initial = automaton.initial.clone();
    let renamed: StateId = format!("{initial}{RENAME_SUFFIX}");

    if automaton.contains_state(&renamed) {
        return Err(StarError::IdentifierCollision {
            initial,
            derived: renamed,
        });
    }
    let Some(state) = automaton.state_mut(&initial) else {
        return Err(StarError::MissingInitialState { initial });
    };
    state.id = renamed.clone();
    trace!("renamed initial state {initial} to {renamed}");

    if automaton.accepting.contains(&initial) {
        automaton.accepting.insert(renamed.clone());
    }

    // Other states may still point at the old name, the renamed one included (self loops).
    for state in &mut automaton.states {
        state.rewrite_targets(&initial, &renamed);
    }

    Ok(renamed)
}

/// Adds the epsilon structure that closes the automaton under repetition: every accepting
/// state gets an epsilon transition back to `renamed` merged in, and a fresh start state
/// reusing the original initial identifier is put in front, accepting and epsilon-linked
/// to `renamed` so the empty word is accepted as well.
pub fn augment(automaton: &mut Automaton, renamed: &StateId) {
    for state in &mut automaton.states {
        if automaton.accepting.contains(&state.id) {
            state.add_epsilon(renamed);
        }
    }

    let initial = automaton.initial.clone();
    automaton
        .states
        .insert(0, State::epsilon_only(initial.clone(), renamed.clone()));
    automaton.accepting.insert(initial);
}

/// Converts one automaton into the star automaton accepting the Kleene closure of its
/// language. A pure function of the input value, no other state is consulted or kept.
pub fn star(mut automaton: Automaton) -> Result<Automaton, StarError> {
    let renamed = relabel(&mut automaton)?;
    augment(&mut automaton, &renamed);
    debug!(
        "converted automaton with initial state {} into {} states",
        automaton.initial,
        automaton.size()
    );
    Ok(automaton)
}

/// Converts every automaton of a batch independently, in the order given. A rejected
/// element yields its error in place and never aborts the conversion of its siblings.
pub fn star_all<I>(automata: I) -> Vec<Result<Automaton, StarError>>
where
    I: IntoIterator<Item = Automaton>,
{
    automata.into_iter().map(star).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::automaton::Targets;
    use crate::math::Set;

    fn simple() -> Automaton {
        Automaton::from_parts(
            [
                State::new("q0").with_transition("a", "q1"),
                State::new("q1").with_transition("a", "q1"),
            ],
            ["a".to_string()],
            "q0",
            ["q1".to_string()],
        )
    }

    #[test_log::test]
    fn worked_example() {
        let starred = star(simple()).unwrap();

        assert_eq!(starred.initial, "q0");
        assert_eq!(
            starred.accepting.iter().collect::<Vec<_>>(),
            vec!["q1", "q0"],
            "new start state is appended to the accepting set, not prepended"
        );

        let ids = starred.states.iter().map(|s| s.id.as_str()).collect::<Vec<_>>();
        assert_eq!(ids, vec!["q0", "q01", "q1"], "fresh start state comes first");

        let start = starred.state("q0").unwrap();
        assert!(start.transitions.is_empty());
        assert_eq!(start.epsilon, Some(Targets::from("q01")));

        let renamed = starred.state("q01").unwrap();
        assert_eq!(renamed.transitions.get("a"), Some(&Targets::from("q1")));
        assert!(renamed.epsilon.is_none());

        let accepting = starred.state("q1").unwrap();
        assert_eq!(accepting.transitions.get("a"), Some(&Targets::from("q1")));
        assert_eq!(accepting.epsilon, Some(Targets::from("q01")));
    }

    #[test_log::test]
    fn adds_exactly_one_state() {
        let before = simple();
        let size = before.size();
        assert_eq!(star(before).unwrap().size(), size + 1);
    }

    #[test_log::test]
    fn every_reference_to_the_old_name_is_rewritten() {
        let automaton = Automaton::from_parts(
            [
                State::new("q0")
                    .with_transition("a", "q0")
                    .with_transition("b", ["q0", "q1"]),
                State::new("q1")
                    .with_transition("a", ["q1", "q0"])
                    .with_transition("b", "q0")
                    .with_epsilon("q0"),
            ],
            ["a".to_string(), "b".to_string()],
            "q0",
            ["q1".to_string()],
        );
        let starred = star(automaton).unwrap();

        let mut referenced = Set::default();
        for state in &starred.states {
            for targets in state.transitions.values() {
                referenced.extend(targets.iter().cloned());
            }
            if state.id != starred.initial {
                if let Some(epsilon) = state.epsilon.as_ref() {
                    referenced.extend(epsilon.iter().cloned());
                }
            }
        }
        assert!(
            !referenced.contains("q0"),
            "only the fresh start state may still point at q0's successor structure"
        );
        assert!(referenced.contains("q01"));
        for state in starred.states.iter().filter(|state| state.id != starred.initial) {
            assert!(!state.references("q0"));
        }

        let renamed = starred.state("q01").unwrap();
        assert_eq!(renamed.transitions.get("a"), Some(&Targets::from("q01")));
        assert_eq!(renamed.transitions.get("b"), Some(&Targets::from(["q01", "q1"])));
    }

    #[test_log::test]
    fn existing_epsilon_targets_are_merged_not_overwritten() {
        let automaton = Automaton::from_parts(
            [
                State::new("q0").with_transition("a", "q1"),
                State::new("q1").with_epsilon("q2"),
                State::new("q2"),
            ],
            ["a".to_string()],
            "q0",
            ["q1".to_string()],
        );
        let starred = star(automaton).unwrap();

        assert_eq!(
            starred.state("q1").unwrap().epsilon,
            Some(Targets::from(["q2", "q01"]))
        );
    }

    #[test_log::test]
    fn accepting_initial_state_stays_accepting_under_the_new_name() {
        let automaton = Automaton::from_parts(
            [State::new("q0").with_transition("a", "q0")],
            ["a".to_string()],
            "q0",
            ["q0".to_string()],
        );
        let starred = star(automaton).unwrap();

        assert!(starred.accepting.contains("q01"));
        assert!(starred.accepting.contains("q0"));
        // the renamed state is accepting, so it got the epsilon loop as well
        assert_eq!(
            starred.state("q01").unwrap().epsilon,
            Some(Targets::from("q01"))
        );
        // while the fresh start state carries exactly its one epsilon transition
        let start = starred.state("q0").unwrap();
        assert!(start.transitions.is_empty());
        assert_eq!(start.epsilon, Some(Targets::from("q01")));
    }

    #[test_log::test]
    fn derived_identifier_collision_is_rejected() {
        let automaton = Automaton::from_parts(
            [
                State::new("q0").with_transition("a", "q01"),
                State::new("q01"),
            ],
            ["a".to_string()],
            "q0",
            ["q01".to_string()],
        );
        let before = automaton.clone();
        let mut mutated = automaton.clone();

        assert_eq!(
            relabel(&mut mutated),
            Err(StarError::IdentifierCollision {
                initial: "q0".to_string(),
                derived: "q01".to_string(),
            })
        );
        assert_eq!(mutated, before, "a rejected automaton is left untouched");
        assert!(star(automaton).is_err());
    }

    #[test_log::test]
    fn declared_initial_state_must_exist() {
        let automaton = Automaton::from_parts(
            [State::new("q1")],
            ["a".to_string()],
            "q0",
            Vec::<StateId>::new(),
        );
        assert_eq!(
            star(automaton),
            Err(StarError::MissingInitialState {
                initial: "q0".to_string()
            })
        );
    }

    #[test_log::test]
    fn one_rejected_element_never_aborts_its_siblings() {
        let colliding = Automaton::from_parts(
            [State::new("q0"), State::new("q01")],
            ["a".to_string()],
            "q0",
            Vec::<StateId>::new(),
        );
        let results = star_all([simple(), colliding, simple()]);

        assert_eq!(results.len(), 3);
        assert!(results[0].is_ok());
        assert!(results[1].is_err());
        assert!(results[2].is_ok());
    }
}
