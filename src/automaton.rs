use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::math::{OrderedMap, OrderedSet};

/// The identifier of a state. Unique within one [`Automaton`], before and after conversion.
pub type StateId = String;

/// An input symbol. Symbols are plain strings in the record format.
pub type Symbol = String;

/// The value of a transition, i.e. where an automaton may move on reading a symbol.
///
/// The record format allows a bare identifier (the shape a DFA record uses) as well as a
/// list of identifiers (the NFA shape). The shape is per key and is preserved as given:
/// a scalar target stays a scalar on output and a list stays a list, even a singleton one.
/// Representing the two shapes as one tagged value keeps the rewrite logic uniform.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Targets {
    /// A single target state.
    One(StateId),
    /// A list of target states, in record order.
    Many(Vec<StateId>),
}

impl Targets {
    /// Returns an iterator over the referenced state identifiers.
    pub fn iter(&self) -> std::slice::Iter<'_, StateId> {
        match self {
            Targets::One(target) => std::slice::from_ref(target).iter(),
            Targets::Many(targets) => targets.iter(),
        }
    }

    /// Returns true if `id` occurs among the targets.
    pub fn contains(&self, id: &str) -> bool {
        self.iter().any(|target| target == id)
    }

    /// Replaces every occurrence of `from` with `to`. The shape, the order of a list and
    /// its remaining elements are left untouched.
    pub fn rewrite(&mut self, from: &str, to: &StateId) {
        match self {
            Targets::One(target) => {
                if *target == from {
                    *target = to.clone();
                }
            }
            Targets::Many(targets) => {
                for target in targets.iter_mut() {
                    if *target == from {
                        *target = to.clone();
                    }
                }
            }
        }
    }

    /// Merges `target` into the value, lifting a scalar into a list when necessary.
    /// Merging a target that is already present changes nothing.
    pub fn merge(&mut self, target: &StateId) {
        if self.contains(target) {
            return;
        }
        match self {
            Targets::One(existing) => {
                let first = std::mem::take(existing);
                *self = Targets::Many(vec![first, target.clone()]);
            }
            Targets::Many(targets) => targets.push(target.clone()),
        }
    }

    /// Renders the targets the way the console transition table shows them.
    pub fn show(&self) -> String {
        match self {
            Targets::One(target) => target.clone(),
            Targets::Many(targets) => format!("{{{}}}", targets.iter().join(", ")),
        }
    }
}

impl From<&str> for Targets {
    fn from(value: &str) -> Self {
        Targets::One(value.to_string())
    }
}

impl<const N: usize> From<[&str; N]> for Targets {
    fn from(value: [&str; N]) -> Self {
        Targets::Many(value.into_iter().map(|target| target.to_string()).collect())
    }
}

/// One state record: an identifier, the symbol transitions in the order the record listed
/// them, and an optional epsilon transition.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct State {
    /// The identifier of this state.
    #[serde(rename = "state")]
    pub id: StateId,
    /// Transitions keyed by symbol. Every key of the record other than `state` and
    /// `epsilon` lands here.
    #[serde(flatten)]
    pub transitions: OrderedMap<Symbol, Targets>,
    /// The epsilon transition, if any. Serialized after the symbol keys, which is the
    /// shape converted records have always had.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub epsilon: Option<Targets>,
}

impl State {
    /// Creates a state carrying no transitions at all.
    pub fn new(id: impl Into<StateId>) -> Self {
        Self {
            id: id.into(),
            transitions: OrderedMap::default(),
            epsilon: None,
        }
    }

    /// Creates a state whose only behavior is an epsilon transition to `target`. This is
    /// the shape of the dedicated start state a conversion introduces.
    pub fn epsilon_only(id: impl Into<StateId>, target: impl Into<StateId>) -> Self {
        Self::new(id).with_epsilon(Targets::One(target.into()))
    }

    /// Adds a transition on `symbol`, consuming and returning `self` for chaining.
    pub fn with_transition(mut self, symbol: impl Into<Symbol>, targets: impl Into<Targets>) -> Self {
        self.transitions.insert(symbol.into(), targets.into());
        self
    }

    /// Sets the epsilon transition, consuming and returning `self` for chaining.
    pub fn with_epsilon(mut self, targets: impl Into<Targets>) -> Self {
        self.epsilon = Some(targets.into());
        self
    }

    /// Rewrites every reference to `from`, in symbol and epsilon transitions alike, to `to`.
    pub fn rewrite_targets(&mut self, from: &str, to: &StateId) {
        for targets in self.transitions.values_mut() {
            targets.rewrite(from, to);
        }
        if let Some(epsilon) = self.epsilon.as_mut() {
            epsilon.rewrite(from, to);
        }
    }

    /// Merges `target` into the epsilon transition, creating one if the state had none.
    /// An existing epsilon target is never overwritten, only joined.
    pub fn add_epsilon(&mut self, target: &StateId) {
        match self.epsilon.as_mut() {
            Some(epsilon) => epsilon.merge(target),
            None => self.epsilon = Some(Targets::One(target.clone())),
        }
    }

    /// Returns true if any transition of this state, epsilon included, references `id`.
    pub fn references(&self, id: &str) -> bool {
        self.transitions.values().any(|targets| targets.contains(id))
            || self
                .epsilon
                .as_ref()
                .is_some_and(|epsilon| epsilon.contains(id))
    }
}

/// An automaton as one record of the input format describes it.
///
/// The field order mirrors the record format, so serialized output reads like the input
/// it came from. `states` order and `accepting` order only affect readability, never the
/// accepted language.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Automaton {
    /// The state records, in listing order.
    pub states: Vec<State>,
    /// The input alphabet. Conversion passes it through unchanged.
    pub alphabet: Vec<Symbol>,
    /// The identifier of the initial state.
    pub initial: StateId,
    /// The identifiers of the accepting states, in listing order.
    pub accepting: OrderedSet<StateId>,
}

impl Automaton {
    /// Assembles an automaton from its four parts.
    pub fn from_parts<I, A, S>(states: I, alphabet: A, initial: impl Into<StateId>, accepting: S) -> Self
    where
        I: IntoIterator<Item = State>,
        A: IntoIterator<Item = Symbol>,
        S: IntoIterator<Item = StateId>,
    {
        Self {
            states: states.into_iter().collect(),
            alphabet: alphabet.into_iter().collect(),
            initial: initial.into(),
            accepting: accepting.into_iter().collect(),
        }
    }

    /// Returns the number of states.
    pub fn size(&self) -> usize {
        self.states.len()
    }

    /// Returns the state with the given identifier, if it exists.
    pub fn state(&self, id: &str) -> Option<&State> {
        self.states.iter().find(|state| state.id == id)
    }

    /// Returns the state with the given identifier mutably, if it exists.
    pub fn state_mut(&mut self, id: &str) -> Option<&mut State> {
        self.states.iter_mut().find(|state| state.id == id)
    }

    /// Returns true if a state with the given identifier exists.
    pub fn contains_state(&self, id: &str) -> bool {
        self.state(id).is_some()
    }

    /// Builds a table of all transitions, one row per state in listing order. The initial
    /// state is marked with `->`, accepting states with `*`.
    pub fn transition_table(&self) -> String {
        let mut builder = tabled::builder::Builder::default();
        builder.push_record(
            std::iter::once("state".to_string())
                .chain(self.alphabet.iter().cloned())
                .chain(std::iter::once("epsilon".to_string())),
        );
        for state in &self.states {
            let mut row = vec![self.decorate(&state.id)];
            for symbol in &self.alphabet {
                row.push(match state.transitions.get(symbol) {
                    Some(targets) => targets.show(),
                    None => "-".to_string(),
                });
            }
            row.push(match state.epsilon.as_ref() {
                Some(epsilon) => epsilon.show(),
                None => "-".to_string(),
            });
            builder.push_record(row);
        }

        builder
            .build()
            .with(tabled::settings::Style::rounded())
            .to_string()
    }

    fn decorate(&self, id: &StateId) -> String {
        let mut out = String::new();
        if *id == self.initial {
            out.push_str("->");
        }
        if self.accepting.contains(id) {
            out.push('*');
        }
        out.push_str(id);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn example_record() -> &'static str {
        r#"{
            "states": [
                { "state": "q0", "a": "q1", "b": ["q0", "q1"] },
                { "state": "q1", "a": "q1", "epsilon": "q0" }
            ],
            "alphabet": ["a", "b"],
            "initial": "q0",
            "accepting": ["q1"]
        }"#
    }

    #[test_log::test]
    fn parse_record_preserves_shapes_and_order() {
        let automaton: Automaton = serde_json::from_str(example_record()).unwrap();

        assert_eq!(automaton.size(), 2);
        assert_eq!(automaton.initial, "q0");
        assert!(automaton.accepting.contains("q1"));

        let q0 = automaton.state("q0").unwrap();
        assert_eq!(q0.transitions.get("a"), Some(&Targets::from("q1")));
        assert_eq!(q0.transitions.get("b"), Some(&Targets::from(["q0", "q1"])));
        assert_eq!(
            q0.transitions.keys().collect::<Vec<_>>(),
            vec!["a", "b"],
            "symbol keys must keep record order"
        );
        assert!(q0.epsilon.is_none());

        let q1 = automaton.state("q1").unwrap();
        assert_eq!(q1.epsilon, Some(Targets::from("q0")));
        assert!(!q1.transitions.contains_key("epsilon"));
    }

    #[test_log::test]
    fn serialize_keeps_record_shape() {
        let automaton: Automaton = serde_json::from_str(example_record()).unwrap();
        let out = serde_json::to_string(&automaton).unwrap();
        assert_eq!(
            out,
            r#"{"states":[{"state":"q0","a":"q1","b":["q0","q1"]},{"state":"q1","a":"q1","epsilon":"q0"}],"alphabet":["a","b"],"initial":"q0","accepting":["q1"]}"#
        );
    }

    #[test_log::test]
    fn record_missing_required_field_is_rejected() {
        let broken = r#"{ "states": [], "alphabet": [], "accepting": [] }"#;
        assert!(serde_json::from_str::<Automaton>(broken).is_err());
    }

    #[test_log::test]
    fn rewrite_keeps_shape() {
        let mut scalar = Targets::from("q0");
        scalar.rewrite("q0", &"q01".to_string());
        assert_eq!(scalar, Targets::from("q01"));

        let mut list = Targets::from(["q0", "q2", "q0"]);
        list.rewrite("q0", &"q01".to_string());
        assert_eq!(list, Targets::from(["q01", "q2", "q01"]));

        let mut untouched = Targets::from(["q2"]);
        untouched.rewrite("q0", &"q01".to_string());
        assert_eq!(untouched, Targets::from(["q2"]), "singleton list stays a list");
    }

    #[test_log::test]
    fn merge_never_drops_existing_targets() {
        let mut epsilon = Targets::from("q2");
        epsilon.merge(&"q01".to_string());
        assert_eq!(epsilon, Targets::from(["q2", "q01"]));

        epsilon.merge(&"q01".to_string());
        assert_eq!(epsilon, Targets::from(["q2", "q01"]), "merging twice is a no-op");

        let mut same = Targets::from("q01");
        same.merge(&"q01".to_string());
        assert_eq!(same, Targets::from("q01"), "scalar is not lifted for a duplicate");
    }

    #[test_log::test]
    fn transition_table_marks_initial_and_accepting() {
        let automaton: Automaton = serde_json::from_str(example_record()).unwrap();
        let table = automaton.transition_table();
        assert!(table.contains("->q0"));
        assert!(table.contains("*q1"));
        assert!(table.contains("{q0, q1}"));
    }
}
