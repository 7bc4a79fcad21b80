//! This module provides the deterministic view of a transition program: at most one rule per
//! `(state, read symbol)` pair.

use crate::encoder::encode;
use crate::parser::parse_algorithm;
use crate::types::{Direction, StateId, Symbol, Transition};
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// What a deterministic machine does after reading a symbol in a state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Action {
    pub to: StateId,
    pub write: Symbol,
    pub direction: Direction,
}

/// A `From -> Read -> Action` map.
///
/// Building the map from transitions with several rules for the same `(from, read)` keeps
/// the last one. Use `analyzer::analyze` first when such a collapse must be reported.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionMap {
    rules: BTreeMap<StateId, BTreeMap<Symbol, Action>>,
}

impl TransitionMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the map, last write wins.
    pub fn from_transitions(transitions: &[Transition]) -> Self {
        let mut map = Self::new();
        for transition in transitions {
            map.insert(transition);
        }
        map
    }

    /// Builds the map from program text. Malformed statements are skipped.
    pub fn from_algorithm(input: &str) -> Self {
        let transitions: Vec<Transition> = parse_algorithm(input)
            .into_iter()
            .filter_map(Result::ok)
            .collect();

        Self::from_transitions(&transitions)
    }

    /// Inserts a rule and returns the action it replaced, if any.
    pub fn insert(&mut self, transition: &Transition) -> Option<Action> {
        let action = Action {
            to: transition.to,
            write: transition.write,
            direction: transition.direction,
        };

        let replaced = self
            .rules
            .entry(transition.from)
            .or_default()
            .insert(transition.read, action);

        if let Some(previous) = replaced {
            debug!(
                "Rule for state {} reading {} replaced: {:?} -> {:?}",
                transition.from, transition.read, previous, action
            );
        }

        replaced
    }

    pub fn get(&self, from: StateId, read: Symbol) -> Option<&Action> {
        self.rules.get(&from).and_then(|rules| rules.get(&read))
    }

    /// Number of rules in the map.
    pub fn len(&self) -> usize {
        self.rules.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Flattens the map back into transitions, ordered by state id then read symbol.
    pub fn to_transitions(&self) -> Vec<Transition> {
        self.rules
            .iter()
            .flat_map(|(&from, rules)| {
                rules.iter().map(move |(&read, action)| Transition {
                    from,
                    to: action.to,
                    read,
                    write: action.write,
                    direction: action.direction,
                })
            })
            .collect()
    }

    /// Encodes the map in the transition notation.
    pub fn export(&self) -> String {
        encode(&self.to_transitions())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_map_lookup() {
        let map = TransitionMap::from_algorithm("0->1:0,1/R;1->0:1,0/L;1->1:0,0/H;");

        assert_eq!(map.len(), 3);
        assert_eq!(
            map.get(1, Symbol::One),
            Some(&Action {
                to: 0,
                write: Symbol::Zero,
                direction: Direction::Left
            })
        );
        assert_eq!(map.get(0, Symbol::One), None);
        assert_eq!(map.get(7, Symbol::Zero), None);
    }

    #[test]
    fn test_last_write_wins() {
        let transitions = vec![
            Transition::new(0, 1, Symbol::Zero, Symbol::One, Direction::Right),
            Transition::new(0, 2, Symbol::Zero, Symbol::Zero, Direction::Left),
        ];
        let map = TransitionMap::from_transitions(&transitions);

        assert_eq!(map.len(), 1);
        assert_eq!(map.get(0, Symbol::Zero).map(|action| action.to), Some(2));
    }

    #[test]
    fn test_insert_returns_replaced_action() {
        let mut map = TransitionMap::new();
        assert!(map.is_empty());

        let first = Transition::new(3, 4, Symbol::One, Symbol::One, Direction::Halt);
        assert_eq!(map.insert(&first), None);

        let second = Transition::new(3, 5, Symbol::One, Symbol::Zero, Direction::Right);
        let replaced = map.insert(&second).unwrap();
        assert_eq!(replaced.to, 4);
    }

    #[test]
    fn test_export_is_ordered() {
        let map = TransitionMap::from_algorithm("2->0:1,1/L;0->2:1,0/R;0->1:0,1/R;");

        assert_eq!(map.export(), "0->1:0,1/R;0->2:1,0/R;2->0:1,1/L;");
    }

    #[test]
    fn test_from_algorithm_skips_malformed() {
        let map = TransitionMap::from_algorithm("0->1:0,1/R;oops;1->0:1,0/L;");
        assert_eq!(map.len(), 2);
    }

    #[test]
    fn test_json_representation() {
        let map = TransitionMap::from_algorithm("0->1:0,1/R;");
        let json = serde_json::to_string(&map).unwrap();

        assert_eq!(
            json,
            r#"{"rules":{"0":{"0":{"to":1,"write":"1","direction":"R"}}}}"#
        );
    }
}
