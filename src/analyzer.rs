//! This module provides checks for transition programs that must be strictly deterministic
//! downstream, and for graphs whose transitions may reference states that were never added.

use crate::graph::GraphModel;
use crate::types::{GraphError, StateId, Symbol, Transition};
use std::collections::{BTreeSet, HashMap};

/// Represents the problems found while analyzing a transition program.
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum AnalysisError {
    /// Two or more rules apply to the same state and read symbol.
    NonDeterministic { state: StateId, read: Symbol },
    /// Transitions reference states that are not part of the graph.
    UnknownStates(Vec<StateId>),
}

impl From<AnalysisError> for GraphError {
    /// Converts an `AnalysisError` into a `GraphError::ValidationError`.
    fn from(error: AnalysisError) -> Self {
        match error {
            AnalysisError::NonDeterministic { state, read } => GraphError::ValidationError(
                format!("State {} has more than one rule for symbol {}", state, read),
            ),
            AnalysisError::UnknownStates(states) => GraphError::ValidationError(format!(
                "Transitions reference undefined states: {:?}",
                states
            )),
        }
    }
}

/// Analyzes transitions for rules that a deterministic machine cannot hold together.
///
/// # Returns
///
/// * `Ok(())` if every `(state, read)` pair has at most one rule.
/// * `Err(GraphError::ValidationError)` describing the first conflict.
pub fn analyze(transitions: &[Transition]) -> Result<(), GraphError> {
    check_determinism(transitions)?;
    Ok(())
}

/// Analyzes a graph: determinism of its transitions and existence of every endpoint.
pub fn analyze_graph(graph: &GraphModel) -> Result<(), GraphError> {
    let errors = [check_determinism(graph.transitions()), check_references(graph)]
        .into_iter()
        .filter_map(Result::err)
        .collect::<Vec<_>>();

    match errors.into_iter().next() {
        Some(first_error) => Err(first_error.into()),
        None => Ok(()),
    }
}

/// Checks that no two rules share a state and read symbol.
fn check_determinism(transitions: &[Transition]) -> Result<(), AnalysisError> {
    let mut seen: HashMap<(StateId, Symbol), usize> = HashMap::new();

    for transition in transitions {
        let count = seen.entry((transition.from, transition.read)).or_default();
        *count += 1;
        if *count > 1 {
            return Err(AnalysisError::NonDeterministic {
                state: transition.from,
                read: transition.read,
            });
        }
    }

    Ok(())
}

/// Checks that every transition endpoint is a state of the graph.
fn check_references(graph: &GraphModel) -> Result<(), AnalysisError> {
    let missing: BTreeSet<StateId> = graph
        .transitions()
        .iter()
        .flat_map(|transition| [transition.from, transition.to])
        .filter(|id| graph.state(*id).is_none())
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(AnalysisError::UnknownStates(missing.into_iter().collect()))
    }
}
