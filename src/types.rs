//! This module defines the core data structures and types shared across the graph editor,
//! including transitions, symbols, head directions, geometry constants, and error types.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::Rule;

/// Identity of a state in the transition graph.
pub type StateId = u32;

/// The maximum allowed size for a transition program in bytes.
pub const MAX_PROGRAM_SIZE: usize = 65536; // 64KB
/// Radius of a rendered state, in model units.
pub const STATE_RADIUS: f64 = 40.0;
/// Spacing of the background grid, in model units.
pub const GRID_UNIT: f64 = 50.0;
/// Maximum distance between a click and an edge for the edge to count as hit.
pub const EDGE_HIT_THRESHOLD: f64 = 8.0;
/// Bounds for the viewport zoom level.
pub const MIN_ZOOM: f64 = 0.3;
pub const MAX_ZOOM: f64 = 3.0;
/// Upper bound on rejection-sampling attempts when placing a new state.
pub const MAX_PLACEMENT_ATTEMPTS: usize = 10_000;

/// A tape symbol. The editor works on binary tapes only.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Symbol {
    #[default]
    #[serde(rename = "0")]
    Zero,
    #[serde(rename = "1")]
    One,
}

impl Symbol {
    pub fn as_char(self) -> char {
        match self {
            Symbol::Zero => '0',
            Symbol::One => '1',
        }
    }

    /// Returns the other symbol. Used by editors cycling through values.
    pub fn toggled(self) -> Self {
        match self {
            Symbol::Zero => Symbol::One,
            Symbol::One => Symbol::Zero,
        }
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

/// Represents the possible directions a Turing Machine head can move.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// Move the head one position to the left.
    #[serde(rename = "L")]
    Left,
    /// Move the head one position to the right.
    #[serde(rename = "R")]
    Right,
    /// Halt, the head does not move.
    #[default]
    #[serde(rename = "H")]
    Halt,
}

impl Direction {
    pub fn as_char(self) -> char {
        match self {
            Direction::Left => 'L',
            Direction::Right => 'R',
            Direction::Halt => 'H',
        }
    }

    /// Cycles `L -> R -> H -> L`.
    pub fn next(self) -> Self {
        match self {
            Direction::Left => Direction::Right,
            Direction::Right => Direction::Halt,
            Direction::Halt => Direction::Left,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

/// Represents a single transition rule, drawn as a directed edge between two states.
///
/// The same struct is used by the codec, the graph model and the renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Transition {
    /// The state the rule applies to.
    pub from: StateId,
    /// The state the machine moves to.
    pub to: StateId,
    /// The symbol read under the head.
    pub read: Symbol,
    /// The symbol written before moving.
    pub write: Symbol,
    /// The head movement.
    pub direction: Direction,
}

impl Transition {
    pub fn new(
        from: StateId,
        to: StateId,
        read: Symbol,
        write: Symbol,
        direction: Direction,
    ) -> Self {
        Self {
            from,
            to,
            read,
            write,
            direction,
        }
    }

    /// A fresh edge as created by dragging between two states: reads `0`, writes `0`, halts.
    pub fn link(from: StateId, to: StateId) -> Self {
        Self::new(from, to, Symbol::Zero, Symbol::Zero, Direction::Halt)
    }

    pub fn is_self_loop(&self) -> bool {
        self.from == self.to
    }

    /// Edge label in the `Read,Write/Move` form.
    pub fn label(&self) -> String {
        format!("{},{}/{}", self.read, self.write, self.direction)
    }
}

impl fmt::Display for Transition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}->{}:{}", self.from, self.to, self.label())
    }
}

/// Represents the errors raised by the codec and by graph mutations.
///
/// Hit-testing never produces an error: absence of a hit is `None`.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GraphError {
    /// A statement does not match the `From->To:Read,Write/Move` grammar.
    #[error("Parse error in statement {index}: {source}")]
    ParseError {
        index: usize,
        source: Box<pest::error::Error<Rule>>,
    },
    /// A mutation referenced a state that does not exist.
    #[error("Unknown state id: {0}")]
    UnknownStateId(StateId),
    /// A mutation referenced a transition index that does not exist.
    #[error("Unknown transition index: {0}")]
    UnknownTransition(usize),
    /// An explicit state key is already in use.
    #[error("State {0} already exists")]
    DuplicateState(StateId),
    /// The program text exceeds `MAX_PROGRAM_SIZE`.
    #[error("Program too large: {0} bytes (max: {max})", max = MAX_PROGRAM_SIZE)]
    ProgramTooLarge(usize),
    /// The transitions violate a structural rule (see `analyzer`).
    #[error("Program validation error: {0}")]
    ValidationError(String),
    /// Reading or writing program files failed.
    #[error("File error: {0}")]
    FileError(String),
}
