//! This crate provides the core logic for editing Turing machine programs as graphs.
//! It includes modules for parsing and encoding the transition notation, the graph model
//! with hit-testing and state placement, edge layout, the viewport and pointer interaction,
//! scene rendering, and a collection of predefined programs.

pub mod analyzer;
pub mod arrow;
pub mod encoder;
pub mod geometry;
pub mod graph;
pub mod interaction;
pub mod loader;
pub mod parser;
pub mod programs;
pub mod render;
pub mod svg;
pub mod transition_map;
pub mod types;
pub mod viewport;

/// Re-exports the `Rule` enum from the parser module, used by the `pest` grammar.
pub use crate::parser::Rule;
/// Re-exports the `analyze` functions and `AnalysisError` enum from the analyzer module.
pub use analyzer::{analyze, analyze_graph, AnalysisError};
/// Re-exports the edge layout types and functions from the arrow module.
pub use arrow::{curve_slots, layout_edges, to_arrow, Arrow, CurveSlot, EdgeShape};
/// Re-exports the encoding functions from the encoder module.
pub use encoder::{encode, encode_pretty};
/// Re-exports the geometry primitives.
pub use geometry::{Point, Rect};
/// Re-exports the graph model.
pub use graph::{GraphModel, LoadReport, State};
/// Re-exports the pointer interaction types.
pub use interaction::{Gesture, InteractionController, Outcome, Selection};
/// Re-exports the `ProgramLoader` struct and `Program` from the loader module.
pub use loader::{Program, ProgramLoader};
/// Re-exports the parsing functions from the parser module.
pub use parser::{parse, parse_algorithm, parse_transition};
/// Re-exports `ProgramInfo`, `ProgramManager`, and `PROGRAMS` from the programs module.
pub use programs::{ProgramInfo, ProgramManager, PROGRAMS};
/// Re-exports the scene types and the `render` function.
pub use render::{render, DrawCommand, Scene, Transform};
/// Re-exports the deterministic transition map.
pub use transition_map::{Action, TransitionMap};
/// Re-exports the core types and geometry constants.
pub use types::{
    Direction, GraphError, StateId, Symbol, Transition, GRID_UNIT, MAX_PROGRAM_SIZE, MAX_ZOOM,
    MIN_ZOOM, STATE_RADIUS,
};
/// Re-exports the viewport types.
pub use viewport::{RenderBounds, Viewport};
