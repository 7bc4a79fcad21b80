//! Pointer gestures on the graph editor.
//!
//! `InteractionController` turns device-space pointer events into graph edits and viewport
//! changes. Between events it remembers exactly one `Gesture`. Every handler re-renders and
//! returns the resulting scene together with any selection the host should react to.

use crate::geometry::Point;
use crate::graph::GraphModel;
use crate::render::{render, Scene};
use crate::types::StateId;
use crate::viewport::{RenderBounds, Viewport};
use log::{debug, warn};

/// What the pointer is currently doing.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Gesture {
    #[default]
    Idle,
    /// Dragging the empty canvas. `last` is the previous device position.
    Panning { last: Point },
    /// Dragging a state.
    MovingState { id: StateId, last: Point },
    /// Dragging a new transition out of `from`. Points are in model space.
    CreatingTransition {
        from: StateId,
        origin: Point,
        current: Point,
    },
    /// The pointer went down on an edge.
    Selecting { index: usize },
}

/// A transition the host should select.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection {
    /// An existing edge was clicked.
    Clicked(usize),
    /// A transition was just created by dragging between two states.
    Created(usize),
}

impl Selection {
    pub fn index(&self) -> usize {
        match *self {
            Selection::Clicked(index) | Selection::Created(index) => index,
        }
    }
}

/// The result of handling one event.
#[derive(Debug, Clone, PartialEq)]
pub struct Outcome {
    pub scene: Scene,
    pub selection: Option<Selection>,
}

#[derive(Debug, Clone)]
pub struct InteractionController {
    viewport: Viewport,
    bounds: RenderBounds,
    gesture: Gesture,
}

impl InteractionController {
    pub fn new(viewport: Viewport) -> Self {
        Self {
            bounds: RenderBounds::new(viewport.viewport_rect()),
            viewport,
            gesture: Gesture::Idle,
        }
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn gesture(&self) -> Gesture {
        self.gesture
    }

    /// Primary button down.
    ///
    /// Over a state the state starts moving. Over an edge the edge is selected. Anywhere
    /// else the canvas starts panning.
    pub fn start(&mut self, graph: &GraphModel, device: Point) -> Outcome {
        let pos = self.viewport.local_pos(device);
        let mut selection = None;

        self.gesture = if let Some(id) = graph.check(pos) {
            Gesture::MovingState { id, last: device }
        } else if let Some(index) = graph.check_vertexes_click(pos) {
            debug!("Transition {} clicked", index);
            selection = Some(Selection::Clicked(index));
            Gesture::Selecting { index }
        } else {
            Gesture::Panning { last: device }
        };

        self.outcome(graph, selection)
    }

    /// Secondary button down: begins dragging a new transition when over a state.
    pub fn start_create_transition(&mut self, graph: &GraphModel, device: Point) -> Outcome {
        let pos = self.viewport.local_pos(device);

        if let Some(from) = graph.check(pos) {
            self.gesture = Gesture::CreatingTransition {
                from,
                origin: pos,
                current: pos,
            };
        }

        self.outcome(graph, None)
    }

    /// Pointer moved. Device deltas are divided by the zoom to get model deltas.
    pub fn moved(&mut self, graph: &mut GraphModel, device: Point) -> Outcome {
        let zoom = self.viewport.zoom();

        match &mut self.gesture {
            Gesture::Panning { last } => {
                let delta = (device - *last) * (1.0 / zoom);
                self.viewport.pan(delta.x, delta.y);
                *last = device;
            }
            Gesture::MovingState { id, last } => {
                let delta = (device - *last) * (1.0 / zoom);
                if let Err(e) = graph.update_state(*id, delta.x, delta.y) {
                    warn!("Cannot move state: {}", e);
                }
                *last = device;
            }
            Gesture::CreatingTransition { current, .. } => {
                *current = self.viewport.local_pos(device);
            }
            Gesture::Idle | Gesture::Selecting { .. } => {}
        }

        self.outcome(graph, None)
    }

    /// Pointer released. Finishes a transition when released over a state.
    pub fn end(&mut self, graph: &mut GraphModel, device: Point) -> Outcome {
        let mut selection = None;

        if let Gesture::CreatingTransition { from, .. } = self.gesture {
            let pos = self.viewport.local_pos(device);
            if let Some(to) = graph.check(pos) {
                let index = graph.connect(from, to);
                debug!("Created transition {} from {} to {}", index, from, to);
                selection = Some(Selection::Created(index));
            }
        }

        self.gesture = Gesture::Idle;
        self.outcome(graph, selection)
    }

    /// Pointer left the surface. Any gesture is abandoned.
    pub fn leave(&mut self, graph: &GraphModel) -> Outcome {
        self.gesture = Gesture::Idle;
        self.outcome(graph, None)
    }

    /// Zooms by `factor` around the device position.
    pub fn zoom(&mut self, graph: &GraphModel, factor: f64, device: Point) -> Outcome {
        self.viewport.zoom_at(factor, device);
        self.outcome(graph, None)
    }

    pub fn resize(&mut self, graph: &GraphModel, width: f64, height: f64) -> Outcome {
        self.viewport.resize(width, height);
        self.outcome(graph, None)
    }

    /// Back to zoom 1 at the origin.
    pub fn reset_view(&mut self, graph: &GraphModel) -> Outcome {
        self.viewport.reset();
        self.outcome(graph, None)
    }

    pub fn redraw(&mut self, graph: &GraphModel) -> Outcome {
        self.outcome(graph, None)
    }

    fn outcome(&mut self, graph: &GraphModel, selection: Option<Selection>) -> Outcome {
        let preview = match self.gesture {
            Gesture::CreatingTransition {
                origin, current, ..
            } => Some((origin, current)),
            _ => None,
        };

        Outcome {
            scene: render(graph, &self.viewport, &mut self.bounds, preview),
            selection,
        }
    }
}
