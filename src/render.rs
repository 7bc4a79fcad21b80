//! Rendering produces a `Scene`: an ordered list of drawing commands in model coordinates,
//! plus the transform a backend applies to map them onto its surface. Backends (the SVG
//! writer, the terminal canvas) only replay commands.

use crate::arrow::{layout_edges, Arrow};
use crate::geometry::{Point, Rect};
use crate::graph::GraphModel;
use crate::types::{StateId, GRID_UNIT, STATE_RADIUS};
use crate::viewport::{RenderBounds, Viewport};

/// The device transform of a scene: `device = (model + (tx, ty)) * zoom`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub zoom: f64,
    pub tx: f64,
    pub ty: f64,
}

impl Transform {
    pub fn apply(&self, model: Point) -> Point {
        Point::new((model.x + self.tx) * self.zoom, (model.y + self.ty) * self.zoom)
    }
}

impl From<&Viewport> for Transform {
    fn from(viewport: &Viewport) -> Self {
        let (tx, ty) = viewport.translation();
        Self {
            zoom: viewport.zoom(),
            tx,
            ty,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    /// Erase a region.
    Clear(Rect),
    /// One line of the background grid.
    GridLine { from: Point, to: Point },
    /// A state circle labelled with its id.
    State {
        id: StateId,
        center: Point,
        radius: f64,
    },
    /// A transition edge with its arrowhead and label. `index` is the transition index.
    Edge { index: usize, arrow: Arrow },
    /// The line followed by the pointer while a transition is being created.
    Preview { from: Point, to: Point },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Scene {
    pub transform: Transform,
    /// Region covered by the scene, the cleared rectangle.
    pub extent: Rect,
    pub commands: Vec<DrawCommand>,
}

impl Scene {
    pub fn states(&self) -> impl Iterator<Item = (StateId, Point)> + '_ {
        self.commands.iter().filter_map(|command| match command {
            DrawCommand::State { id, center, .. } => Some((*id, *center)),
            _ => None,
        })
    }

    pub fn edges(&self) -> impl Iterator<Item = &Arrow> {
        self.commands.iter().filter_map(|command| match command {
            DrawCommand::Edge { arrow, .. } => Some(arrow),
            _ => None,
        })
    }
}

/// Renders the graph as seen through `viewport`.
///
/// `bounds` is grown by the visible rectangle first. The scene then clears the accumulated
/// bounds, draws the grid over them, the states in iteration order, the edges in transition
/// order and finally the creation preview. The graph is never modified.
pub fn render(
    graph: &GraphModel,
    viewport: &Viewport,
    bounds: &mut RenderBounds,
    preview: Option<(Point, Point)>,
) -> Scene {
    *bounds = bounds.grow(viewport.viewport_rect());
    let extent = bounds.clear_rect();

    let mut commands = vec![DrawCommand::Clear(extent)];
    commands.extend(grid(bounds.rect()));

    commands.extend(graph.states().map(|state| DrawCommand::State {
        id: state.id,
        center: state.position,
        radius: STATE_RADIUS,
    }));

    commands.extend(
        layout_edges(graph)
            .into_iter()
            .map(|(index, arrow)| DrawCommand::Edge { index, arrow }),
    );

    if let Some((from, to)) = preview {
        commands.push(DrawCommand::Preview { from, to });
    }

    Scene {
        transform: Transform::from(viewport),
        extent,
        commands,
    }
}

/// Horizontal then vertical lines on every grid multiple covering `rect`.
fn grid(rect: Rect) -> Vec<DrawCommand> {
    let x_start = (rect.x / GRID_UNIT).floor() as i64;
    let x_end = (rect.xx / GRID_UNIT).ceil() as i64;
    let y_start = (rect.y / GRID_UNIT).floor() as i64;
    let y_end = (rect.yy / GRID_UNIT).ceil() as i64;

    let (left, right) = (x_start as f64 * GRID_UNIT, x_end as f64 * GRID_UNIT);
    let (top, bottom) = (y_start as f64 * GRID_UNIT, y_end as f64 * GRID_UNIT);

    let horizontal = (y_start..=y_end).map(|i| {
        let y = i as f64 * GRID_UNIT;
        DrawCommand::GridLine {
            from: Point::new(left, y),
            to: Point::new(right, y),
        }
    });
    let vertical = (x_start..=x_end).map(|i| {
        let x = i as f64 * GRID_UNIT;
        DrawCommand::GridLine {
            from: Point::new(x, top),
            to: Point::new(x, bottom),
        }
    });

    horizontal.chain(vertical).collect()
}
