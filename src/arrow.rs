//! Edge layout: groups parallel transitions and self-loops, assigns each edge a curve slot,
//! and builds the shape, arrowhead and label of every edge.
//!
//! The same layout is used for drawing and for hit-testing clicks, so an edge is always
//! selectable exactly where it is drawn.

use crate::geometry::{project_on_segment, quad_distance_sq, quad_tangent, Point};
use crate::graph::GraphModel;
use crate::types::{StateId, Transition, EDGE_HIT_THRESHOLD, STATE_RADIUS};
use std::collections::HashMap;
use std::f64::consts::PI;

/// Radius of a self-loop.
pub const LOOP_RADIUS: f64 = 0.9 * STATE_RADIUS;
/// Angle between neighbouring self-loops on the same state.
///
/// Loops this close overlap in their hit bands, and a click on the shared part selects the
/// loop that comes first in transition order.
pub const LOOP_SPREAD: f64 = PI / 8.0;
/// Base perpendicular displacement of a curved edge per unit of offset.
pub const CURVE_SPACING: f64 = 40.0;
/// Extra displacement per curve beyond the second one in a group.
pub const CURVE_SPACING_STEP: f64 = 12.0;
/// Curve parameter where the arrowhead direction is measured.
pub const ARROW_TANGENT_T: f64 = 0.95;
/// Length of an arrowhead.
pub const ARROW_SIZE: f64 = 10.0;
const ARROW_WIDTH: f64 = 0.4;
const LABEL_GAP: f64 = 12.0;

/// Position of an edge inside its parallel group.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CurveSlot {
    /// Signed offset. `0` is a straight edge (or the centre loop).
    pub offset: f64,
    /// Number of edges in the group.
    pub total: usize,
    /// The edge runs against the direction of the first edge of its group.
    pub reversed: bool,
}

impl CurveSlot {
    pub const STRAIGHT: CurveSlot = CurveSlot {
        offset: 0.0,
        total: 1,
        reversed: false,
    };

    /// Perpendicular displacement of the curve midpoint.
    pub fn displacement(&self) -> f64 {
        let extra = self.total.max(2) - 2;
        self.offset * (CURVE_SPACING + CURVE_SPACING_STEP * extra as f64)
    }
}

/// Drawable shape of an edge, in model space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EdgeShape {
    /// A straight connector between the two state surfaces.
    Line { start: Point, end: Point },
    /// A quadratic curve. It passes through the displaced midpoint at `t = 0.5`.
    Curve {
        start: Point,
        control: Point,
        end: Point,
    },
    /// A self-loop: the part of a circle outside the state it is attached to.
    /// Angles are in radians and `start_angle < end_angle`.
    Loop {
        anchor: Point,
        center: Point,
        radius: f64,
        start_angle: f64,
        end_angle: f64,
    },
}

impl EdgeShape {
    /// Whether `pos` is within `EDGE_HIT_THRESHOLD` of the shape.
    pub fn hit(&self, pos: Point) -> bool {
        let threshold_sq = EDGE_HIT_THRESHOLD * EDGE_HIT_THRESHOLD;

        match *self {
            EdgeShape::Line { start, end } => {
                let (d2, t) = project_on_segment(pos, start, end);
                (0.0..=1.0).contains(&t) && d2 < threshold_sq
            }
            EdgeShape::Curve {
                start,
                control,
                end,
            } => quad_distance_sq(pos, start, control, end) < threshold_sq,
            EdgeShape::Loop {
                anchor,
                center,
                radius,
                ..
            } => {
                (pos.distance(center) - radius).abs() < EDGE_HIT_THRESHOLD
                    && pos.distance(anchor) >= STATE_RADIUS
            }
        }
    }

    /// Where the edge ends, which is where the arrowhead tip goes.
    pub fn end(&self) -> Point {
        match *self {
            EdgeShape::Line { end, .. } | EdgeShape::Curve { end, .. } => end,
            EdgeShape::Loop {
                center,
                radius,
                end_angle,
                ..
            } => center + Point::from_angle(end_angle) * radius,
        }
    }

    /// Direction of travel at the arrowhead.
    fn arrow_direction(&self) -> Point {
        match *self {
            EdgeShape::Line { start, end } => end - start,
            EdgeShape::Curve {
                start,
                control,
                end,
            } => quad_tangent(ARROW_TANGENT_T, start, control, end),
            EdgeShape::Loop { end_angle, .. } => Point::new(-end_angle.sin(), end_angle.cos()),
        }
    }
}

/// Triangle at the end of an edge.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Arrowhead {
    pub tip: Point,
    pub left: Point,
    pub right: Point,
}

/// A fully laid-out edge.
#[derive(Debug, Clone, PartialEq)]
pub struct Arrow {
    pub transition: Transition,
    pub slot: CurveSlot,
    pub shape: EdgeShape,
    pub head: Arrowhead,
    pub label: String,
    pub label_pos: Point,
}

impl Arrow {
    pub fn hit(&self, pos: Point) -> bool {
        self.shape.hit(pos)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum GroupKey {
    Loop(StateId),
    Pair(StateId, StateId),
}

#[derive(Default)]
struct Group {
    origin: Option<StateId>,
    forward: Vec<usize>,
    backward: Vec<usize>,
}

/// Assigns a curve slot to every transition, index-aligned with `transitions`.
///
/// A group running in one direction only is spread symmetrically around the straight
/// baseline. A bidirectional group gives `+1, +2, …` to the edges running like the first
/// edge of the group and `-1, -2, …` to the others, so the two directions never overlap.
pub fn curve_slots(transitions: &[Transition]) -> Vec<CurveSlot> {
    let mut groups: HashMap<GroupKey, Group> = HashMap::new();

    for (index, transition) in transitions.iter().enumerate() {
        let key = if transition.is_self_loop() {
            GroupKey::Loop(transition.from)
        } else {
            GroupKey::Pair(
                transition.from.min(transition.to),
                transition.from.max(transition.to),
            )
        };

        let group = groups.entry(key).or_default();
        let origin = *group.origin.get_or_insert(transition.from);
        if origin == transition.from {
            group.forward.push(index);
        } else {
            group.backward.push(index);
        }
    }

    let mut slots = vec![CurveSlot::STRAIGHT; transitions.len()];

    for group in groups.values() {
        let total = group.forward.len() + group.backward.len();

        if group.backward.is_empty() {
            let center = (group.forward.len() as f64 - 1.0) / 2.0;
            for (k, &index) in group.forward.iter().enumerate() {
                slots[index] = CurveSlot {
                    offset: k as f64 - center,
                    total,
                    reversed: false,
                };
            }
        } else {
            for (k, &index) in group.forward.iter().enumerate() {
                slots[index] = CurveSlot {
                    offset: (k + 1) as f64,
                    total,
                    reversed: false,
                };
            }
            for (k, &index) in group.backward.iter().enumerate() {
                slots[index] = CurveSlot {
                    offset: -((k + 1) as f64),
                    total,
                    reversed: true,
                };
            }
        }
    }

    slots
}

/// Builds the drawable edge of `transition` in `graph`.
///
/// Returns `None` when an endpoint is not a state of the graph or when the two states sit
/// on the same point, since no direction can be derived.
pub fn to_arrow(transition: &Transition, graph: &GraphModel, slot: CurveSlot) -> Option<Arrow> {
    let from = graph.state_pos(transition.from)?;
    let to = graph.state_pos(transition.to)?;

    let (shape, label_pos) = if transition.is_self_loop() {
        loop_shape(from, slot)
    } else {
        pair_shape(from, to, slot)?
    };

    Some(Arrow {
        transition: *transition,
        slot,
        head: arrowhead(&shape),
        shape,
        label: transition.label(),
        label_pos,
    })
}

/// Lays out every edge of the graph in transition order, paired with its transition index.
pub fn layout_edges(graph: &GraphModel) -> Vec<(usize, Arrow)> {
    let transitions = graph.transitions();

    curve_slots(transitions)
        .into_iter()
        .zip(transitions)
        .enumerate()
        .filter_map(|(index, (slot, transition))| {
            to_arrow(transition, graph, slot).map(|arrow| (index, arrow))
        })
        .collect()
}

fn loop_shape(anchor: Point, slot: CurveSlot) -> (EdgeShape, Point) {
    let angle = -PI / 2.0 + slot.offset * LOOP_SPREAD;
    let outward = Point::from_angle(angle);
    let center = anchor + outward * STATE_RADIUS;

    // Half-angle, seen from the loop centre, between the state centre and the points where
    // the loop meets the state circle.
    let d = STATE_RADIUS;
    let cos_half = (d * d + LOOP_RADIUS * LOOP_RADIUS - STATE_RADIUS * STATE_RADIUS)
        / (2.0 * d * LOOP_RADIUS);
    let half = cos_half.clamp(-1.0, 1.0).acos();
    let inward = angle + PI;

    let shape = EdgeShape::Loop {
        anchor,
        center,
        radius: LOOP_RADIUS,
        start_angle: inward + half,
        end_angle: inward + 2.0 * PI - half,
    };
    let label_pos = center + outward * (LOOP_RADIUS + LABEL_GAP);

    (shape, label_pos)
}

fn pair_shape(from: Point, to: Point, slot: CurveSlot) -> Option<(EdgeShape, Point)> {
    let unit = (to - from).normalized()?;
    let start = from + unit * STATE_RADIUS;
    let end = to - unit * STATE_RADIUS;
    let mid = start.midpoint(end);

    // Perpendicular of the group's reference direction, shared by both directions.
    let normal = if slot.reversed {
        unit.perpendicular() * -1.0
    } else {
        unit.perpendicular()
    };

    if slot.offset == 0.0 {
        let shape = EdgeShape::Line { start, end };
        return Some((shape, mid + normal * LABEL_GAP));
    }

    let apex = mid + normal * slot.displacement();
    let control = apex * 2.0 - mid;
    let side = slot.offset.signum();

    let shape = EdgeShape::Curve {
        start,
        control,
        end,
    };
    Some((shape, apex + normal * (side * LABEL_GAP)))
}

fn arrowhead(shape: &EdgeShape) -> Arrowhead {
    let tip = shape.end();
    let dir = shape
        .arrow_direction()
        .normalized()
        .unwrap_or(Point::new(1.0, 0.0));
    let back = tip - dir * ARROW_SIZE;
    let side = dir.perpendicular() * (ARROW_SIZE * ARROW_WIDTH);

    Arrowhead {
        tip,
        left: back + side,
        right: back - side,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;
    use crate::types::{Direction, Symbol};

    const EPS: f64 = 1e-9;

    fn graph_with(positions: &[(f64, f64)], text: &str) -> GraphModel {
        let mut graph = GraphModel::new();
        for &(x, y) in positions {
            graph.add_state(Point::new(x, y));
        }
        for transition in parse(text).unwrap() {
            graph.add_transition(
                transition.from,
                transition.to,
                transition.read,
                transition.write,
                transition.direction,
            );
        }
        graph
    }

    #[test]
    fn test_parallel_offsets_are_symmetric_and_distinct() {
        for n in 1..=6 {
            let transitions = vec![Transition::link(0, 1); n];
            let slots = curve_slots(&transitions);
            let mut offsets: Vec<f64> = slots.iter().map(|slot| slot.offset).collect();

            let sum: f64 = offsets.iter().sum();
            assert!(sum.abs() < EPS, "offsets of {} edges not centred", n);

            offsets.sort_by(|a, b| a.partial_cmp(b).unwrap());
            for pair in offsets.windows(2) {
                assert!(pair[1] - pair[0] > EPS, "duplicate offset for {} edges", n);
            }
            for offset in &offsets {
                assert!(offsets.iter().any(|o| (o + offset).abs() < EPS));
            }
            assert!(slots.iter().all(|slot| slot.total == n));
        }
    }

    #[test]
    fn test_bidirectional_offsets_are_mirrored() {
        let transitions = vec![
            Transition::link(0, 1),
            Transition::link(1, 0),
            Transition::link(0, 1),
            Transition::link(1, 0),
        ];
        let slots = curve_slots(&transitions);
        let offsets: Vec<f64> = slots.iter().map(|slot| slot.offset).collect();

        assert_eq!(offsets, vec![1.0, -1.0, 2.0, -2.0]);
        assert!(!slots[0].reversed && slots[1].reversed);
        assert!(slots.iter().all(|slot| slot.total == 4));
    }

    #[test]
    fn test_self_loops_are_grouped_per_state() {
        let transitions = vec![
            Transition::link(0, 0),
            Transition::link(1, 1),
            Transition::link(0, 0),
            Transition::link(0, 1),
        ];
        let slots = curve_slots(&transitions);

        assert_eq!(slots[0].offset, -0.5);
        assert_eq!(slots[2].offset, 0.5);
        assert_eq!(slots[1].offset, 0.0);
        assert_eq!(slots[3], CurveSlot::STRAIGHT);
    }

    #[test]
    fn test_single_edge_is_straight_between_surfaces() {
        let graph = graph_with(&[(0.0, 0.0), (200.0, 0.0)], "0->1:0,1/R;");
        let edges = layout_edges(&graph);

        assert_eq!(edges.len(), 1);
        let (index, arrow) = &edges[0];
        assert_eq!(*index, 0);
        assert_eq!(
            arrow.shape,
            EdgeShape::Line {
                start: Point::new(STATE_RADIUS, 0.0),
                end: Point::new(200.0 - STATE_RADIUS, 0.0),
            }
        );
        assert_eq!(arrow.label, "0,1/R");
        assert_eq!(arrow.head.tip, Point::new(160.0, 0.0));
        assert!(arrow.head.left.x < 160.0 && arrow.head.right.x < 160.0);
    }

    #[test]
    fn test_straight_edge_hit_testing() {
        let graph = graph_with(&[(0.0, 0.0), (200.0, 0.0)], "0->1:0,1/R;");
        let (_, arrow) = &layout_edges(&graph)[0];

        assert!(arrow.hit(Point::new(100.0, 5.0)));
        assert!(arrow.hit(Point::new(100.0, -7.9)));
        assert!(!arrow.hit(Point::new(100.0, 8.0)));
        // Beyond the end of the segment, even on the line.
        assert!(!arrow.hit(Point::new(170.0, 0.0)));
        assert!(!arrow.hit(Point::new(30.0, 0.0)));
    }

    #[test]
    fn test_curved_edges_pass_through_displaced_midpoint() {
        let graph = graph_with(&[(0.0, 0.0), (200.0, 0.0)], "0->1:0,1/R;0->1:1,1/L;");
        let edges = layout_edges(&graph);

        // Two curves: offsets -0.5 and +0.5, spacing 40.
        for (_, arrow) in &edges {
            let EdgeShape::Curve {
                start,
                control,
                end,
            } = arrow.shape
            else {
                panic!("expected a curve");
            };
            let apex = crate::geometry::quad_point(0.5, start, control, end);
            assert!((apex.x - 100.0).abs() < EPS);
            assert!((apex.y.abs() - 20.0).abs() < EPS);
            assert!(arrow.hit(apex));
            assert!(!arrow.hit(Point::new(100.0, 0.0)));
        }

        let (_, first) = &edges[0];
        let (_, second) = &edges[1];
        assert!(!first.hit(first.label_pos));
        assert_ne!(first.shape, second.shape);
    }

    #[test]
    fn test_bidirectional_curves_bend_to_opposite_sides() {
        let graph = graph_with(&[(0.0, 0.0), (200.0, 0.0)], "0->1:0,1/R;1->0:1,0/L;");
        let edges = layout_edges(&graph);

        let apex_y = |arrow: &Arrow| match arrow.shape {
            EdgeShape::Curve {
                start,
                control,
                end,
            } => crate::geometry::quad_point(0.5, start, control, end).y,
            _ => panic!("expected a curve"),
        };

        let forward = apex_y(&edges[0].1);
        let backward = apex_y(&edges[1].1);
        assert!((forward + backward).abs() < EPS);
        assert!((forward.abs() - CURVE_SPACING).abs() < EPS);
    }

    #[test]
    fn test_curve_arrow_follows_tangent() {
        let graph = graph_with(&[(0.0, 0.0), (200.0, 0.0)], "0->1:0,1/R;1->0:1,0/L;");
        let (_, arrow) = &layout_edges(&graph)[0];

        // The chord is horizontal, the curve arrives at an angle.
        let along = arrow.head.tip - arrow.head.left.midpoint(arrow.head.right);
        assert!(along.y.abs() > EPS);
    }

    #[test]
    fn test_self_loop_sits_above_the_state() {
        let graph = graph_with(&[(100.0, 100.0)], "0->0:0,0/H;");
        let (_, arrow) = &layout_edges(&graph)[0];

        let EdgeShape::Loop {
            center,
            radius,
            start_angle,
            end_angle,
            ..
        } = arrow.shape
        else {
            panic!("expected a loop");
        };
        assert!((center.x - 100.0).abs() < EPS);
        assert!((center.y - (100.0 - STATE_RADIUS)).abs() < EPS);
        assert_eq!(radius, LOOP_RADIUS);
        assert!(start_angle < end_angle);

        // Both arc ends lie on the state circle.
        for angle in [start_angle, end_angle] {
            let p = center + Point::from_angle(angle) * radius;
            assert!((p.distance(Point::new(100.0, 100.0)) - STATE_RADIUS).abs() < 1e-6);
        }

        // Top of the loop is hit, the inside of the state is not.
        assert!(arrow.hit(Point::new(100.0, 100.0 - STATE_RADIUS - LOOP_RADIUS)));
        assert!(!arrow.hit(Point::new(100.0, 100.0 - STATE_RADIUS + LOOP_RADIUS)));
        assert!(!arrow.hit(Point::new(100.0, 100.0 - STATE_RADIUS)));
    }

    #[test]
    fn test_self_loops_fan_out() {
        let graph = graph_with(&[(0.0, 0.0)], "0->0:0,0/H;0->0:1,1/R;");
        let edges = layout_edges(&graph);

        let centers: Vec<Point> = edges
            .iter()
            .map(|(_, arrow)| match arrow.shape {
                EdgeShape::Loop { center, .. } => center,
                _ => panic!("expected a loop"),
            })
            .collect();

        assert!((centers[0].x + centers[1].x).abs() < EPS);
        assert!(centers[0].x < 0.0);
        let expected = (-PI / 2.0 - LOOP_SPREAD / 2.0).sin() * STATE_RADIUS;
        assert!((centers[0].y - expected).abs() < EPS);
    }

    #[test]
    fn test_unknown_or_coincident_states_are_skipped() {
        let mut graph = graph_with(&[(0.0, 0.0), (0.0, 0.0)], "0->1:0,1/R;");
        graph.add_transition(0, 9, Symbol::One, Symbol::One, Direction::Left);

        assert!(layout_edges(&graph).is_empty());
    }

    #[test]
    fn test_spacing_grows_with_group_size() {
        let two = CurveSlot {
            offset: 1.0,
            total: 2,
            reversed: false,
        };
        let four = CurveSlot { total: 4, ..two };

        assert_eq!(two.displacement(), 40.0);
        assert_eq!(four.displacement(), 64.0);
        assert_eq!(CurveSlot::STRAIGHT.displacement(), 0.0);
    }
}
