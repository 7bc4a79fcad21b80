//! This module defines `GraphModel`, the owner of the states and transitions being edited.
//! It handles state placement, hit-testing of states and edges, and the conversion to and
//! from the transition notation.

use crate::arrow::layout_edges;
use crate::encoder::encode;
use crate::geometry::{Point, Rect};
use crate::parser::parse_algorithm;
use crate::transition_map::TransitionMap;
use crate::types::{
    Direction, GraphError, StateId, Symbol, Transition, MAX_PLACEMENT_ATTEMPTS, STATE_RADIUS,
};
use indexmap::IndexMap;
use log::{debug, warn};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Number of uniform draws averaged per coordinate when placing a state.
const PLACEMENT_SMOOTHING: usize = 3;

/// A node of the transition graph.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct State {
    pub id: StateId,
    pub position: Point,
}

impl State {
    pub fn new(id: StateId, position: Point) -> Self {
        Self { id, position }
    }

    /// Whether `pos` lies strictly inside the state's circle.
    pub fn contains(&self, pos: Point) -> bool {
        self.position.distance_sq(pos) < STATE_RADIUS * STATE_RADIUS
    }

    fn translate(&mut self, dx: f64, dy: f64) {
        self.position.x += dx;
        self.position.y += dy;
    }
}

/// The outcome of loading program text into a graph.
#[derive(Debug, Clone)]
pub struct LoadReport {
    pub graph: GraphModel,
    /// Statements that did not parse, in statement order. They were left out of the graph.
    pub skipped: Vec<GraphError>,
}

/// The transition graph: states in insertion order plus the ordered transitions.
///
/// Transition indices are stable identities for selection. States are never removed one by
/// one; `reset` clears the whole graph.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphModel {
    states: IndexMap<StateId, State>,
    transitions: Vec<Transition>,
}

impl GraphModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a graph from program text, placing states at random inside
    /// `[0, 0] × [width, height]`.
    ///
    /// States are created in the order they are first referenced while scanning the
    /// transitions (`from` before `to`), which determines their initial layout.
    /// Malformed statements are skipped and reported in the `LoadReport`.
    pub fn load_algorithm(input: &str, width: f64, height: f64) -> LoadReport {
        Self::load_algorithm_with(input, width, height, &mut rand::thread_rng())
    }

    /// Same as `load_algorithm` with an explicit random source.
    pub fn load_algorithm_with<R: Rng + ?Sized>(
        input: &str,
        width: f64,
        height: f64,
        rng: &mut R,
    ) -> LoadReport {
        let area = Rect::new(0.0, 0.0, width, height);
        let mut graph = GraphModel::new();
        let mut skipped = Vec::new();

        for entry in parse_algorithm(input) {
            let transition = match entry {
                Ok(transition) => transition,
                Err(e) => {
                    warn!("Skipping statement: {}", e);
                    skipped.push(e);
                    continue;
                }
            };

            for id in [transition.from, transition.to] {
                if !graph.states.contains_key(&id) {
                    let pos = graph.determine_pos_with(area, rng);
                    graph.states.insert(id, State::new(id, pos));
                }
            }
            graph.transitions.push(transition);
        }

        debug!(
            "Loaded {} states and {} transitions ({} skipped)",
            graph.states.len(),
            graph.transitions.len(),
            skipped.len()
        );

        LoadReport { graph, skipped }
    }

    /// Encodes the transitions in the transition notation.
    pub fn export_graph(&self) -> String {
        encode(&self.transitions)
    }

    /// The deterministic `From -> Read` view of the transitions, last rule wins.
    pub fn transition_map(&self) -> TransitionMap {
        TransitionMap::from_transitions(&self.transitions)
    }

    /// Adds a state with the next free integer id and returns that id.
    ///
    /// The id is the number of existing states, or the first free id above it when an
    /// explicitly keyed state already took it.
    pub fn add_state(&mut self, pos: Point) -> StateId {
        let mut id = self.states.len() as StateId;
        while self.states.contains_key(&id) {
            id += 1;
        }

        self.states.insert(id, State::new(id, pos));
        id
    }

    /// Adds a state under an explicit key.
    ///
    /// # Returns
    ///
    /// * `Ok(id)` if the state was added.
    /// * `Err(GraphError::DuplicateState)` if the key is taken. The existing state is kept.
    pub fn insert_state(&mut self, id: StateId, pos: Point) -> Result<StateId, GraphError> {
        if self.states.contains_key(&id) {
            return Err(GraphError::DuplicateState(id));
        }

        self.states.insert(id, State::new(id, pos));
        Ok(id)
    }

    /// Moves an existing state to an absolute position.
    pub fn move_state_to(&mut self, id: StateId, pos: Point) -> Result<(), GraphError> {
        let state = self
            .states
            .get_mut(&id)
            .ok_or(GraphError::UnknownStateId(id))?;
        state.position = pos;
        Ok(())
    }

    /// Translates a state by a delta. An unknown id changes nothing.
    pub fn update_state(&mut self, id: StateId, dx: f64, dy: f64) -> Result<(), GraphError> {
        let state = self
            .states
            .get_mut(&id)
            .ok_or(GraphError::UnknownStateId(id))?;
        state.translate(dx, dy);
        Ok(())
    }

    /// Appends a transition and returns its index.
    ///
    /// The endpoints are not validated, so transitions can be linked before their states
    /// are added.
    pub fn add_transition(
        &mut self,
        from: StateId,
        to: StateId,
        read: Symbol,
        write: Symbol,
        direction: Direction,
    ) -> usize {
        self.transitions
            .push(Transition::new(from, to, read, write, direction));
        self.transitions.len() - 1
    }

    /// Appends a `0,0/H` transition, as created by dragging from one state to another.
    pub fn connect(&mut self, from: StateId, to: StateId) -> usize {
        self.transitions.push(Transition::link(from, to));
        self.transitions.len() - 1
    }

    /// Rewrites the symbols and movement of an existing transition.
    pub fn update_transition(
        &mut self,
        index: usize,
        read: Symbol,
        write: Symbol,
        direction: Direction,
    ) -> Result<(), GraphError> {
        let transition = self
            .transitions
            .get_mut(index)
            .ok_or(GraphError::UnknownTransition(index))?;

        transition.read = read;
        transition.write = write;
        transition.direction = direction;
        Ok(())
    }

    /// Removes every state and transition.
    pub fn reset(&mut self) {
        self.states.clear();
        self.transitions.clear();
    }

    /// Returns the first state, in iteration order, whose circle strictly contains `pos`.
    pub fn check(&self, pos: Point) -> Option<StateId> {
        self.states
            .values()
            .find(|state| state.contains(pos))
            .map(|state| state.id)
    }

    /// Returns the index of the first transition whose drawn edge is hit by `pos`.
    pub fn check_vertexes_click(&self, pos: Point) -> Option<usize> {
        layout_edges(self)
            .into_iter()
            .find(|(_, arrow)| arrow.hit(pos))
            .map(|(index, _)| index)
    }

    /// Picks a random free position inside `rect` for a new state.
    pub fn determine_pos(&self, rect: Rect) -> Point {
        self.determine_pos_with(rect, &mut rand::thread_rng())
    }

    /// Picks a free position inside `rect` using `rng`.
    ///
    /// Each coordinate is the mean of a few uniform draws, which favours the middle of the
    /// rectangle. Positions that fall inside an existing state are rejected. After
    /// `MAX_PLACEMENT_ATTEMPTS` rejections the last sample is returned as is.
    pub fn determine_pos_with<R: Rng + ?Sized>(&self, rect: Rect, rng: &mut R) -> Point {
        let mut pos = smoothed_sample(rect, rng);

        for _ in 1..MAX_PLACEMENT_ATTEMPTS {
            if self.check(pos).is_none() {
                return pos;
            }
            pos = smoothed_sample(rect, rng);
        }

        if self.check(pos).is_some() {
            warn!(
                "No free position found after {} attempts, placing state over an existing one",
                MAX_PLACEMENT_ATTEMPTS
            );
        }
        pos
    }

    pub fn states(&self) -> impl Iterator<Item = &State> {
        self.states.values()
    }

    pub fn state(&self, id: StateId) -> Option<&State> {
        self.states.get(&id)
    }

    pub fn state_pos(&self, id: StateId) -> Option<Point> {
        self.states.get(&id).map(|state| state.position)
    }

    pub fn state_count(&self) -> usize {
        self.states.len()
    }

    pub fn transitions(&self) -> &[Transition] {
        &self.transitions
    }

    pub fn transition(&self, index: usize) -> Option<&Transition> {
        self.transitions.get(index)
    }

    pub fn transition_count(&self) -> usize {
        self.transitions.len()
    }
}

fn smoothed_sample<R: Rng + ?Sized>(rect: Rect, rng: &mut R) -> Point {
    let mut coordinate = |lo: f64, hi: f64| {
        let sum: f64 = (0..PLACEMENT_SMOOTHING).map(|_| rng.gen::<f64>()).sum();
        lo + (hi - lo) * sum / PLACEMENT_SMOOTHING as f64
    };

    let x = coordinate(rect.x, rect.xx);
    let y = coordinate(rect.y, rect.yy);
    Point::new(x, y)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    const EXAMPLE: &str = "0->1:0,1/R;1->0:1,0/L;1->1:0,0/H;";

    fn rng() -> StdRng {
        StdRng::seed_from_u64(7)
    }

    #[test]
    fn test_add_state_assigns_sequential_ids() {
        let mut graph = GraphModel::new();

        assert_eq!(graph.add_state(Point::new(0.0, 0.0)), 0);
        assert_eq!(graph.add_state(Point::new(100.0, 0.0)), 1);
        assert_eq!(graph.add_state(Point::new(200.0, 0.0)), 2);
        assert_eq!(graph.state_count(), 3);
        assert_eq!(graph.state_pos(1), Some(Point::new(100.0, 0.0)));
    }

    #[test]
    fn test_add_state_skips_explicit_keys() {
        let mut graph = GraphModel::new();
        graph.insert_state(1, Point::new(0.0, 0.0)).unwrap();

        // `count` is 1, which is taken.
        assert_eq!(graph.add_state(Point::new(100.0, 0.0)), 2);
        assert_eq!(graph.add_state(Point::new(200.0, 0.0)), 3);
    }

    #[test]
    fn test_insert_duplicate_state_is_rejected() {
        let mut graph = GraphModel::new();
        graph.insert_state(4, Point::new(10.0, 10.0)).unwrap();

        let result = graph.insert_state(4, Point::new(500.0, 500.0));
        assert_eq!(result, Err(GraphError::DuplicateState(4)));
        assert_eq!(graph.state_pos(4), Some(Point::new(10.0, 10.0)));
    }

    #[test]
    fn test_move_state_to() {
        let mut graph = GraphModel::new();
        let id = graph.add_state(Point::new(10.0, 10.0));

        graph.move_state_to(id, Point::new(-5.0, 3.0)).unwrap();
        assert_eq!(graph.state_pos(id), Some(Point::new(-5.0, 3.0)));
        assert_eq!(
            graph.move_state_to(42, Point::new(0.0, 0.0)),
            Err(GraphError::UnknownStateId(42))
        );
    }

    #[test]
    fn test_update_state_accumulates_deltas() {
        let mut graph = GraphModel::new();
        let id = graph.add_state(Point::new(10.0, 20.0));
        let deltas = [(1.5, -2.0), (0.1, 0.2), (-30.0, 45.5), (0.3, 0.3)];

        for (dx, dy) in deltas {
            graph.update_state(id, dx, dy).unwrap();
        }

        let pos = graph.state_pos(id).unwrap();
        let (sx, sy) = deltas
            .iter()
            .fold((0.0, 0.0), |(ax, ay), (dx, dy)| (ax + dx, ay + dy));
        assert!((pos.x - (10.0 + sx)).abs() < 1e-9);
        assert!((pos.y - (20.0 + sy)).abs() < 1e-9);
    }

    #[test]
    fn test_update_unknown_state_is_a_reported_no_op() {
        let mut graph = GraphModel::new();
        graph.add_state(Point::new(10.0, 20.0));
        let before = graph.clone();

        assert_eq!(
            graph.update_state(3, 1.0, 1.0),
            Err(GraphError::UnknownStateId(3))
        );
        assert_eq!(graph, before);
    }

    #[test]
    fn test_check_hits_inside_radius_only() {
        let mut graph = GraphModel::new();
        let id = graph.add_state(Point::new(100.0, 100.0));

        assert_eq!(graph.check(Point::new(100.0, 100.0)), Some(id));
        assert_eq!(graph.check(Point::new(139.0, 100.0)), Some(id));
        // On the boundary
        assert_eq!(graph.check(Point::new(140.0, 100.0)), None);
        assert_eq!(graph.check(Point::new(141.0, 100.0)), None);
    }

    #[test]
    fn test_check_prefers_first_state() {
        let mut graph = GraphModel::new();
        graph.add_state(Point::new(100.0, 100.0));
        graph.add_state(Point::new(120.0, 100.0));

        assert_eq!(graph.check(Point::new(110.0, 100.0)), Some(0));
        assert_eq!(graph.check(Point::new(150.0, 100.0)), Some(1));
    }

    #[test]
    fn test_add_transition_does_not_validate() {
        let mut graph = GraphModel::new();

        let index = graph.add_transition(3, 8, Symbol::One, Symbol::Zero, Direction::Left);
        assert_eq!(index, 0);
        assert_eq!(graph.connect(8, 3), 1);
        assert_eq!(graph.transition(1), Some(&Transition::link(8, 3)));
        assert_eq!(graph.state_count(), 0);
    }

    #[test]
    fn test_update_transition() {
        let mut graph = GraphModel::new();
        let index = graph.connect(0, 1);

        graph
            .update_transition(index, Symbol::One, Symbol::Zero, Direction::Right)
            .unwrap();
        assert_eq!(graph.export_graph(), "0->1:1,0/R;");
        assert_eq!(
            graph.update_transition(5, Symbol::One, Symbol::One, Direction::Left),
            Err(GraphError::UnknownTransition(5))
        );
    }

    #[test]
    fn test_check_vertexes_click() {
        let mut graph = GraphModel::new();
        graph.add_state(Point::new(0.0, 0.0));
        graph.add_state(Point::new(200.0, 0.0));
        graph.add_state(Point::new(0.0, 200.0));
        graph.connect(0, 1);
        graph.connect(0, 2);

        assert_eq!(graph.check_vertexes_click(Point::new(100.0, 3.0)), Some(0));
        assert_eq!(graph.check_vertexes_click(Point::new(-3.0, 100.0)), Some(1));
        assert_eq!(graph.check_vertexes_click(Point::new(100.0, 100.0)), None);
    }

    #[test]
    fn test_overlapping_loops_resolve_to_first_transition() {
        use crate::arrow::{LOOP_RADIUS, LOOP_SPREAD};
        use std::f64::consts::PI;

        let mut graph = GraphModel::new();
        let anchor = Point::new(100.0, 100.0);
        graph.add_state(anchor);
        graph.connect(0, 0);
        graph.connect(0, 0);

        // Outermost point of the second loop, which also lies on the first loop's band.
        let outward = Point::from_angle(-PI / 2.0 + 0.5 * LOOP_SPREAD);
        let top = anchor + outward * (crate::types::STATE_RADIUS + LOOP_RADIUS);

        let arrows = layout_edges(&graph);
        assert!(arrows[0].1.hit(top));
        assert!(arrows[1].1.hit(top));
        assert_eq!(graph.check_vertexes_click(top), Some(0));
    }

    #[test]
    fn test_determine_pos_avoids_states() {
        let mut graph = GraphModel::new();
        graph.add_state(Point::new(100.0, 100.0));
        let rect = Rect::new(0.0, 0.0, 400.0, 400.0);
        let mut rng = rng();

        for _ in 0..200 {
            let pos = graph.determine_pos_with(rect, &mut rng);
            assert!(rect.contains(pos));
            assert_eq!(graph.check(pos), None);
        }
    }

    #[test]
    fn test_determine_pos_is_bounded_when_full() {
        let mut graph = GraphModel::new();
        graph.add_state(Point::new(5.0, 5.0));
        let rect = Rect::new(0.0, 0.0, 10.0, 10.0);

        let pos = graph.determine_pos_with(rect, &mut rng());
        assert!(rect.contains(pos));
    }

    #[test]
    fn test_load_algorithm_scenario() {
        let report = GraphModel::load_algorithm_with(EXAMPLE, 800.0, 600.0, &mut rng());
        let graph = report.graph;

        assert!(report.skipped.is_empty());
        assert_eq!(graph.state_count(), 2);
        assert!(graph.state(0).is_some() && graph.state(1).is_some());
        assert_eq!(graph.transition_count(), 3);
        assert_eq!(graph.export_graph(), EXAMPLE);
    }

    #[test]
    fn test_load_algorithm_first_seen_order() {
        let report = GraphModel::load_algorithm_with(
            "5->2:0,1/R;2->9:1,0/L;0->5:0,0/H;",
            800.0,
            600.0,
            &mut rng(),
        );
        let ids: Vec<StateId> = report.graph.states().map(|state| state.id).collect();

        assert_eq!(ids, vec![5, 2, 9, 0]);
        for state in report.graph.states() {
            assert!(Rect::new(0.0, 0.0, 800.0, 600.0).contains(state.position));
        }
    }

    #[test]
    fn test_load_algorithm_skips_malformed() {
        let report =
            GraphModel::load_algorithm_with("0->1:0,1/R;0->7:0,1/X;1->0:1,0/L;", 800.0, 600.0, &mut rng());

        assert_eq!(report.skipped.len(), 1);
        assert!(matches!(
            report.skipped[0],
            GraphError::ParseError { index: 1, .. }
        ));
        assert_eq!(report.graph.state_count(), 2);
        assert_eq!(report.graph.export_graph(), "0->1:0,1/R;1->0:1,0/L;");
    }

    #[test]
    fn test_reset() {
        let mut graph = GraphModel::load_algorithm_with(EXAMPLE, 800.0, 600.0, &mut rng()).graph;
        graph.reset();

        assert_eq!(graph.state_count(), 0);
        assert_eq!(graph.export_graph(), "");
        assert_eq!(graph.add_state(Point::new(0.0, 0.0)), 0);
    }

    #[test]
    fn test_snapshot_round_trip() {
        let graph = GraphModel::load_algorithm_with(EXAMPLE, 800.0, 600.0, &mut rng()).graph;
        let json = serde_json::to_string(&graph).unwrap();
        let restored: GraphModel = serde_json::from_str(&json).unwrap();

        assert_eq!(restored, graph);
    }

    #[test]
    fn test_transition_map_view() {
        let graph = GraphModel::load_algorithm_with(EXAMPLE, 800.0, 600.0, &mut rng()).graph;
        let map = graph.transition_map();

        assert_eq!(map.len(), 3);
        assert_eq!(map.get(1, Symbol::Zero).map(|action| action.to), Some(1));
    }
}
