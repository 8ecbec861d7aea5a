//! Common types used throughout gnat_planner

use itertools::Itertools;
use nalgebra::DVector;

use crate::common::traits::StateSpace;

/// A point in the configuration space (e.g. a vector of joint angles)
pub type State = DVector<f64>;

/// Stable handle to a motion owned by a `MotionStore`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MotionId(pub(crate) usize);

impl MotionId {
    /// Position of the motion in creation order
    pub fn index(&self) -> usize {
        self.0
    }
}

/// 2D point representation, used for plotting the first two coordinates of a state
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point2D {
    pub x: f64,
    pub y: f64,
}

impl Point2D {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn origin() -> Self {
        Self { x: 0.0, y: 0.0 }
    }

    pub fn distance(&self, other: &Point2D) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }

    /// Takes the first two coordinates of a state; missing ones read as zero
    pub fn from_state(state: &State) -> Self {
        Self {
            x: state.get(0).copied().unwrap_or(0.0),
            y: state.get(1).copied().unwrap_or(0.0),
        }
    }
}

impl From<(f64, f64)> for Point2D {
    fn from(tuple: (f64, f64)) -> Self {
        Self { x: tuple.0, y: tuple.1 }
    }
}

/// Geometric path represented as a sequence of states
#[derive(Debug, Clone, Default)]
pub struct Path {
    pub states: Vec<State>,
}

impl Path {
    pub fn new() -> Self {
        Self { states: Vec::new() }
    }

    pub fn from_states(states: Vec<State>) -> Self {
        Self { states }
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    pub fn first(&self) -> Option<&State> {
        self.states.first()
    }

    pub fn last(&self) -> Option<&State> {
        self.states.last()
    }

    /// Sum of the segment lengths, measured with the space metric
    pub fn length(&self, space: &dyn StateSpace) -> f64 {
        self.states
            .iter()
            .tuple_windows()
            .map(|(a, b)| space.distance(a, b))
            .sum()
    }

    pub fn to_points(&self) -> Vec<Point2D> {
        self.states.iter().map(Point2D::from_state).collect()
    }
}

/// Outcome of a call to `solve`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlannerStatus {
    /// A motion satisfying the goal was added to the tree
    ExactSolution,
    /// No motion reached the goal, but one ended within the goal's tolerance
    ApproximateSolution,
    /// The termination condition fired before any goal-satisfying motion was found
    NoSolution,
}

impl PlannerStatus {
    pub fn is_solved(&self) -> bool {
        !matches!(self, PlannerStatus::NoSolution)
    }

    pub fn is_exact(&self) -> bool {
        matches!(self, PlannerStatus::ExactSolution)
    }
}

/// Vertex/edge export of the growth tree for external visualisation
#[derive(Debug, Clone, Default)]
pub struct PlannerData {
    /// One vertex per motion, in creation order
    pub vertices: Vec<State>,
    /// (parent, child) pairs of vertex indices
    pub edges: Vec<(usize, usize)>,
    /// Vertices seeded from start states
    pub start_vertices: Vec<usize>,
    /// Vertices that terminated a solution
    pub goal_vertices: Vec<usize>,
}

impl PlannerData {
    pub fn num_vertices(&self) -> usize {
        self.vertices.len()
    }

    pub fn num_edges(&self) -> usize {
        self.edges.len()
    }

    /// Endpoints of every edge as 2D points, for plotting
    pub fn edge_segments(&self) -> Vec<(Point2D, Point2D)> {
        self.edges
            .iter()
            .map(|&(parent, child)| {
                (
                    Point2D::from_state(&self.vertices[parent]),
                    Point2D::from_state(&self.vertices[child]),
                )
            })
            .collect()
    }
}
