//! Common traits defining the collaborators of the planner
//!
//! The planner itself only grows the tree. Everything that depends on the
//! robot or the environment (metric, validity, sampling, projection, goal) is
//! supplied through these traits.

use std::rc::Rc;

use nalgebra::DVector;
use rand::RngCore;

use crate::common::error::PlannerResult;
use crate::common::termination::TerminationCondition;
use crate::common::types::*;

/// Configuration space the planner searches
pub trait StateSpace {
    /// Number of coordinates of a state
    fn dimension(&self) -> usize;

    /// Distance between two states. Must be a metric for the index to stay exact.
    fn distance(&self, a: &State, b: &State) -> f64;

    /// State at fraction `t` of the way from `from` to `to`
    fn interpolate(&self, from: &State, to: &State, t: f64) -> State {
        from + (to - from) * t
    }

    /// Largest distance between two states of the space
    fn maximum_extent(&self) -> f64 {
        f64::INFINITY
    }

    /// Whether `sample_uniform` produces states
    fn can_sample_uniform(&self) -> bool {
        false
    }

    /// Uniformly distributed state (validity is not checked)
    fn sample_uniform(&self, _rng: &mut dyn RngCore) -> Option<State> {
        None
    }

    /// Projection used when the planner is not given one explicitly
    fn default_projection(&self) -> Option<Rc<dyn ProjectionEvaluator>> {
        None
    }

    /// Projection registered under `name`
    fn projection(&self, _name: &str) -> Option<Rc<dyn ProjectionEvaluator>> {
        None
    }
}

/// Maps a state to a low-dimensional coordinate used for exploration bias
pub trait ProjectionEvaluator {
    /// Number of coordinates of a projection
    fn dimension(&self) -> usize;

    /// Grid cell size along each projected coordinate
    fn cell_sizes(&self) -> Vec<f64>;

    /// Projection of `state`
    fn project(&self, state: &State) -> DVector<f64>;
}

/// Decides whether a single state is collision free
pub trait StateValidityChecker {
    fn is_valid(&self, state: &State) -> bool;
}

impl<F> StateValidityChecker for F
where
    F: Fn(&State) -> bool,
{
    fn is_valid(&self, state: &State) -> bool {
        self(state)
    }
}

/// Decides whether the straight segment between two states is collision free
pub trait MotionValidator {
    fn check_motion(&self, from: &State, to: &State) -> bool;
}

/// Produces valid states to grow the tree toward
pub trait ValidStateSampler {
    /// A valid state, or `None` when no valid state was found this time
    fn sample(&mut self, rng: &mut dyn RngCore) -> Option<State>;
}

/// Goal test of a planning problem
pub trait Goal {
    /// Whether `state` is inside the goal
    fn is_satisfied(&self, state: &State) -> bool;

    /// Distance from `state` to the goal (zero inside it)
    fn distance(&self, state: &State) -> f64;

    /// States closer than this count as approximate solutions
    fn approximation_tolerance(&self) -> Option<f64> {
        None
    }

    /// Whether `sample` produces goal states
    fn can_sample(&self) -> bool {
        false
    }

    /// A state inside the goal region
    fn sample(&self, _rng: &mut dyn RngCore) -> Option<State> {
        None
    }
}

/// Trait for tree-growing motion planners
pub trait Planner {
    /// Validate the configuration and seed the tree
    fn setup(&mut self) -> PlannerResult<()>;

    /// Grow the tree until a solution is found or `ptc` fires
    fn solve(&mut self, ptc: &mut dyn TerminationCondition) -> PlannerResult<PlannerStatus>;

    /// Release every motion and return to the pre-setup state
    fn clear(&mut self);

    /// Export the tree as vertices and edges
    fn planner_data(&self) -> PlannerData;
}
