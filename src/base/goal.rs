//! Goal regions
//!
//! Both goals here can be sampled, so the planner's goal bias has something
//! to draw from.

use std::rc::Rc;

use nalgebra::DVector;
use rand::{Rng, RngCore};
use rand_distr::StandardNormal;

use crate::common::{Goal, PlannerError, PlannerResult, State, StateSpace};

/// A single goal state, reached when within `threshold` of it
pub struct GoalState {
    state: State,
    threshold: f64,
    tolerance: Option<f64>,
    space: Rc<dyn StateSpace>,
}

impl GoalState {
    pub fn new(space: Rc<dyn StateSpace>, state: State, threshold: f64) -> PlannerResult<Self> {
        if !(threshold >= 0.0) {
            return Err(PlannerError::InvalidParameter(format!(
                "goal threshold must be non-negative, got {}",
                threshold
            )));
        }
        if state.len() != space.dimension() {
            return Err(PlannerError::DimensionMismatch {
                expected: space.dimension(),
                found: state.len(),
            });
        }
        Ok(Self {
            state,
            threshold,
            tolerance: None,
            space,
        })
    }

    /// Accept approximate solutions ending within `tolerance` of the goal
    pub fn with_approximation_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = Some(tolerance);
        self
    }

    pub fn state(&self) -> &State {
        &self.state
    }
}

impl Goal for GoalState {
    fn is_satisfied(&self, state: &State) -> bool {
        self.space.distance(state, &self.state) <= self.threshold
    }

    fn distance(&self, state: &State) -> f64 {
        (self.space.distance(state, &self.state) - self.threshold).max(0.0)
    }

    fn approximation_tolerance(&self) -> Option<f64> {
        self.tolerance
    }

    fn can_sample(&self) -> bool {
        true
    }

    fn sample(&self, _rng: &mut dyn RngCore) -> Option<State> {
        Some(self.state.clone())
    }
}

/// Euclidean ball around a center state
#[derive(Debug, Clone)]
pub struct GoalBall {
    center: State,
    radius: f64,
    tolerance: Option<f64>,
}

impl GoalBall {
    pub fn new(center: State, radius: f64) -> PlannerResult<Self> {
        if !(radius > 0.0) || !radius.is_finite() {
            return Err(PlannerError::InvalidParameter(format!(
                "goal radius must be positive, got {}",
                radius
            )));
        }
        Ok(Self {
            center,
            radius,
            tolerance: None,
        })
    }

    /// Accept approximate solutions ending within `tolerance` of the ball
    pub fn with_approximation_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = Some(tolerance);
        self
    }

    pub fn center(&self) -> &State {
        &self.center
    }

    pub fn radius(&self) -> f64 {
        self.radius
    }
}

impl Goal for GoalBall {
    fn is_satisfied(&self, state: &State) -> bool {
        (state - &self.center).norm() <= self.radius
    }

    fn distance(&self, state: &State) -> f64 {
        ((state - &self.center).norm() - self.radius).max(0.0)
    }

    fn approximation_tolerance(&self) -> Option<f64> {
        self.tolerance
    }

    fn can_sample(&self) -> bool {
        true
    }

    /// Uniform sample inside the ball: gaussian direction, radius scaled by u^(1/n)
    fn sample(&self, rng: &mut dyn RngCore) -> Option<State> {
        let n = self.center.len();
        let direction =
            DVector::<f64>::from_iterator(n, (0..n).map(|_| rng.sample::<f64, _>(StandardNormal)));
        let norm = direction.norm();
        if norm == 0.0 {
            return Some(self.center.clone());
        }
        let scale = self.radius * rng.gen::<f64>().powf(1.0 / n as f64) / norm;
        Some(&self.center + direction * scale)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::base::real_vector::RealVectorStateSpace;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_goal_ball_membership() {
        let goal = GoalBall::new(State::from_vec(vec![10.0, 10.0]), 0.5).unwrap();
        assert!(goal.is_satisfied(&State::from_vec(vec![10.2, 9.8])));
        assert!(!goal.is_satisfied(&State::from_vec(vec![9.0, 9.0])));
        assert!((goal.distance(&State::from_vec(vec![10.0, 8.5])) - 1.0).abs() < 1e-12);
        assert_eq!(goal.distance(&State::from_vec(vec![10.0, 10.0])), 0.0);
    }

    #[test]
    fn test_goal_ball_samples_inside() {
        let goal = GoalBall::new(State::from_vec(vec![1.0, 2.0, 3.0]), 0.25).unwrap();
        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..500 {
            let s = goal.sample(&mut rng).unwrap();
            assert!(goal.is_satisfied(&s));
        }
    }

    #[test]
    fn test_goal_ball_rejects_bad_radius() {
        assert!(GoalBall::new(State::from_vec(vec![0.0]), 0.0).is_err());
        assert!(GoalBall::new(State::from_vec(vec![0.0]), f64::NAN).is_err());
    }

    #[test]
    fn test_goal_state() {
        let space: Rc<dyn StateSpace> =
            Rc::new(RealVectorStateSpace::new(vec![(0.0, 5.0), (0.0, 5.0)]).unwrap());
        let goal = GoalState::new(Rc::clone(&space), State::from_vec(vec![4.0, 4.0]), 0.1)
            .unwrap()
            .with_approximation_tolerance(1.0);
        assert!(goal.is_satisfied(&State::from_vec(vec![4.05, 4.0])));
        assert_eq!(goal.approximation_tolerance(), Some(1.0));
        let mut rng = StdRng::seed_from_u64(0);
        assert_eq!(goal.sample(&mut rng).unwrap(), State::from_vec(vec![4.0, 4.0]));

        assert!(GoalState::new(space, State::from_vec(vec![1.0]), 0.1).is_err());
    }
}
