//! Space information: the state space bundled with validity checking
//!
//! Segments are checked by interpolating at a fixed resolution unless a
//! dedicated `MotionValidator` is installed.

use std::rc::Rc;

use rand::RngCore;

use crate::common::{
    MotionValidator, PlannerError, PlannerResult, State, StateSpace, StateValidityChecker,
    ValidStateSampler,
};

/// Fraction of the space extent between two checked states on a segment
const DEFAULT_RESOLUTION_FRACTION: f64 = 0.01;

/// Number of draws a uniform valid-state sampler makes before giving up
const DEFAULT_SAMPLE_ATTEMPTS: usize = 100;

/// Space plus validity checking, shared by planner and samplers
#[derive(Clone)]
pub struct SpaceInformation {
    space: Rc<dyn StateSpace>,
    checker: Rc<dyn StateValidityChecker>,
    motion_validator: Option<Rc<dyn MotionValidator>>,
    resolution: f64,
}

impl SpaceInformation {
    pub fn new(space: Rc<dyn StateSpace>, checker: Rc<dyn StateValidityChecker>) -> Self {
        let extent = space.maximum_extent();
        let resolution = if extent.is_finite() && extent > 0.0 {
            DEFAULT_RESOLUTION_FRACTION * extent
        } else {
            DEFAULT_RESOLUTION_FRACTION
        };
        Self {
            space,
            checker,
            motion_validator: None,
            resolution,
        }
    }

    /// Replace the discretised segment check with a dedicated validator
    pub fn with_motion_validator(mut self, validator: Rc<dyn MotionValidator>) -> Self {
        self.motion_validator = Some(validator);
        self
    }

    /// Set the distance between two checked states on a segment
    pub fn set_motion_resolution(&mut self, resolution: f64) -> PlannerResult<()> {
        if !(resolution > 0.0) || !resolution.is_finite() {
            return Err(PlannerError::InvalidParameter(format!(
                "motion resolution must be positive, got {}",
                resolution
            )));
        }
        self.resolution = resolution;
        Ok(())
    }

    pub fn motion_resolution(&self) -> f64 {
        self.resolution
    }

    pub fn space(&self) -> &Rc<dyn StateSpace> {
        &self.space
    }

    pub fn validity_checker(&self) -> &Rc<dyn StateValidityChecker> {
        &self.checker
    }

    pub fn dimension(&self) -> usize {
        self.space.dimension()
    }

    pub fn distance(&self, a: &State, b: &State) -> f64 {
        self.space.distance(a, b)
    }

    pub fn is_valid(&self, state: &State) -> bool {
        self.checker.is_valid(state)
    }

    /// Whether the segment from `from` to `to` is valid, `to` included
    pub fn check_motion(&self, from: &State, to: &State) -> bool {
        if let Some(validator) = &self.motion_validator {
            return validator.check_motion(from, to);
        }

        if !self.checker.is_valid(to) {
            return false;
        }
        let steps = (self.space.distance(from, to) / self.resolution).ceil() as usize;
        (1..steps).all(|i| {
            let t = i as f64 / steps as f64;
            self.checker.is_valid(&self.space.interpolate(from, to, t))
        })
    }

    /// Default sampler: uniform draws filtered by the validity checker.
    /// `None` when the space cannot sample uniformly.
    pub fn alloc_valid_state_sampler(&self) -> Option<Box<dyn ValidStateSampler>> {
        if !self.space.can_sample_uniform() {
            return None;
        }
        Some(Box::new(UniformValidStateSampler::new(
            Rc::clone(&self.space),
            Rc::clone(&self.checker),
        )))
    }
}

/// Rejection sampler over the uniform distribution of the space
pub struct UniformValidStateSampler {
    space: Rc<dyn StateSpace>,
    checker: Rc<dyn StateValidityChecker>,
    attempts: usize,
}

impl UniformValidStateSampler {
    pub fn new(space: Rc<dyn StateSpace>, checker: Rc<dyn StateValidityChecker>) -> Self {
        Self {
            space,
            checker,
            attempts: DEFAULT_SAMPLE_ATTEMPTS,
        }
    }

    pub fn with_attempts(mut self, attempts: usize) -> Self {
        self.attempts = attempts.max(1);
        self
    }
}

impl ValidStateSampler for UniformValidStateSampler {
    fn sample(&mut self, rng: &mut dyn RngCore) -> Option<State> {
        for _ in 0..self.attempts {
            let candidate = self.space.sample_uniform(rng)?;
            if self.checker.is_valid(&candidate) {
                return Some(candidate);
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::base::real_vector::RealVectorStateSpace;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    /// Square [0,10]^2 with a wall x in [4,6] for y < 8
    fn walled_square() -> SpaceInformation {
        let space = RealVectorStateSpace::new(vec![(0.0, 10.0), (0.0, 10.0)]).unwrap();
        let checker = |s: &State| !(s[0] >= 4.0 && s[0] <= 6.0 && s[1] < 8.0);
        SpaceInformation::new(Rc::new(space), Rc::new(checker))
    }

    #[test]
    fn test_check_motion_detects_wall() {
        let si = walled_square();
        let a = State::from_vec(vec![2.0, 2.0]);
        let b = State::from_vec(vec![8.0, 2.0]);
        let c = State::from_vec(vec![2.0, 9.0]);
        assert!(!si.check_motion(&a, &b));
        assert!(si.check_motion(&a, &c));
    }

    #[test]
    fn test_check_motion_rejects_invalid_endpoint() {
        let si = walled_square();
        let a = State::from_vec(vec![3.9, 2.0]);
        let b = State::from_vec(vec![4.5, 2.0]);
        assert!(!si.check_motion(&a, &b));
    }

    #[test]
    fn test_resolution_validation() {
        let mut si = walled_square();
        assert!(si.set_motion_resolution(0.0).is_err());
        assert!(si.set_motion_resolution(0.05).is_ok());
        assert_eq!(si.motion_resolution(), 0.05);
    }

    #[test]
    fn test_custom_motion_validator() {
        struct Never;
        impl MotionValidator for Never {
            fn check_motion(&self, _from: &State, _to: &State) -> bool {
                false
            }
        }
        let si = walled_square().with_motion_validator(Rc::new(Never));
        let a = State::from_vec(vec![1.0, 1.0]);
        assert!(!si.check_motion(&a, &a));
    }

    #[test]
    fn test_uniform_valid_sampler_only_returns_valid_states() {
        let si = walled_square();
        let mut sampler = si.alloc_valid_state_sampler().unwrap();
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..100 {
            let s = sampler.sample(&mut rng).unwrap();
            assert!(si.is_valid(&s));
        }
    }

    #[test]
    fn test_sampler_gives_up_when_everything_is_invalid() {
        let space = RealVectorStateSpace::new(vec![(0.0, 1.0)]).unwrap();
        let checker = |_: &State| false;
        let si = SpaceInformation::new(Rc::new(space), Rc::new(checker));
        let mut sampler = si.alloc_valid_state_sampler().unwrap();
        let mut rng = StdRng::seed_from_u64(3);
        assert!(sampler.sample(&mut rng).is_none());
    }
}
