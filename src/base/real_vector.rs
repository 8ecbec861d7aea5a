//! Bounded real-vector configuration space
//!
//! Euclidean metric, linear interpolation and uniform sampling inside an
//! axis-aligned box. A projection onto the first (up to) two coordinates is
//! registered as the default, with 20 grid cells per projected axis.

use std::collections::HashMap;
use std::rc::Rc;

use nalgebra::DVector;
use rand::{Rng, RngCore};

use crate::common::{PlannerError, PlannerResult, ProjectionEvaluator, State, StateSpace};

/// Number of grid cells per axis used by the default projection
const DEFAULT_CELLS_PER_AXIS: f64 = 20.0;

/// Name the default projection is registered under
pub const DEFAULT_PROJECTION_NAME: &str = "";

/// Orthogonal projection onto a subset of the coordinates
#[derive(Debug, Clone)]
pub struct RealVectorProjection {
    components: Vec<usize>,
    cell_sizes: Vec<f64>,
}

impl RealVectorProjection {
    pub fn new(components: Vec<usize>, cell_sizes: Vec<f64>) -> PlannerResult<Self> {
        if components.is_empty() {
            return Err(PlannerError::InvalidParameter(
                "projection needs at least one component".to_string(),
            ));
        }
        if components.len() != cell_sizes.len() {
            return Err(PlannerError::DimensionMismatch {
                expected: components.len(),
                found: cell_sizes.len(),
            });
        }
        if let Some(size) = cell_sizes.iter().find(|s| !(**s > 0.0) || !s.is_finite()) {
            return Err(PlannerError::InvalidParameter(format!(
                "cell size must be positive and finite, got {}",
                size
            )));
        }
        Ok(Self { components, cell_sizes })
    }

    pub fn components(&self) -> &[usize] {
        &self.components
    }
}

impl ProjectionEvaluator for RealVectorProjection {
    fn dimension(&self) -> usize {
        self.components.len()
    }

    fn cell_sizes(&self) -> Vec<f64> {
        self.cell_sizes.clone()
    }

    fn project(&self, state: &State) -> DVector<f64> {
        DVector::from_iterator(self.components.len(), self.components.iter().map(|&c| state[c]))
    }
}

/// Axis-aligned box in R^n
pub struct RealVectorStateSpace {
    bounds: Vec<(f64, f64)>,
    projections: HashMap<String, Rc<dyn ProjectionEvaluator>>,
}

impl RealVectorStateSpace {
    /// Create a space from `(low, high)` bounds per coordinate
    pub fn new(bounds: Vec<(f64, f64)>) -> PlannerResult<Self> {
        if bounds.is_empty() {
            return Err(PlannerError::InvalidParameter(
                "state space needs at least one dimension".to_string(),
            ));
        }
        for (i, &(low, high)) in bounds.iter().enumerate() {
            if !(low < high) || !low.is_finite() || !high.is_finite() {
                return Err(PlannerError::InvalidParameter(format!(
                    "bounds of dimension {} must satisfy low < high, got [{}, {}]",
                    i, low, high
                )));
            }
        }

        let projected = bounds.len().min(2);
        let components: Vec<usize> = (0..projected).collect();
        let cell_sizes = bounds[..projected]
            .iter()
            .map(|(low, high)| (high - low) / DEFAULT_CELLS_PER_AXIS)
            .collect();
        let default_projection = RealVectorProjection::new(components, cell_sizes)?;

        let mut projections: HashMap<String, Rc<dyn ProjectionEvaluator>> = HashMap::new();
        projections.insert(DEFAULT_PROJECTION_NAME.to_string(), Rc::new(default_projection));

        Ok(Self { bounds, projections })
    }

    /// Create a space with no projection registered, not even the default one
    pub fn without_projections(bounds: Vec<(f64, f64)>) -> PlannerResult<Self> {
        let mut space = Self::new(bounds)?;
        space.projections.clear();
        Ok(space)
    }

    pub fn bounds(&self) -> &[(f64, f64)] {
        &self.bounds
    }

    /// Register a projection under `name`, replacing any previous one
    pub fn register_projection(
        &mut self,
        name: &str,
        projection: RealVectorProjection,
    ) -> PlannerResult<()> {
        if let Some(&c) = projection.components().iter().find(|&&c| c >= self.bounds.len()) {
            return Err(PlannerError::InvalidParameter(format!(
                "projection component {} out of range for a {}-dimensional space",
                c,
                self.bounds.len()
            )));
        }
        self.projections.insert(name.to_string(), Rc::new(projection));
        Ok(())
    }

    /// Whether `state` lies inside the bounds
    pub fn satisfies_bounds(&self, state: &State) -> bool {
        state.len() == self.bounds.len()
            && state
                .iter()
                .zip(self.bounds.iter())
                .all(|(v, (low, high))| *v >= *low && *v <= *high)
    }
}

impl StateSpace for RealVectorStateSpace {
    fn dimension(&self) -> usize {
        self.bounds.len()
    }

    fn distance(&self, a: &State, b: &State) -> f64 {
        (a - b).norm()
    }

    fn maximum_extent(&self) -> f64 {
        self.bounds
            .iter()
            .map(|(low, high)| (high - low).powi(2))
            .sum::<f64>()
            .sqrt()
    }

    fn can_sample_uniform(&self) -> bool {
        true
    }

    fn sample_uniform(&self, rng: &mut dyn RngCore) -> Option<State> {
        Some(DVector::from_iterator(
            self.bounds.len(),
            self.bounds.iter().map(|&(low, high)| rng.gen_range(low..=high)),
        ))
    }

    fn default_projection(&self) -> Option<Rc<dyn ProjectionEvaluator>> {
        self.projection(DEFAULT_PROJECTION_NAME)
    }

    fn projection(&self, name: &str) -> Option<Rc<dyn ProjectionEvaluator>> {
        self.projections.get(name).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn square() -> RealVectorStateSpace {
        RealVectorStateSpace::new(vec![(0.0, 10.0), (0.0, 10.0)]).unwrap()
    }

    #[test]
    fn test_invalid_bounds_rejected() {
        assert!(RealVectorStateSpace::new(vec![]).is_err());
        assert!(RealVectorStateSpace::new(vec![(1.0, 1.0)]).is_err());
        assert!(RealVectorStateSpace::new(vec![(0.0, f64::INFINITY)]).is_err());
    }

    #[test]
    fn test_distance_and_extent() {
        let space = square();
        let a = State::from_vec(vec![0.0, 0.0]);
        let b = State::from_vec(vec![3.0, 4.0]);
        assert!((space.distance(&a, &b) - 5.0).abs() < 1e-12);
        assert!((space.maximum_extent() - 200.0_f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn test_uniform_samples_inside_bounds() {
        let space = square();
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..200 {
            let s = space.sample_uniform(&mut rng).unwrap();
            assert!(space.satisfies_bounds(&s));
        }
    }

    #[test]
    fn test_default_projection() {
        let space = RealVectorStateSpace::new(vec![(0.0, 10.0), (0.0, 4.0), (-1.0, 1.0)]).unwrap();
        let proj = space.default_projection().unwrap();
        assert_eq!(proj.dimension(), 2);
        assert_eq!(proj.cell_sizes(), vec![0.5, 0.2]);
        let p = proj.project(&State::from_vec(vec![1.0, 2.0, 0.5]));
        assert_eq!(p.as_slice(), &[1.0, 2.0]);
    }

    #[test]
    fn test_named_projection_lookup() {
        let mut space = square();
        let proj = RealVectorProjection::new(vec![1], vec![0.5]).unwrap();
        space.register_projection("y", proj).unwrap();
        assert_eq!(space.projection("y").unwrap().dimension(), 1);
        assert!(space.projection("z").is_none());

        let bad = RealVectorProjection::new(vec![5], vec![0.5]).unwrap();
        assert!(space.register_projection("bad", bad).is_err());
    }

    #[test]
    fn test_without_projections() {
        let space = RealVectorStateSpace::without_projections(vec![(0.0, 1.0)]).unwrap();
        assert!(space.default_projection().is_none());
    }

    #[test]
    fn test_projection_validation() {
        assert!(RealVectorProjection::new(vec![], vec![]).is_err());
        assert!(RealVectorProjection::new(vec![0], vec![0.0]).is_err());
        assert!(RealVectorProjection::new(vec![0, 1], vec![1.0]).is_err());
    }
}
