//! GNAT-indexed exploration planner
//!
//! A single tree is grown from the start states. Each iteration draws a cell
//! of the exploration grid (sparse cells are favoured), takes a motion from
//! that cell as the seed, samples a target (the goal with probability
//! `goal_bias`, a uniform valid state otherwise) and extends the seed toward
//! it by at most `range`. Valid extensions are added to the motion store, the
//! nearest-neighbor index and the grid in the same step, so the three always
//! hold the same motions.

use std::rc::Rc;

use log::{debug, info, trace, warn};
use nalgebra::DVector;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::base::SpaceInformation;
use crate::common::{
    Goal, MotionId, Path, Planner, PlannerData, PlannerError, PlannerResult, PlannerStatus,
    ProjectionEvaluator, State, TerminationCondition, ValidStateSampler,
};
use crate::datastructures::{DistanceFn, ExplorationGrid, Gnat, NearestNeighborsConfig};
use crate::path_planning::motion::MotionStore;

/// Fraction of the space extent used as range when none is configured
const DEFAULT_RANGE_FRACTION: f64 = 0.2;

/// Configuration for the GNAT planner
#[derive(Debug, Clone)]
pub struct GnatConfig {
    /// Index motions by the distance between their projections instead of
    /// the state space metric
    pub use_projected_distance: bool,
    /// Probability of extending toward a goal sample, in [0, 1]
    pub goal_bias: f64,
    /// Maximum distance between a motion and its parent.
    /// `None` resolves to a fraction of the space extent at setup.
    pub range: Option<f64>,
    /// Seed of the planner's random number generator. `None` seeds from entropy.
    pub seed: Option<u64>,
    /// Shape of the nearest-neighbor index
    pub nearest_neighbors: NearestNeighborsConfig,
}

impl Default for GnatConfig {
    fn default() -> Self {
        Self {
            use_projected_distance: false,
            goal_bias: 0.05,
            range: None,
            seed: None,
            nearest_neighbors: NearestNeighborsConfig::default(),
        }
    }
}

impl GnatConfig {
    pub fn validate(&self) -> PlannerResult<()> {
        check_goal_bias(self.goal_bias)?;
        if let Some(range) = self.range {
            check_range(range)?;
        }
        self.nearest_neighbors.validate()
    }
}

fn check_goal_bias(goal_bias: f64) -> PlannerResult<()> {
    if !(0.0..=1.0).contains(&goal_bias) {
        return Err(PlannerError::InvalidParameter(format!(
            "goal bias must be in [0, 1], got {}",
            goal_bias
        )));
    }
    Ok(())
}

fn check_range(range: f64) -> PlannerResult<()> {
    if !(range > 0.0) || !range.is_finite() {
        return Err(PlannerError::InvalidParameter(format!(
            "range must be positive and finite, got {}",
            range
        )));
    }
    Ok(())
}

/// Where the planner is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    /// No tree; `setup` has not run or `clear` was called
    Uninitialized,
    /// Tree seeded with the start states
    Ready,
    /// Inside `solve`
    Running,
    /// `solve` returned with this status
    Finished(PlannerStatus),
}

/// Counters of the last call to `solve`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlannerStats {
    /// Polls of the termination condition that let an iteration run
    pub iterations: usize,
    /// Iterations where no target state could be sampled
    pub sampler_failures: usize,
    /// Candidates rejected by the motion check
    pub invalid_motions: usize,
    /// Motions added to the tree
    pub motions_added: usize,
}

/// Path found by the last call to `solve`
#[derive(Debug, Clone)]
pub struct Solution {
    pub path: Path,
    /// Motions along the path, root first
    pub motions: Vec<MotionId>,
    /// The final state is only within the goal's approximation tolerance
    pub approximate: bool,
    /// Goal distance of the final state
    pub goal_distance: f64,
}

/// Entry of the nearest-neighbor index: a motion and the point it is indexed
/// at (its state, or its projection with projected distance)
#[derive(Debug, Clone)]
pub struct MotionKey {
    pub id: MotionId,
    pub point: DVector<f64>,
}

impl PartialEq for MotionKey {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

/// Index and grid of a set-up planner, plus what was resolved at setup
struct Exploration {
    index: Gnat<MotionKey>,
    grid: ExplorationGrid,
    projection: Rc<dyn ProjectionEvaluator>,
    projected_distance: bool,
    range: f64,
}

impl Exploration {
    /// Add a motion to the store, the index and the grid
    fn add(
        &mut self,
        store: &mut MotionStore,
        parent: Option<MotionId>,
        state: State,
    ) -> PlannerResult<MotionId> {
        let projection = self.projection.project(&state);
        let coord = self.grid.coordinates(&projection)?;
        let point = if self.projected_distance {
            projection
        } else {
            state.clone()
        };
        let id = match parent {
            Some(parent) => store.append(parent, state)?,
            None => store.create_root(state),
        };
        self.grid.bucket_at(id, coord)?;
        self.index.add(MotionKey { id, point });
        Ok(id)
    }

    /// Motion to extend from. A drawn cell without motions falls back to the
    /// motion whose projection is nearest to the cell center.
    fn pick_seed(&self, store: &MotionStore, rng: &mut StdRng) -> Option<MotionId> {
        self.grid.pick_seed(rng, |center| {
            if self.projected_distance {
                let query = MotionKey {
                    id: MotionId(usize::MAX),
                    point: center.clone(),
                };
                return self.index.nearest(&query).map(|key| key.id);
            }
            store
                .iter()
                .map(|(id, m)| (id, (self.projection.project(&m.state) - center).norm()))
                .min_by(|a, b| a.1.total_cmp(&b.1))
                .map(|(id, _)| id)
        })
    }
}

/// Tree planner biased toward sparsely explored cells of a projection
pub struct GnatPlanner {
    si: SpaceInformation,
    start_states: Vec<State>,
    goal: Box<dyn Goal>,
    config: GnatConfig,
    projection: Option<Rc<dyn ProjectionEvaluator>>,
    sampler: Option<Box<dyn ValidStateSampler>>,
    /// `sampler` was allocated by `setup` rather than supplied by the caller
    default_sampler: bool,
    store: MotionStore,
    exploration: Option<Exploration>,
    rng: StdRng,
    lifecycle: Lifecycle,
    stats: PlannerStats,
    solution: Option<Solution>,
}

impl GnatPlanner {
    /// Create a planner growing from `start_states` toward `goal`
    pub fn new(
        si: SpaceInformation,
        start_states: Vec<State>,
        goal: Box<dyn Goal>,
        config: GnatConfig,
    ) -> PlannerResult<Self> {
        config.validate()?;
        Ok(Self {
            si,
            start_states,
            goal,
            rng: seeded_rng(config.seed),
            config,
            projection: None,
            sampler: None,
            default_sampler: false,
            store: MotionStore::new(),
            exploration: None,
            lifecycle: Lifecycle::Uninitialized,
            stats: PlannerStats::default(),
            solution: None,
        })
    }

    pub fn config(&self) -> &GnatConfig {
        &self.config
    }

    pub fn space_information(&self) -> &SpaceInformation {
        &self.si
    }

    pub fn lifecycle(&self) -> Lifecycle {
        self.lifecycle
    }

    pub fn goal_bias(&self) -> f64 {
        self.config.goal_bias
    }

    pub fn set_goal_bias(&mut self, goal_bias: f64) -> PlannerResult<()> {
        check_goal_bias(goal_bias)?;
        self.config.goal_bias = goal_bias;
        Ok(())
    }

    /// Range in use: the resolved one once set up, the configured one before
    pub fn range(&self) -> Option<f64> {
        match &self.exploration {
            Some(exploration) => Some(exploration.range),
            None => self.config.range,
        }
    }

    /// Takes effect at the next `setup`
    pub fn set_range(&mut self, range: f64) -> PlannerResult<()> {
        check_range(range)?;
        self.config.range = Some(range);
        Ok(())
    }

    /// Use `projection` instead of the space's default one
    pub fn set_projection_evaluator(&mut self, projection: Rc<dyn ProjectionEvaluator>) {
        self.projection = Some(projection);
    }

    /// Use the projection the space registered under `name`
    pub fn set_projection_evaluator_by_name(&mut self, name: &str) -> PlannerResult<()> {
        match self.si.space().projection(name) {
            Some(projection) => {
                self.projection = Some(projection);
                Ok(())
            }
            None => Err(PlannerError::Configuration(format!(
                "state space has no projection named {:?}",
                name
            ))),
        }
    }

    /// Projection resolved at setup, or the explicit one before that
    pub fn projection_evaluator(&self) -> Option<Rc<dyn ProjectionEvaluator>> {
        match &self.exploration {
            Some(exploration) => Some(Rc::clone(&exploration.projection)),
            None => self.projection.clone(),
        }
    }

    /// Draw targets from `sampler` instead of the space's uniform sampler
    pub fn set_valid_state_sampler(&mut self, sampler: Box<dyn ValidStateSampler>) {
        self.sampler = Some(sampler);
        self.default_sampler = false;
    }

    pub fn stats(&self) -> &PlannerStats {
        &self.stats
    }

    pub fn solution(&self) -> Option<&Solution> {
        self.solution.as_ref()
    }

    pub fn motions(&self) -> &MotionStore {
        &self.store
    }

    pub fn index(&self) -> Option<&Gnat<MotionKey>> {
        self.exploration.as_ref().map(|e| &e.index)
    }

    pub fn grid(&self) -> Option<&ExplorationGrid> {
        self.exploration.as_ref().map(|e| &e.grid)
    }

    /// Drop the tree and seed a fresh one from the start states
    pub fn reset(&mut self) -> PlannerResult<()> {
        self.release_tree();
        self.setup()
    }

    fn release_tree(&mut self) {
        // index and grid only hold ids into the store, so they go first
        self.exploration = None;
        self.store.clear();
        self.solution = None;
        self.stats = PlannerStats::default();
        self.lifecycle = Lifecycle::Uninitialized;
    }

    fn resolve_projection(&self) -> PlannerResult<Rc<dyn ProjectionEvaluator>> {
        let projection = match &self.projection {
            Some(projection) => Rc::clone(projection),
            None => self.si.space().default_projection().ok_or_else(|| {
                PlannerError::Configuration(
                    "no projection evaluator set and the state space has no default".to_string(),
                )
            })?,
        };
        let cell_sizes = projection.cell_sizes();
        if cell_sizes.len() != projection.dimension() {
            return Err(PlannerError::Configuration(format!(
                "projection declares {} dimensions but {} cell sizes",
                projection.dimension(),
                cell_sizes.len()
            )));
        }
        Ok(projection)
    }

    fn resolve_range(&self) -> PlannerResult<f64> {
        if let Some(range) = self.config.range {
            return Ok(range);
        }
        let extent = self.si.space().maximum_extent();
        if !extent.is_finite() || !(extent > 0.0) {
            return Err(PlannerError::Configuration(
                "no range set and the state space has no finite extent".to_string(),
            ));
        }
        Ok(DEFAULT_RANGE_FRACTION * extent)
    }

    fn distance_function(&self) -> DistanceFn<MotionKey> {
        if self.config.use_projected_distance {
            Box::new(|a: &MotionKey, b: &MotionKey| (&a.point - &b.point).norm())
        } else {
            let space = Rc::clone(self.si.space());
            Box::new(move |a: &MotionKey, b: &MotionKey| space.distance(&a.point, &b.point))
        }
    }

    fn valid_start_states(&self) -> PlannerResult<Vec<State>> {
        if self.start_states.is_empty() {
            return Err(PlannerError::Configuration("no start states".to_string()));
        }
        let dimension = self.si.dimension();
        let mut valid = Vec::with_capacity(self.start_states.len());
        for state in &self.start_states {
            if state.len() != dimension {
                return Err(PlannerError::DimensionMismatch {
                    expected: dimension,
                    found: state.len(),
                });
            }
            if self.si.is_valid(state) {
                valid.push(state.clone());
            } else {
                warn!("skipping invalid start state {:?}", state.as_slice());
            }
        }
        if valid.is_empty() {
            return Err(PlannerError::Configuration("no valid start states".to_string()));
        }
        Ok(valid)
    }

    fn make_solution(&self, last: MotionId, approximate: bool) -> PlannerResult<Solution> {
        let motions = self.store.path_to_root(last)?;
        let states = motions
            .iter()
            .filter_map(|&id| self.store.state(id).cloned())
            .collect();
        let goal_distance = self
            .store
            .state(last)
            .map_or(f64::INFINITY, |s| self.goal.distance(s));
        Ok(Solution {
            path: Path::from_states(states),
            motions,
            approximate,
            goal_distance,
        })
    }

    fn finish(
        &mut self,
        status: PlannerStatus,
        last: Option<(MotionId, bool)>,
    ) -> PlannerResult<PlannerStatus> {
        if let Some((id, approximate)) = last {
            self.solution = Some(self.make_solution(id, approximate)?);
        }
        self.lifecycle = Lifecycle::Finished(status);
        info!(
            "GNAT finished with {:?}: {} motions in {} cells after {} iterations ({} invalid, {} sampler failures)",
            status,
            self.store.len(),
            self.grid().map_or(0, |g| g.len()),
            self.stats.iterations,
            self.stats.invalid_motions,
            self.stats.sampler_failures
        );
        Ok(status)
    }
}

impl Planner for GnatPlanner {
    fn setup(&mut self) -> PlannerResult<()> {
        self.config.validate()?;
        let projection = self.resolve_projection()?;
        if self.sampler.is_none() {
            let sampler = self.si.alloc_valid_state_sampler().ok_or_else(|| {
                PlannerError::Configuration(
                    "no valid state sampler set and the state space cannot sample uniformly"
                        .to_string(),
                )
            })?;
            self.sampler = Some(sampler);
            self.default_sampler = true;
        }
        let range = self.resolve_range()?;
        let starts = self.valid_start_states()?;
        let index = Gnat::new(self.distance_function(), self.config.nearest_neighbors.clone())?;
        let grid = ExplorationGrid::new(projection.cell_sizes())?;

        self.release_tree();
        let mut exploration = Exploration {
            index,
            grid,
            projection,
            projected_distance: self.config.use_projected_distance,
            range,
        };
        for state in starts {
            exploration.add(&mut self.store, None, state)?;
        }
        info!(
            "GNAT set up: range {:.4}, {}-dimensional projection, {} distance, {} start states",
            range,
            exploration.projection.dimension(),
            if exploration.projected_distance { "projected" } else { "state space" },
            self.store.len()
        );
        self.exploration = Some(exploration);
        self.rng = seeded_rng(self.config.seed);
        self.lifecycle = Lifecycle::Ready;
        Ok(())
    }

    fn solve(&mut self, ptc: &mut dyn TerminationCondition) -> PlannerResult<PlannerStatus> {
        if self.lifecycle == Lifecycle::Uninitialized {
            self.setup()?;
        }
        self.stats = PlannerStats::default();
        self.solution = None;

        let tolerance = self.goal.approximation_tolerance();
        let mut approximate: Option<(MotionId, f64)> = None;
        let roots = self.store.roots().to_vec();
        for root in roots {
            let Some(state) = self.store.state(root) else { continue };
            if self.goal.is_satisfied(state) {
                return self.finish(PlannerStatus::ExactSolution, Some((root, false)));
            }
            let d = self.goal.distance(state);
            if tolerance.map_or(false, |t| d <= t) && approximate.map_or(true, |(_, best)| d < best) {
                approximate = Some((root, d));
            }
        }

        let (exploration, sampler) = match (self.exploration.as_mut(), self.sampler.as_mut()) {
            (Some(exploration), Some(sampler)) => (exploration, sampler),
            _ => {
                return Err(PlannerError::Configuration("planner is not set up".to_string()));
            }
        };
        self.lifecycle = Lifecycle::Running;
        let goal_bias = self.config.goal_bias;
        let goal_can_sample = self.goal.can_sample();
        let mut warned = false;
        let mut exact = None;

        while !ptc.should_terminate() {
            self.stats.iterations += 1;

            let Some(seed) = exploration.pick_seed(&self.store, &mut self.rng) else {
                break;
            };
            let Some(seed_state) = self.store.state(seed).cloned() else {
                break;
            };

            let toward_goal = self.rng.gen::<f64>() < goal_bias;
            let target = if toward_goal && goal_can_sample {
                self.goal.sample(&mut self.rng)
            } else {
                if toward_goal && !warned {
                    warn!("goal cannot be sampled, extending toward uniform samples instead");
                    warned = true;
                }
                sampler.sample(&mut self.rng)
            };
            let Some(target) = target else {
                self.stats.sampler_failures += 1;
                trace!("no target sampled");
                continue;
            };

            let d = self.si.distance(&seed_state, &target);
            let candidate = if d > exploration.range {
                self.si
                    .space()
                    .interpolate(&seed_state, &target, exploration.range / d)
            } else {
                target
            };
            if !self.si.check_motion(&seed_state, &candidate) {
                self.stats.invalid_motions += 1;
                trace!("rejected motion to {:?}", candidate.as_slice());
                continue;
            }

            let satisfied = self.goal.is_satisfied(&candidate);
            let goal_distance = self.goal.distance(&candidate);
            let id = match exploration.add(&mut self.store, Some(seed), candidate) {
                Ok(id) => id,
                Err(e) => {
                    self.lifecycle = Lifecycle::Ready;
                    return Err(e);
                }
            };
            self.stats.motions_added += 1;

            if satisfied {
                exact = Some(id);
                break;
            }
            if tolerance.map_or(false, |t| goal_distance <= t)
                && approximate.map_or(true, |(_, best)| goal_distance < best)
            {
                debug!("approximate solution improved to goal distance {:.4}", goal_distance);
                approximate = Some((id, goal_distance));
            }
        }

        match (exact, approximate) {
            (Some(id), _) => self.finish(PlannerStatus::ExactSolution, Some((id, false))),
            (None, Some((id, _))) => self.finish(PlannerStatus::ApproximateSolution, Some((id, true))),
            (None, None) => self.finish(PlannerStatus::NoSolution, None),
        }
    }

    fn clear(&mut self) {
        self.release_tree();
        if self.default_sampler {
            self.sampler = None;
            self.default_sampler = false;
        }
    }

    fn planner_data(&self) -> PlannerData {
        let mut data = PlannerData::default();
        self.store.for_each(|id, motion| {
            data.vertices.push(motion.state.clone());
            if let Some(parent) = motion.parent {
                data.edges.push((parent.index(), id.index()));
            }
        });
        data.start_vertices = self.store.roots().iter().map(|r| r.index()).collect();
        if let Some(last) = self.solution.as_ref().and_then(|s| s.motions.last()) {
            data.goal_vertices.push(last.index());
        }
        data
    }
}

fn seeded_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}
