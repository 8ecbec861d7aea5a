//! gnat_planner - sampling-based motion planning with a GNAT index
//!
//! This crate grows a tree of collision-free motions through a continuous
//! configuration space. Expansion is biased toward sparsely explored cells of
//! a low-dimensional projection, and a geometric near-neighbor access tree
//! keeps nearest-motion queries sub-linear as the tree grows.

// Core modules
pub mod common;
pub mod utils;

// Collaborators and data structures
pub mod base;
pub mod datastructures;

// Algorithm modules
pub mod path_planning;

// Re-export common types for convenience
pub use common::{MotionId, Path, PlannerData, PlannerStatus, Point2D, State};
pub use common::{Goal, Planner, ProjectionEvaluator, StateSpace, StateValidityChecker, ValidStateSampler};
pub use common::{PlannerError, PlannerResult, TerminationCondition};
pub use path_planning::{GnatConfig, GnatPlanner, MotionStore};
