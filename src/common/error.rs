//! Error types for gnat_planner

use thiserror::Error;

use crate::common::types::MotionId;

/// Main error type for the planner and its data structures
///
/// Only misconfiguration is reported as an error to the caller of `solve`.
/// Rejected candidates and running out of time are normal outcomes and are
/// reported through `PlannerStatus` and `PlannerStats` instead.
#[derive(Debug, Error)]
pub enum PlannerError {
    /// The planner cannot be set up (missing projection, sampler, range, ...)
    #[error("Configuration error: {0}")]
    Configuration(String),
    /// A parameter is outside of its domain
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
    /// Removal of an entry the index does not hold
    #[error("Index underflow: entry is not present in the index")]
    IndexUnderflow,
    /// A motion id that the motion store does not own
    #[error("Unknown motion: {0:?}")]
    UnknownMotion(MotionId),
    /// A state or projection with the wrong number of coordinates
    #[error("Dimension mismatch: expected {expected}, found {found}")]
    DimensionMismatch { expected: usize, found: usize },
}

/// Result type alias for planner operations
pub type PlannerResult<T> = Result<T, PlannerError>;
