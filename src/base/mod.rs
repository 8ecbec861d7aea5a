//! Reference collaborators: spaces, validity checking, samplers and goals

pub mod goal;
pub mod real_vector;
pub mod space_information;

pub use goal::{GoalBall, GoalState};
pub use real_vector::{RealVectorProjection, RealVectorStateSpace};
pub use space_information::{SpaceInformation, UniformValidStateSampler};
