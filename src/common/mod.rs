//! Common types, traits, and error definitions for gnat_planner
//!
//! This module provides the vocabulary shared by the data structures,
//! the reference collaborators and the planner.

pub mod types;
pub mod traits;
pub mod error;
pub mod termination;

pub use types::*;
pub use traits::*;
pub use error::*;
pub use termination::*;
