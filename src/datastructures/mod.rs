//! Data structures the planner is built on

pub mod greedy_k_centers;
pub mod grid;
pub mod nearest_neighbors;
pub mod pdf;

pub use grid::{Cell, CellCoord, CellId, ExplorationGrid};
pub use nearest_neighbors::{DistanceFn, Gnat, NearestNeighborsConfig};
pub use pdf::{Pdf, PdfElement};
