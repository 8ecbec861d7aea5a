//! Utility modules for gnat_planner

pub mod visualization;

pub use visualization::{plot_planner_result, Visualizer, PathStyle, PointStyle, colors};
