//! Visualization utilities for gnat_planner
//!
//! Plots the first two coordinates of a planner's tree, its solution path and
//! the goal region with gnuplot.

use gnuplot::{AutoOption, AxesCommon, Caption, Color, Figure, LineWidth, PointSize, PointSymbol};

use crate::common::{Path, PlannerData, Point2D};

/// Color palette for consistent styling
pub mod colors {
    pub const BLACK: &str = "#000000";
    pub const RED: &str = "#FF0000";
    pub const GREEN: &str = "#00FF00";
    pub const BLUE: &str = "#0000FF";
    pub const GRAY: &str = "#808080";
    pub const LIGHT_GRAY: &str = "#C0C0C0";

    // Semantic colors
    pub const OBSTACLE: &str = BLACK;
    pub const START: &str = GREEN;
    pub const GOAL: &str = BLUE;
    pub const PATH: &str = RED;
    pub const TREE: &str = LIGHT_GRAY;
    pub const VERTEX: &str = GRAY;
}

/// Segments in the polygon approximating a goal disk
const CIRCLE_SEGMENTS: usize = 48;

/// Style for path rendering
#[derive(Debug, Clone)]
pub struct PathStyle {
    pub color: String,
    pub line_width: f64,
    pub caption: String,
}

impl PathStyle {
    pub fn new(color: &str, caption: &str) -> Self {
        Self {
            color: color.to_string(),
            line_width: 2.0,
            caption: caption.to_string(),
        }
    }

    pub fn with_line_width(mut self, width: f64) -> Self {
        self.line_width = width;
        self
    }
}

impl Default for PathStyle {
    fn default() -> Self {
        Self {
            color: colors::PATH.to_string(),
            line_width: 2.0,
            caption: "Path".to_string(),
        }
    }
}

/// Style for point rendering
#[derive(Debug, Clone)]
pub struct PointStyle {
    pub color: String,
    pub size: f64,
    pub symbol: char,
    pub caption: String,
}

impl PointStyle {
    pub fn new(color: &str, caption: &str) -> Self {
        Self {
            color: color.to_string(),
            size: 1.0,
            symbol: 'O',
            caption: caption.to_string(),
        }
    }

    pub fn with_size(mut self, size: f64) -> Self {
        self.size = size;
        self
    }

    pub fn with_symbol(mut self, symbol: char) -> Self {
        self.symbol = symbol;
        self
    }
}

/// Main visualizer struct
pub struct Visualizer {
    figure: Figure,
    title: String,
    x_label: String,
    y_label: String,
    x_range: Option<(f64, f64)>,
    y_range: Option<(f64, f64)>,
    aspect_ratio: Option<f64>,
}

impl Visualizer {
    /// Create a visualizer with a fixed 1:1 aspect ratio
    pub fn new() -> Self {
        Self {
            figure: Figure::new(),
            title: String::new(),
            x_label: "q0".to_string(),
            y_label: "q1".to_string(),
            x_range: None,
            y_range: None,
            aspect_ratio: Some(1.0),
        }
    }

    /// Set the plot title
    pub fn set_title(&mut self, title: &str) -> &mut Self {
        self.title = title.to_string();
        self
    }

    /// Set the label of the first state coordinate
    pub fn set_x_label(&mut self, label: &str) -> &mut Self {
        self.x_label = label.to_string();
        self
    }

    /// Set the label of the second state coordinate
    pub fn set_y_label(&mut self, label: &str) -> &mut Self {
        self.y_label = label.to_string();
        self
    }

    /// Set X axis range
    pub fn set_x_range(&mut self, min: f64, max: f64) -> &mut Self {
        self.x_range = Some((min, max));
        self
    }

    /// Set Y axis range
    pub fn set_y_range(&mut self, min: f64, max: f64) -> &mut Self {
        self.y_range = Some((min, max));
        self
    }

    /// Set aspect ratio (None for auto)
    pub fn set_aspect_ratio(&mut self, ratio: Option<f64>) -> &mut Self {
        self.aspect_ratio = ratio;
        self
    }

    /// Draw every parent-child edge of an exported tree
    pub fn plot_tree(&mut self, data: &PlannerData) -> &mut Self {
        let (x, y) = segments_xy(&data.edge_segments());
        self.figure.axes2d().lines(
            &x,
            &y,
            &[Caption("Tree"), Color(colors::TREE), LineWidth(1.0)],
        );

        let vertices: Vec<Point2D> = data.vertices.iter().map(Point2D::from_state).collect();
        self.plot_points(
            &vertices,
            &PointStyle::new(colors::VERTEX, "").with_symbol('.').with_size(0.5),
        )
    }

    /// Plot a solution path
    pub fn plot_path(&mut self, path: &Path, style: &PathStyle) -> &mut Self {
        let points = path.to_points();
        let x: Vec<f64> = points.iter().map(|p| p.x).collect();
        let y: Vec<f64> = points.iter().map(|p| p.y).collect();

        self.figure.axes2d().lines(
            &x,
            &y,
            &[
                Caption(&style.caption),
                Color(&style.color),
                LineWidth(style.line_width),
            ],
        );
        self
    }

    /// Outline of a disk, e.g. a `GoalBall`
    pub fn plot_disk(&mut self, center: Point2D, radius: f64, style: &PathStyle) -> &mut Self {
        let (x, y) = circle_xy(center, radius);
        self.figure.axes2d().lines(
            &x,
            &y,
            &[
                Caption(&style.caption),
                Color(&style.color),
                LineWidth(style.line_width),
            ],
        );
        self
    }

    /// Outline of an axis-aligned box, e.g. an invalid region
    pub fn plot_box(&mut self, min: Point2D, max: Point2D) -> &mut Self {
        let x = [min.x, max.x, max.x, min.x, min.x];
        let y = [min.y, min.y, max.y, max.y, min.y];
        self.figure.axes2d().lines(
            &x,
            &y,
            &[Caption("Obstacle"), Color(colors::OBSTACLE), LineWidth(2.0)],
        );
        self
    }

    /// Plot a single point
    pub fn plot_point(&mut self, point: Point2D, style: &PointStyle) -> &mut Self {
        self.plot_points(&[point], style)
    }

    /// Plot multiple points
    pub fn plot_points(&mut self, points: &[Point2D], style: &PointStyle) -> &mut Self {
        let x: Vec<f64> = points.iter().map(|p| p.x).collect();
        let y: Vec<f64> = points.iter().map(|p| p.y).collect();

        self.figure.axes2d().points(
            &x,
            &y,
            &[
                Caption(&style.caption),
                Color(&style.color),
                PointSymbol(style.symbol),
                PointSize(style.size),
            ],
        );
        self
    }

    /// Plot a start state
    pub fn plot_start(&mut self, point: Point2D) -> &mut Self {
        self.plot_point(point, &PointStyle::new(colors::START, "Start").with_size(1.5))
    }

    /// Plot a goal state
    pub fn plot_goal(&mut self, point: Point2D) -> &mut Self {
        self.plot_point(point, &PointStyle::new(colors::GOAL, "Goal").with_size(1.5))
    }

    /// Finalize and show the plot
    pub fn show(&mut self) -> Result<(), String> {
        self.apply_settings();
        self.figure.show().map_err(|e| e.to_string()).map(|_| ())
    }

    /// Save plot to PNG file
    pub fn save_png(&mut self, path: &str, width: u32, height: u32) -> Result<(), String> {
        self.apply_settings();
        self.figure.save_to_png(path, width, height).map_err(|e| e.to_string())
    }

    /// Save plot to SVG file
    pub fn save_svg(&mut self, path: &str) -> Result<(), String> {
        self.apply_settings();
        self.figure.save_to_svg(path, 800, 600).map_err(|e| e.to_string())
    }

    fn apply_settings(&mut self) {
        let axes = self.figure.axes2d();

        if !self.title.is_empty() {
            axes.set_title(&self.title, &[]);
        }
        axes.set_x_label(&self.x_label, &[]);
        axes.set_y_label(&self.y_label, &[]);

        if let Some((min, max)) = self.x_range {
            axes.set_x_range(AutoOption::Fix(min), AutoOption::Fix(max));
        }
        if let Some((min, max)) = self.y_range {
            axes.set_y_range(AutoOption::Fix(min), AutoOption::Fix(max));
        }
        if let Some(ratio) = self.aspect_ratio {
            axes.set_aspect_ratio(AutoOption::Fix(ratio));
        }
    }
}

impl Default for Visualizer {
    fn default() -> Self {
        Self::new()
    }
}

/// Flatten segments into one polyline, NaN-separated so gnuplot breaks the
/// line between them
fn segments_xy(segments: &[(Point2D, Point2D)]) -> (Vec<f64>, Vec<f64>) {
    let mut x = Vec::with_capacity(segments.len() * 3);
    let mut y = Vec::with_capacity(segments.len() * 3);
    for (a, b) in segments {
        x.extend_from_slice(&[a.x, b.x, f64::NAN]);
        y.extend_from_slice(&[a.y, b.y, f64::NAN]);
    }
    (x, y)
}

fn circle_xy(center: Point2D, radius: f64) -> (Vec<f64>, Vec<f64>) {
    (0..=CIRCLE_SEGMENTS)
        .map(|i| {
            let t = 2.0 * std::f64::consts::PI * i as f64 / CIRCLE_SEGMENTS as f64;
            (center.x + radius * t.cos(), center.y + radius * t.sin())
        })
        .unzip()
}

/// Tree, solution path, start and goal disk in one figure
pub fn plot_planner_result(
    data: &PlannerData,
    path: Option<&Path>,
    goal: Option<(Point2D, f64)>,
    title: &str,
) -> Visualizer {
    let mut vis = Visualizer::new();
    vis.set_title(title);
    vis.plot_tree(data);

    if let Some(path) = path {
        vis.plot_path(path, &PathStyle::default());
    }
    let starts: Vec<Point2D> = data
        .start_vertices
        .iter()
        .filter_map(|&i| data.vertices.get(i))
        .map(Point2D::from_state)
        .collect();
    for start in starts {
        vis.plot_start(start);
    }
    if let Some((center, radius)) = goal {
        vis.plot_disk(center, radius, &PathStyle::new(colors::GOAL, "Goal region"));
    }
    vis
}
