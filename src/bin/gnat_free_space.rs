// GNAT planner in an open 10 x 10 square with one wall.
// Run with RUST_LOG=debug to see the planner and index logs.

use std::rc::Rc;
use std::time::Duration;

use log::{error, info};

use gnat_planner::base::{GoalBall, RealVectorStateSpace, SpaceInformation};
use gnat_planner::common::{any_of, IterationTermination, TimedTermination};
use gnat_planner::utils::plot_planner_result;
use gnat_planner::{GnatConfig, GnatPlanner, Planner, PlannerResult, Point2D, State};

/// Wall x in [4, 6] for y < 7
fn is_valid(state: &State) -> bool {
    !(state[0] >= 4.0 && state[0] <= 6.0 && state[1] < 7.0)
}

fn run() -> PlannerResult<()> {
    let space = RealVectorStateSpace::new(vec![(0.0, 10.0), (0.0, 10.0)])?;
    let si = SpaceInformation::new(Rc::new(space), Rc::new(is_valid));
    let goal = GoalBall::new(State::from_vec(vec![10.0, 10.0]), 0.5)?;
    let config = GnatConfig {
        goal_bias: 0.1,
        range: Some(1.0),
        seed: Some(42),
        ..Default::default()
    };

    let mut planner = GnatPlanner::new(si, vec![State::from_vec(vec![0.0, 0.0])], Box::new(goal), config)?;
    planner.setup()?;

    let mut ptc = any_of(vec![
        Box::new(IterationTermination::new(5000)),
        Box::new(TimedTermination::new(Duration::from_secs(5))),
    ]);
    let status = planner.solve(&mut ptc)?;
    let stats = planner.stats();
    info!(
        "{:?} after {} iterations, {} motions ({} rejected)",
        status,
        stats.iterations,
        planner.motions().len(),
        stats.invalid_motions
    );

    let path = planner.solution().map(|s| s.path.clone());
    if let Some(path) = &path {
        info!(
            "path with {} states, length {:.3}",
            path.len(),
            path.length(planner.space_information().space().as_ref())
        );
    }

    let mut vis = plot_planner_result(
        &planner.planner_data(),
        path.as_ref(),
        Some((Point2D::new(10.0, 10.0), 0.5)),
        "GNAT",
    );
    vis.plot_box(Point2D::new(4.0, 0.0), Point2D::new(6.0, 7.0));
    vis.set_x_range(-0.5, 10.5).set_y_range(-0.5, 10.5);
    if let Err(e) = vis.show() {
        error!("plot failed: {}", e);
    }
    Ok(())
}

fn main() {
    env_logger::init();
    if let Err(e) = run() {
        error!("{}", e);
        std::process::exit(1);
    }
}
