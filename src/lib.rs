use numpy::PyReadonlyArray2;
use pyo3::prelude::*;
use pyo3::types::PyList;

mod astar;
mod decomposition;
mod dp_planner;
mod error;
mod geometry;
mod world;

use astar::{AStarPlanner, PlanResult};
use dp_planner::PyDpPlanner;
use geometry::Point;
use world::{extract_obstacles, Boundary, CircleObstacle, RectangleObstacle, World};

/// Plans start -> goal with a single A* search over the given world,
/// returning the raw and line-of-sight-pruned paths.
#[pyfunction]
fn plan_astar(
    start: Point,
    goal: Point,
    boundary: Boundary,
    obstacles: &PyList,
) -> PyResult<PlanResult> {
    let world = World::new(boundary, extract_obstacles(obstacles)?);
    let planner = AStarPlanner::new(&world);
    Ok(planner.plan(&start, &goal))
}

/// Runs the Boustrophedon decomposition directly on a caller-supplied
/// binary raster (1 = free, 0 = obstacle), returning the cell-id raster
/// and the total cell count. Lets a host rasterize obstacles however it
/// likes (e.g. including non-rectangular shapes) and still reuse the
/// decomposition sweep without going through `PyDpPlanner`'s own
/// rectangle-only rasterizer.
#[pyfunction]
fn decompose_raster(grid: PyReadonlyArray2<u8>) -> (Vec<Vec<i64>>, usize) {
    let free_grid = decomposition::free_grid_from_numpy(grid);
    let result = decomposition::decompose(&free_grid);
    (result.grid, result.cell_count)
}

/// Python module exports.
#[pymodule]
fn planner_core(_py: Python, m: &PyModule) -> PyResult<()> {
    pyo3_log::init();

    m.add_class::<Point>()?;
    m.add_class::<Boundary>()?;
    m.add_class::<RectangleObstacle>()?;
    m.add_class::<CircleObstacle>()?;
    m.add_class::<PlanResult>()?;
    m.add_class::<PyDpPlanner>()?;

    m.add_function(wrap_pyfunction!(plan_astar, m)?)?;
    m.add_function(wrap_pyfunction!(decompose_raster, m)?)?;

    Ok(())
}
