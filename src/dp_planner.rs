use std::cell::RefCell;

use pyo3::prelude::*;
use pyo3::types::PyList;

use crate::astar::{AStarPlanner, PlanResult};
use crate::decomposition::{self, Decomposition};
use crate::error::PlanError;
use crate::geometry::Point;
use crate::world::{extract_obstacles, Boundary, Obstacle, World};

/// K×K matrix of memoized center-to-center paths, sentinel `None` meaning
/// "not yet computed". Indexed by 0-based cell index (`cell_id - 1`).
type MemoTable = Vec<Vec<Option<Vec<Point>>>>;

/// Draws filled rectangle obstacles into an HxW image, in black on white,
/// then inverts — so free space ends up `1`, obstacles `0`. Circles never
/// participate: decomposition only sees polygonal obstacles.
fn rasterize(obstacles: &[Obstacle], min_x: f64, min_y: f64, width: usize, height: usize) -> Vec<Vec<u8>> {
    let mut painted = vec![vec![0u8; width]; height];

    for obs in obstacles {
        if let Obstacle::Rectangle(rect) = obs {
            let (bx0, bx1, by0, by1) = Obstacle::rectangle_bbox(&rect.points);
            let x0 = ((bx0 - min_x).floor() as i64).max(0);
            let y0 = ((by0 - min_y).floor() as i64).max(0);
            let x1 = (((bx1 - min_x).ceil() as i64).max(0) as usize).min(width);
            let y1 = (((by1 - min_y).ceil() as i64).max(0) as usize).min(height);
            for y in (y0 as usize)..y1 {
                for x in (x0 as usize)..x1 {
                    painted[y][x] = 1;
                }
            }
        }
    }

    for row in painted.iter_mut() {
        for v in row.iter_mut() {
            *v = 1 - *v;
        }
    }
    painted
}

/// Clamps a metric coordinate into a raster pixel index.
fn clamp_pixel(value: f64, origin: f64, len: usize) -> usize {
    let raw = (value - origin) as i64;
    raw.clamp(0, len as i64 - 1) as usize
}

/// Boustrophedon decomposition plus a memoizing center-to-center planner.
///
/// Built once per planning session: decomposition is a one-shot setup step,
/// the memo table then grows monotonically across calls to `plan`. Not
/// `Sync` — a single instance is meant to be scoped to one caller; share
/// it across concurrent queries only behind an external lock.
pub struct DpPlanner {
    world: World,
    decomposition: Decomposition,
    origin_x: f64,
    origin_y: f64,
    memo: MemoTable,
}

impl DpPlanner {
    pub fn new(world: World) -> Self {
        let min_x = world.boundary.min_x;
        let min_y = world.boundary.min_y;
        let width = (world.boundary.width().ceil() as i64).max(1) as usize;
        let height = (world.boundary.height().ceil() as i64).max(1) as usize;

        let free_grid = rasterize(&world.obstacles, min_x, min_y, width, height);
        let mut decomposition = decomposition::decompose(&free_grid);

        for cell in decomposition.cells.iter_mut().flatten() {
            cell.center = Point::new(cell.center.x + min_x, cell.center.y + min_y);
        }

        let k = decomposition.cell_count;
        let memo = vec![vec![None; k]; k];

        DpPlanner {
            world,
            decomposition,
            origin_x: min_x,
            origin_y: min_y,
            memo,
        }
    }

    pub fn cell_count(&self) -> usize {
        self.decomposition.cell_count
    }

    fn cell_id_at(&self, p: &Point) -> i64 {
        let height = self.decomposition.height();
        let width = self.decomposition.width();
        let px = clamp_pixel(p.x, self.origin_x, width);
        let py = clamp_pixel(p.y, self.origin_y, height);
        self.decomposition.grid[py][px]
    }

    /// Plans start -> goal, routing through cell centers and the memo
    /// table when start and goal fall in different cells. Returns an empty
    /// `PlanResult` if start/goal lies in an obstacle cell, or if any
    /// sub-`A*` call along the way fails.
    pub fn plan(&mut self, start: &Point, goal: &Point) -> PlanResult {
        let start_cell = self.cell_id_at(start);
        let goal_cell = self.cell_id_at(goal);

        if start_cell == 0 || goal_cell == 0 {
            log::warn!("{}", PlanError::StartOrGoalInObstacle);
            return PlanResult::default();
        }

        let planner = AStarPlanner::new(&self.world);

        if start_cell == goal_cell {
            return planner.plan(start, goal);
        }

        let start_idx = (start_cell - 1) as usize;
        let goal_idx = (goal_cell - 1) as usize;

        let start_center = match &self.decomposition.cells[start_cell as usize] {
            Some(cell) => cell.center.clone(),
            None => {
                log::warn!("{}", PlanError::SubPathFailure);
                return PlanResult::default();
            }
        };
        let goal_center = match &self.decomposition.cells[goal_cell as usize] {
            Some(cell) => cell.center.clone(),
            None => {
                log::warn!("{}", PlanError::SubPathFailure);
                return PlanResult::default();
            }
        };

        let path_between_centers = if let Some(cached) = &self.memo[start_idx][goal_idx] {
            log::debug!("center-to-center path found in memo");
            cached.clone()
        } else {
            log::debug!("center-to-center path not in memo, running A*");
            let result = planner.plan(&start_center, &goal_center);
            if result.is_empty() {
                log::warn!("{}", PlanError::SubPathFailure);
                return PlanResult::default();
            }
            let mut reversed = result.path.clone();
            reversed.reverse();
            self.memo[start_idx][goal_idx] = Some(result.path.clone());
            self.memo[goal_idx][start_idx] = Some(reversed);
            result.path
        };

        let start_segment = planner.plan(start, &path_between_centers[0]);
        if start_segment.is_empty() {
            log::warn!("{}", PlanError::SubPathFailure);
            return PlanResult::default();
        }
        let goal_segment = planner.plan(path_between_centers.last().unwrap(), goal);
        if goal_segment.is_empty() {
            log::warn!("{}", PlanError::SubPathFailure);
            return PlanResult::default();
        }

        let mut full_path = start_segment.path[..start_segment.path.len() - 1].to_vec();
        full_path.extend(path_between_centers.iter().cloned());
        full_path.extend(goal_segment.path[1..].iter().cloned());

        let pruned_path = planner.prune_path(&full_path);

        PlanResult {
            path: full_path,
            pruned_path,
        }
    }
}

/// `RefCell`-backed Python wrapper: `#[pymethods]` only ever hand out
/// `&self`, but `plan` needs to mutate the memo table on a cache miss.
#[pyclass]
pub struct PyDpPlanner {
    inner: RefCell<DpPlanner>,
}

#[pymethods]
impl PyDpPlanner {
    #[new]
    pub fn new(boundary: Boundary, obstacles: &PyList) -> PyResult<Self> {
        let obstacles = extract_obstacles(obstacles)?;
        Ok(PyDpPlanner {
            inner: RefCell::new(DpPlanner::new(World::new(boundary, obstacles))),
        })
    }

    pub fn plan(&self, start: Point, goal: Point) -> PlanResult {
        self.inner.borrow_mut().plan(&start, &goal)
    }

    pub fn cell_count(&self) -> usize {
        self.inner.borrow().cell_count()
    }
}
