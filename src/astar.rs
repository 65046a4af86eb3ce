use std::collections::HashMap;

use pyo3::prelude::*;

use crate::geometry::Point;
use crate::world::World;

/// Integer key identifying a grid cell; see `World::grid_index`.
pub type GridIndex = i64;

/// One node in the A* search tree. Coordinates stay continuous (not
/// snapped to a regular lattice) — only `World::grid_index` derives a
/// discrete key from them, for identity/dedup purposes.
#[derive(Clone, Debug)]
struct SearchNode {
    x: f64,
    y: f64,
    cost: f64,
    parent_index: GridIndex,
}

impl SearchNode {
    fn as_point(&self) -> Point {
        Point::new(self.x, self.y)
    }
}

/// The 8 motion primitives (dx, dy, cost): 4 axis-aligned at cost 1, 4
/// diagonal at cost sqrt(2). Each step advances by `resolution` along the
/// vector.
const MOTION_MODEL: [(f64, f64, f64); 8] = [
    (1.0, 0.0, 1.0),
    (0.0, 1.0, 1.0),
    (-1.0, 0.0, 1.0),
    (0.0, -1.0, 1.0),
    (-1.0, -1.0, std::f64::consts::SQRT_2),
    (-1.0, 1.0, std::f64::consts::SQRT_2),
    (1.0, -1.0, std::f64::consts::SQRT_2),
    (1.0, 1.0, std::f64::consts::SQRT_2),
];

/// `(path, pruned_path)` — both ordered start-to-goal, or both empty on
/// failure.
#[pyclass]
#[derive(Clone, Debug, Default)]
pub struct PlanResult {
    #[pyo3(get)]
    pub path: Vec<Point>,
    #[pyo3(get)]
    pub pruned_path: Vec<Point>,
}

impl PlanResult {
    fn empty() -> Self {
        PlanResult {
            path: vec![],
            pruned_path: vec![],
        }
    }

    pub fn is_empty(&self) -> bool {
        self.path.is_empty()
    }
}

/// Best-first grid search with continuous-coordinate motion primitives,
/// plus the line-of-sight path pruner. One instance is local to a single
/// `plan` call — it borrows the `World` it searches over.
pub struct AStarPlanner<'a> {
    world: &'a World,
}

impl<'a> AStarPlanner<'a> {
    pub fn new(world: &'a World) -> Self {
        AStarPlanner { world }
    }

    fn heuristic(a: &Point, b: &Point) -> f64 {
        a.distance_to(b)
    }

    /// Runs the search and returns `(raw path, pruned path)`. Returns a
    /// pair of empty paths if the open set empties before reaching the
    /// goal tolerance.
    pub fn plan(&self, start: &Point, goal: &Point) -> PlanResult {
        let resolution = self.world.resolution();

        let start_node = SearchNode {
            x: start.x,
            y: start.y,
            cost: 0.0,
            parent_index: -1,
        };
        let mut goal_node = SearchNode {
            x: goal.x,
            y: goal.y,
            cost: 0.0,
            parent_index: -1,
        };

        let mut open_set: HashMap<GridIndex, SearchNode> = HashMap::new();
        let mut closed_set: HashMap<GridIndex, SearchNode> = HashMap::new();

        open_set.insert(self.world.grid_index(start), start_node);

        loop {
            let Some((&c_id, _)) = open_set.iter().min_by(|(_, a), (_, b)| {
                let fa = a.cost + Self::heuristic(&a.as_point(), goal);
                let fb = b.cost + Self::heuristic(&b.as_point(), goal);
                fa.partial_cmp(&fb).unwrap_or(std::cmp::Ordering::Equal)
            }) else {
                log::warn!("{}", crate::error::PlanError::NoPath);
                return PlanResult::empty();
            };

            let current = open_set.remove(&c_id).unwrap();
            let dist_to_goal = Self::heuristic(&current.as_point(), goal);

            if dist_to_goal <= resolution {
                log::debug!("goal reached within tolerance {resolution}");
                goal_node.parent_index = c_id;
                goal_node.cost = current.cost;
                closed_set.insert(c_id, current);
                break;
            }

            closed_set.insert(c_id, current);
            let current = &closed_set[&c_id];

            for &(dx, dy, step_cost) in MOTION_MODEL.iter() {
                let node = SearchNode {
                    x: current.x + dx * resolution,
                    y: current.y + dy * resolution,
                    cost: current.cost + step_cost * resolution,
                    parent_index: c_id,
                };
                let n_id = self.world.grid_index(&node.as_point());

                if !self.world.verify_node(&node.as_point()) {
                    continue;
                }
                if closed_set.contains_key(&n_id) {
                    continue;
                }
                match open_set.get(&n_id) {
                    Some(existing) if existing.cost <= node.cost => {}
                    _ => {
                        open_set.insert(n_id, node);
                    }
                }
            }
        }

        let path = Self::reconstruct_path(&goal_node, &closed_set);
        let pruned_path = self.prune_path(&path);
        PlanResult { path, pruned_path }
    }

    fn reconstruct_path(goal_node: &SearchNode, closed_set: &HashMap<GridIndex, SearchNode>) -> Vec<Point> {
        let mut path = vec![goal_node.as_point()];
        let mut parent_index = goal_node.parent_index;
        while parent_index != -1 {
            let n = &closed_set[&parent_index];
            path.push(n.as_point());
            parent_index = n.parent_index;
        }
        path.reverse();
        path
    }

    /// Greedy longest-visible-shortcut smoother: from `path[i]`, scan
    /// backward from the far end for the farthest point reachable by a
    /// collision-free segment whose every strictly-interior source point
    /// still satisfies `verify_node`.
    pub fn prune_path(&self, path: &[Point]) -> Vec<Point> {
        if path.len() < 3 {
            return path.to_vec();
        }

        let mut pruned = vec![path[0].clone()];
        let mut i = 0usize;

        while i < path.len() - 1 {
            let mut best_next = i + 1;

            for j in (i + 1..path.len()).rev() {
                if self.world.is_collision_free(&path[i], &path[j]) {
                    let all_interior_safe =
                        (i + 1..j).all(|k| self.world.verify_node(&path[k]));
                    if all_interior_safe {
                        best_next = j;
                        break;
                    }
                }
            }

            pruned.push(path[best_next].clone());
            i = best_next;
        }

        pruned
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::{Boundary, CircleObstacle, Obstacle, RectangleObstacle};

    fn open_world() -> World {
        World::new(Boundary::new(0.0, 0.0, 100.0, 100.0), vec![])
    }

    #[test]
    fn test_plan_no_obstacles_straight_line() {
        let world = open_world();
        let planner = AStarPlanner::new(&world);
        let start = Point::new(10.0, 10.0);
        let goal = Point::new(90.0, 90.0);

        let result = planner.plan(&start, &goal);
        assert!(!result.is_empty());
        assert_eq!(result.pruned_path.len(), 2);
        assert_eq!(result.pruned_path[0], start);
        let resolution = world.resolution();
        assert!((result.pruned_path[1].distance_to(&goal)) <= resolution);
    }

    #[test]
    fn test_plan_start_equals_goal() {
        let world = open_world();
        let planner = AStarPlanner::new(&world);
        let p = Point::new(50.0, 50.0);

        let result = planner.plan(&p, &p);
        assert!(!result.is_empty());
        assert_eq!(result.path[0], p);
    }

    #[test]
    fn test_plan_routes_around_circle() {
        let circle = CircleObstacle::new(Point::new(50.0, 50.0), 10.0).unwrap();
        let world = World::new(
            Boundary::new(0.0, 0.0, 100.0, 100.0),
            vec![Obstacle::Circle(circle)],
        );
        let planner = AStarPlanner::new(&world);

        let start = Point::new(10.0, 50.0);
        let goal = Point::new(90.0, 50.0);
        let result = planner.plan(&start, &goal);

        assert!(!result.is_empty());
        assert!(result.pruned_path.len() >= 3);

        let margin = world.safety_margin();
        let danger = 10.0 + margin;
        for w in result.pruned_path.windows(2) {
            let closest = closest_distance_on_segment(&w[0], &w[1], &Point::new(50.0, 50.0));
            assert!(closest >= danger - 1e-6);
        }
    }

    #[test]
    fn test_plan_start_inside_obstacle_fails() {
        let rect = RectangleObstacle::new(vec![
            Point::new(0.0, 0.0),
            Point::new(20.0, 0.0),
            Point::new(20.0, 20.0),
            Point::new(0.0, 20.0),
        ])
        .unwrap();
        let world = World::new(
            Boundary::new(0.0, 0.0, 100.0, 100.0),
            vec![Obstacle::Rectangle(rect)],
        );
        let planner = AStarPlanner::new(&world);

        let start = Point::new(10.0, 10.0);
        let goal = Point::new(90.0, 90.0);
        let result = planner.plan(&start, &goal);
        assert!(result.is_empty());
    }

    #[test]
    fn test_prune_path_degenerate_cases() {
        let world = open_world();
        let planner = AStarPlanner::new(&world);

        let empty: Vec<Point> = vec![];
        assert_eq!(planner.prune_path(&empty), empty);

        let two = vec![Point::new(0.0, 0.0), Point::new(1.0, 1.0)];
        assert_eq!(planner.prune_path(&two), two);
    }

    #[test]
    fn test_prune_path_idempotent() {
        let world = open_world();
        let planner = AStarPlanner::new(&world);
        let start = Point::new(10.0, 10.0);
        let goal = Point::new(90.0, 20.0);

        let result = planner.plan(&start, &goal);
        let twice_pruned = planner.prune_path(&result.pruned_path);
        assert_eq!(twice_pruned, result.pruned_path);
    }

    fn closest_distance_on_segment(a: &Point, b: &Point, c: &Point) -> f64 {
        let dx = b.x - a.x;
        let dy = b.y - a.y;
        let len2 = dx * dx + dy * dy;
        if len2 == 0.0 {
            return a.distance_to(c);
        }
        let t = (((c.x - a.x) * dx + (c.y - a.y) * dy) / len2).clamp(0.0, 1.0);
        let proj = Point::new(a.x + t * dx, a.y + t * dy);
        proj.distance_to(c)
    }
}
