use pyo3::prelude::*;
use pyo3::types::PyList;

use crate::error::PlanError;
use crate::geometry::{do_intersect, point_in_polygon, Point};

/// Axis-aligned rectangular world boundary.
///
/// Invariant: `min_x < max_x` and `min_y < max_y` for a well-formed
/// request. A boundary with non-positive width or height is tolerated
/// (see [`World::resolution`]) rather than rejected.
#[pyclass]
#[derive(Clone, Debug, PartialEq)]
pub struct Boundary {
    #[pyo3(get, set)]
    pub min_x: f64,
    #[pyo3(get, set)]
    pub min_y: f64,
    #[pyo3(get, set)]
    pub max_x: f64,
    #[pyo3(get, set)]
    pub max_y: f64,
}

#[pymethods]
impl Boundary {
    #[new]
    pub fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Boundary {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    pub fn bottom_left(&self) -> (f64, f64) {
        (self.min_x, self.min_y)
    }

    pub fn top_right(&self) -> (f64, f64) {
        (self.max_x, self.max_y)
    }

    pub fn contains(&self, p: &Point) -> bool {
        self.min_x <= p.x && p.x <= self.max_x && self.min_y <= p.y && p.y <= self.max_y
    }
}

/// A rectangular obstacle described by 4 vertices in traversal order.
#[pyclass]
#[derive(Clone, Debug, PartialEq)]
pub struct RectangleObstacle {
    #[pyo3(get, set)]
    pub points: Vec<Point>,
}

#[pymethods]
impl RectangleObstacle {
    #[new]
    pub fn new(points: Vec<Point>) -> PyResult<Self> {
        if points.len() != 4 {
            return Err(
                PlanError::InvalidObstacle("rectangle must have exactly 4 points".into()).into(),
            );
        }
        Ok(RectangleObstacle { points })
    }
}

/// A circular obstacle.
#[pyclass]
#[derive(Clone, Debug, PartialEq)]
pub struct CircleObstacle {
    #[pyo3(get, set)]
    pub center: Point,
    #[pyo3(get, set)]
    pub radius: f64,
}

#[pymethods]
impl CircleObstacle {
    #[new]
    pub fn new(center: Point, radius: f64) -> PyResult<Self> {
        if !(radius > 0.0) {
            return Err(PlanError::InvalidObstacle("circle radius must be > 0".into()).into());
        }
        Ok(CircleObstacle { center, radius })
    }
}

/// Tagged obstacle variant consumed by [`World`]. Not exposed to Python
/// directly (PyO3 0.20 doesn't support data-carrying `#[pyclass]` enum
/// variants) — Python constructs a `RectangleObstacle` or `CircleObstacle`
/// and the `lib.rs` wrapper functions sort incoming list elements into
/// this enum.
#[derive(Clone, Debug, PartialEq)]
pub enum Obstacle {
    Rectangle(RectangleObstacle),
    Circle(CircleObstacle),
}

impl Obstacle {
    /// Axis-aligned bounding box, used by [`World::verify_node`] for
    /// rectangles (a conservative over-approximation of the polygon) and by
    /// the decomposition's rasterizer.
    pub(crate) fn rectangle_bbox(points: &[Point]) -> (f64, f64, f64, f64) {
        let min_x = points.iter().map(|p| p.x).fold(f64::INFINITY, f64::min);
        let max_x = points
            .iter()
            .map(|p| p.x)
            .fold(f64::NEG_INFINITY, f64::max);
        let min_y = points.iter().map(|p| p.y).fold(f64::INFINITY, f64::min);
        let max_y = points
            .iter()
            .map(|p| p.y)
            .fold(f64::NEG_INFINITY, f64::max);
        (min_x, max_x, min_y, max_y)
    }
}

/// Sorts a heterogeneous Python list of obstacles into the internal
/// `Obstacle` enum. Each element must already be a `RectangleObstacle` or
/// `CircleObstacle` instance; PyO3 0.20 has no data-carrying `#[pyclass]`
/// enum to receive them as a single type directly.
pub fn extract_obstacles(obstacles: &PyList) -> PyResult<Vec<Obstacle>> {
    obstacles
        .iter()
        .map(|item| {
            if let Ok(rect) = item.extract::<RectangleObstacle>() {
                Ok(Obstacle::Rectangle(rect))
            } else if let Ok(circle) = item.extract::<CircleObstacle>() {
                Ok(Obstacle::Circle(circle))
            } else {
                let repr = item.str().map(|s| s.to_string()).unwrap_or_default();
                Err(PlanError::InvalidObstacle(repr).into())
            }
        })
        .collect()
}

/// Immutable description of the boundary and obstacles for one planning
/// request. Resolution, safety margin, and grid indexing are all derived
/// from the boundary.
#[derive(Clone, Debug)]
pub struct World {
    pub boundary: Boundary,
    pub obstacles: Vec<Obstacle>,
}

impl World {
    pub fn new(boundary: Boundary, obstacles: Vec<Obstacle>) -> Self {
        World { boundary, obstacles }
    }

    /// Grid spacing, safety-margin basis, and goal-termination radius:
    /// `0.02 * min(width, height)`, falling back to 100 when the boundary
    /// is degenerate (non-positive width or height).
    pub fn resolution(&self) -> f64 {
        let width = self.boundary.width();
        let height = self.boundary.height();
        let min_side = width.min(height);
        if min_side > 0.0 {
            min_side * 0.02
        } else {
            log::warn!(
                "{} (width={width}, height={height}); substituting fallback resolution of 100.0 * 0.02",
                PlanError::DegenerateWorld
            );
            100.0 * 0.02
        }
    }

    pub fn safety_margin(&self) -> f64 {
        self.resolution() * 0.5
    }

    pub fn x_width(&self) -> i64 {
        (self.boundary.width() / self.resolution()).round() as i64
    }

    /// Integer grid key `iy * x_width + ix` for a continuous-coordinate
    /// point. Two points sharing a key are the same grid cell.
    pub fn grid_index(&self, p: &Point) -> i64 {
        let res = self.resolution();
        let ix = ((p.x - self.boundary.min_x) / res).round() as i64;
        let iy = ((p.y - self.boundary.min_y) / res).round() as i64;
        iy * self.x_width() + ix
    }

    /// True iff `p` lies within the boundary and is not within the safety
    /// margin of any obstacle.
    pub fn verify_node(&self, p: &Point) -> bool {
        if !self.boundary.contains(p) {
            return false;
        }

        let margin = self.safety_margin();
        for obs in &self.obstacles {
            match obs {
                Obstacle::Rectangle(rect) => {
                    let (min_x, max_x, min_y, max_y) = Obstacle::rectangle_bbox(&rect.points);
                    if (min_x - margin) <= p.x
                        && p.x <= (max_x + margin)
                        && (min_y - margin) <= p.y
                        && p.y <= (max_y + margin)
                    {
                        return false;
                    }
                }
                Obstacle::Circle(circle) => {
                    let r = circle.radius + margin;
                    if (p.x - circle.center.x).powi(2) + (p.y - circle.center.y).powi(2) <= r * r {
                        return false;
                    }
                }
            }
        }
        true
    }

    /// True iff segment `a`-`b` does not penetrate any obstacle.
    ///
    /// Degenerate case (`a == b`): reduces to "is `a` inside any rectangle
    /// (unexpanded — this asymmetry with `verify_node`'s expanded bbox is
    /// intentional) or inside any circle inflated by the safety margin?"
    pub fn is_collision_free(&self, a: &Point, b: &Point) -> bool {
        let is_point_check = a == b;
        let margin = self.safety_margin();

        for obs in &self.obstacles {
            match obs {
                Obstacle::Rectangle(rect) => {
                    let pts = &rect.points;
                    if is_point_check {
                        if point_in_polygon(a, pts) {
                            return false;
                        }
                    } else {
                        for i in 0..4 {
                            let p2 = &pts[i];
                            let q2 = &pts[(i + 1) % 4];
                            if do_intersect(a, b, p2, q2) {
                                return false;
                            }
                        }
                        if point_in_polygon(a, pts) && point_in_polygon(b, pts) {
                            return false;
                        }
                    }
                }
                Obstacle::Circle(circle) => {
                    let r = circle.radius + margin;
                    let r2 = r * r;
                    let in_circle = |p: &Point| {
                        (p.x - circle.center.x).powi(2) + (p.y - circle.center.y).powi(2) <= r2
                    };
                    if in_circle(a) || in_circle(b) {
                        return false;
                    }
                    if !is_point_check {
                        let dx = b.x - a.x;
                        let dy = b.y - a.y;
                        let fx = a.x - circle.center.x;
                        let fy = a.y - circle.center.y;
                        let qa = dx * dx + dy * dy;
                        let qb = 2.0 * (fx * dx + fy * dy);
                        let qc = fx * fx + fy * fy - r2;

                        let discriminant = qb * qb - 4.0 * qa * qc;
                        if discriminant >= 0.0 {
                            let sq = discriminant.sqrt();
                            let t1 = if qa != 0.0 {
                                (-qb - sq) / (2.0 * qa)
                            } else {
                                -1.0
                            };
                            let t2 = if qa != 0.0 {
                                (-qb + sq) / (2.0 * qa)
                            } else {
                                -1.0
                            };
                            if (0.0..=1.0).contains(&t1) || (0.0..=1.0).contains(&t2) {
                                return false;
                            }
                        }
                    }
                }
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square_boundary() -> Boundary {
        Boundary::new(0.0, 0.0, 100.0, 100.0)
    }

    #[test]
    fn test_resolution_and_margin() {
        let world = World::new(square_boundary(), vec![]);
        assert!((world.resolution() - 2.0).abs() < 1e-10);
        assert!((world.safety_margin() - 1.0).abs() < 1e-10);
    }

    #[test]
    fn test_degenerate_boundary_falls_back() {
        let boundary = Boundary::new(0.0, 0.0, 0.0, 50.0);
        let world = World::new(boundary, vec![]);
        assert!((world.resolution() - 2.0).abs() < 1e-10);
    }

    #[test]
    fn test_verify_node_boundary_and_circle() {
        let circle = CircleObstacle::new(Point::new(50.0, 50.0), 10.0).unwrap();
        let world = World::new(square_boundary(), vec![Obstacle::Circle(circle)]);

        assert!(world.verify_node(&Point::new(10.0, 10.0)));
        assert!(!world.verify_node(&Point::new(150.0, 50.0)));
        assert!(!world.verify_node(&Point::new(50.0, 50.0)));
        // Just inside the inflated radius (10 + margin 1.0 = 11).
        assert!(!world.verify_node(&Point::new(50.0, 39.5)));
    }

    #[test]
    fn test_verify_node_rectangle_uses_expanded_bbox() {
        let rect = RectangleObstacle::new(vec![
            Point::new(40.0, 40.0),
            Point::new(60.0, 40.0),
            Point::new(60.0, 60.0),
            Point::new(40.0, 60.0),
        ])
        .unwrap();
        let world = World::new(square_boundary(), vec![Obstacle::Rectangle(rect)]);

        assert!(!world.verify_node(&Point::new(50.0, 50.0)));
        // Within margin (1.0) of the bbox edge, outside the raw rectangle.
        assert!(!world.verify_node(&Point::new(39.5, 50.0)));
        assert!(world.verify_node(&Point::new(10.0, 10.0)));
    }

    #[test]
    fn test_is_collision_free_segment_crossing_rectangle() {
        let rect = RectangleObstacle::new(vec![
            Point::new(40.0, 0.0),
            Point::new(60.0, 0.0),
            Point::new(60.0, 60.0),
            Point::new(40.0, 60.0),
        ])
        .unwrap();
        let world = World::new(square_boundary(), vec![Obstacle::Rectangle(rect)]);

        let a = Point::new(10.0, 30.0);
        let b = Point::new(90.0, 30.0);
        assert!(!world.is_collision_free(&a, &b));

        let clear_a = Point::new(10.0, 80.0);
        let clear_b = Point::new(90.0, 80.0);
        assert!(world.is_collision_free(&clear_a, &clear_b));
    }

    #[test]
    fn test_is_collision_free_segment_vs_circle() {
        let circle = CircleObstacle::new(Point::new(50.0, 50.0), 10.0).unwrap();
        let world = World::new(square_boundary(), vec![Obstacle::Circle(circle)]);

        let a = Point::new(10.0, 50.0);
        let b = Point::new(90.0, 50.0);
        assert!(!world.is_collision_free(&a, &b));

        let clear_a = Point::new(10.0, 90.0);
        let clear_b = Point::new(90.0, 90.0);
        assert!(world.is_collision_free(&clear_a, &clear_b));
    }

    #[test]
    fn test_is_collision_free_degenerate_point_rectangle_unexpanded() {
        let rect = RectangleObstacle::new(vec![
            Point::new(40.0, 40.0),
            Point::new(60.0, 40.0),
            Point::new(60.0, 60.0),
            Point::new(40.0, 60.0),
        ])
        .unwrap();
        let world = World::new(square_boundary(), vec![Obstacle::Rectangle(rect)]);

        // Just outside the unexpanded rectangle but inside the expanded
        // bbox `verify_node` would use: collision-free treats it as free
        // (the documented asymmetry).
        let just_outside = Point::new(39.5, 50.0);
        assert!(world.is_collision_free(&just_outside, &just_outside));
        assert!(!world.verify_node(&just_outside));
    }
}
