use pyo3::prelude::*;

/// A point in the metric (continuous, real-valued) plane.
///
/// This is the core coordinate type throughout the crate: grid nodes,
/// obstacle vertices, and planned-path waypoints are all `Point`s.
#[pyclass]
#[derive(Clone, Debug, PartialEq)]
pub struct Point {
    #[pyo3(get, set)]
    pub x: f64,
    #[pyo3(get, set)]
    pub y: f64,
}

#[pymethods]
impl Point {
    #[new]
    pub fn new(x: f64, y: f64) -> Self {
        Point { x, y }
    }

    pub fn distance_to(&self, other: &Point) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }

    pub fn angle_to(&self, other: &Point) -> f64 {
        (other.y - self.y).atan2(other.x - self.x)
    }

    pub fn normalize(&self) -> Point {
        let mag = (self.x * self.x + self.y * self.y).sqrt();
        if mag == 0.0 {
            Point { x: 0.0, y: 0.0 }
        } else {
            Point {
                x: self.x / mag,
                y: self.y / mag,
            }
        }
    }

    pub fn magnitude(&self) -> f64 {
        (self.x * self.x + self.y * self.y).sqrt()
    }

    pub fn __add__(&self, other: &Point) -> Point {
        Point::new(self.x + other.x, self.y + other.y)
    }

    pub fn __sub__(&self, other: &Point) -> Point {
        Point::new(self.x - other.x, self.y - other.y)
    }

    pub fn __mul__(&self, scalar: f64) -> Point {
        Point::new(self.x * scalar, self.y * scalar)
    }

    pub fn __repr__(&self) -> String {
        format!("Point({:.3}, {:.3})", self.x, self.y)
    }
}

/// Result of comparing the turn made by three points.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    Collinear,
    Clockwise,
    CounterClockwise,
}

/// Sign of `(q.y-p.y)(r.x-q.x) - (q.x-p.x)(r.y-q.y)`.
pub fn orientation(p: &Point, q: &Point, r: &Point) -> Orientation {
    let val = (q.y - p.y) * (r.x - q.x) - (q.x - p.x) * (r.y - q.y);
    if val > 0.0 {
        Orientation::Clockwise
    } else if val < 0.0 {
        Orientation::CounterClockwise
    } else {
        Orientation::Collinear
    }
}

/// Assuming `p` is collinear with `q` and `r`, is `p` within the
/// axis-aligned bounding box of segment `q`-`r`?
pub fn on_segment(p: &Point, q: &Point, r: &Point) -> bool {
    p.x <= q.x.max(r.x) && p.x >= q.x.min(r.x) && p.y <= q.y.max(r.y) && p.y >= q.y.min(r.y)
}

/// Do segments `p1`-`q1` and `p2`-`q2` intersect?
///
/// General case uses the four orientation tests; collinear special cases
/// fall back to bounding-box membership. A shared endpoint counts as an
/// intersection, since the orientations around it trivially differ.
pub fn do_intersect(p1: &Point, q1: &Point, p2: &Point, q2: &Point) -> bool {
    let o1 = orientation(p1, q1, p2);
    let o2 = orientation(p1, q1, q2);
    let o3 = orientation(p2, q2, p1);
    let o4 = orientation(p2, q2, q1);

    if o1 != o2 && o3 != o4 {
        return true;
    }

    if o1 == Orientation::Collinear && on_segment(p2, p1, q1) {
        return true;
    }
    if o2 == Orientation::Collinear && on_segment(q2, p1, q1) {
        return true;
    }
    if o3 == Orientation::Collinear && on_segment(p1, p2, q2) {
        return true;
    }
    if o4 == Orientation::Collinear && on_segment(q1, p2, q2) {
        return true;
    }

    false
}

/// Ray-casting point-in-polygon test.
///
/// Toggles inclusion for every edge whose y-range strictly brackets `p.y`
/// on the low end and non-strictly on the high end, so a point exactly on
/// the polygon boundary is accepted as inside.
pub fn point_in_polygon(p: &Point, poly: &[Point]) -> bool {
    let n = poly.len();
    if n == 0 {
        return false;
    }

    let mut inside = false;
    let (mut p1x, mut p1y) = (poly[0].x, poly[0].y);
    for i in 0..=n {
        let (p2x, p2y) = {
            let v = &poly[i % n];
            (v.x, v.y)
        };
        if p.y > p1y.min(p2y) && p.y <= p1y.max(p2y) && p.x <= p1x.max(p2x) {
            if p1y != p2y {
                let xinters = (p.y - p1y) * (p2x - p1x) / (p2y - p1y) + p1x;
                if p1x == p2x || p.x <= xinters {
                    inside = !inside;
                }
            } else {
                inside = !inside;
            }
        }
        p1x = p2x;
        p1y = p2y;
    }
    inside
}
