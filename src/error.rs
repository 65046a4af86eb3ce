use pyo3::exceptions::{PyRuntimeError, PyValueError};
use pyo3::PyErr;

/// Errors the planning core can report to its caller.
///
/// Per spec.md §7, "no error is recovered internally; all are reported to
/// the caller" — but several of these kinds are reported as a logged
/// warning plus an empty path rather than a raised Rust error, matching
/// the source's `print(...)` + empty-return behavior: `NoPath` (A*
/// exhausted the open set, see `astar.rs`), `StartOrGoalInObstacle` and
/// `SubPathFailure` (both in `dp_planner.rs`), and `DegenerateWorld`
/// (`World::resolution`'s fallback) are all constructed and logged via
/// `log::warn!` at their call sites, not raised as `PyErr`. Only
/// `InvalidObstacle` actually crosses the PyO3 boundary as an exception,
/// since a malformed obstacle means the request itself cannot be
/// interpreted at all.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum PlanError {
    /// A* exhausted the open set before reaching the goal tolerance.
    #[error("no path found between start and goal")]
    NoPath,

    /// The DP planner found the start or goal point inside an obstacle cell.
    #[error("start or goal point lies inside an obstacle")]
    StartOrGoalInObstacle,

    /// Boundary has non-positive width or height; a fallback resolution was
    /// substituted rather than failing the request.
    #[error("boundary has non-positive extent, substituted fallback resolution")]
    DegenerateWorld,

    /// One of the DP planner's three sub-A* calls (start->center,
    /// center->center, center->goal) returned an empty path.
    #[error("a sub-path required for stitching the full route was empty")]
    SubPathFailure,

    /// A Python-side obstacle object could not be interpreted as either a
    /// rectangle or circle obstacle.
    #[error("obstacle must be a RectangleObstacle or CircleObstacle: {0}")]
    InvalidObstacle(String),
}

impl From<PlanError> for PyErr {
    fn from(err: PlanError) -> PyErr {
        match err {
            PlanError::InvalidObstacle(_) => PyValueError::new_err(err.to_string()),
            PlanError::StartOrGoalInObstacle => PyValueError::new_err(err.to_string()),
            PlanError::NoPath | PlanError::SubPathFailure | PlanError::DegenerateWorld => {
                PyRuntimeError::new_err(err.to_string())
            }
        }
    }
}
