use std::collections::HashMap;

use numpy::PyReadonlyArray2;

use crate::geometry::Point;

/// A single monotone cell produced by the sweep, in raster (pixel)
/// coordinates. `center` is translated into the metric frame by the
/// caller once decomposition finishes (see `dp_planner.rs`).
#[derive(Clone, Debug)]
pub struct Cell {
    pub min_x: i64,
    pub max_x: i64,
    pub left: Vec<i64>,
    pub right: Vec<i64>,
    pub ceiling: HashMap<i64, i64>,
    pub floor: HashMap<i64, i64>,
    pub center: Point,
}

/// Result of the Boustrophedon sweep: a row-major raster of cell ids
/// (`0` = obstacle/outside, `1..=cell_count` = a cell), plus the per-cell
/// records. `cells[0]` is always `None` — ids are 1-indexed, matching the
/// "no cell with id 0" convention of the source decomposition.
#[derive(Clone, Debug)]
pub struct Decomposition {
    pub grid: Vec<Vec<i64>>,
    pub cell_count: usize,
    pub cells: Vec<Option<Cell>>,
}

impl Decomposition {
    pub fn height(&self) -> usize {
        self.grid.len()
    }

    pub fn width(&self) -> usize {
        self.grid.first().map_or(0, |row| row.len())
    }
}

/// A maximal run `[start, end)` of free pixels within one column.
type ConnectivePart = (i64, i64);

fn calculate_connectivity(column: &[u8]) -> Vec<ConnectivePart> {
    let mut parts = Vec::new();
    let mut start: Option<i64> = None;

    for (i, &v) in column.iter().enumerate() {
        if v == 0 {
            if let Some(s) = start.take() {
                parts.push((s, i as i64));
            }
        } else if start.is_none() {
            start = Some(i as i64);
        }
    }
    if let Some(s) = start {
        parts.push((s, column.len() as i64));
    }
    parts
}

/// `adjacency[i][j]` is true iff `prev_parts[i]` and `curr_parts[j]`'s
/// y-intervals overlap with positive measure.
fn get_adjacency_matrix(prev_parts: &[ConnectivePart], curr_parts: &[ConnectivePart]) -> Vec<Vec<bool>> {
    prev_parts
        .iter()
        .map(|&(ps, pe)| {
            curr_parts
                .iter()
                .map(|&(cs, ce)| pe.min(ce) - ps.max(cs) > 0)
                .collect()
        })
        .collect()
}

/// Runs the Boustrophedon vertical sweep over a binary raster
/// (`free_grid[y][x] != 0` means free space) and builds the per-cell
/// records.
///
/// A column-by-column scan tracks connective parts, propagates ids across
/// columns by continuation (single-parent match), OUT-split (one parent,
/// many children), IN-merge (many parents, one child), or a fresh id (no
/// parent / new run), then paints the result into `grid` and gathers
/// per-id `Cell`s.
pub fn decompose(free_grid: &[Vec<u8>]) -> Decomposition {
    let height = free_grid.len();
    let width = free_grid.first().map_or(0, |row| row.len());

    let mut grid = vec![vec![0i64; width]; height];
    let mut total_cells: i64 = 0;

    let mut last_parts: Vec<ConnectivePart> = Vec::new();
    let mut last_ids: Vec<i64> = Vec::new();

    for x in 0..width {
        let column: Vec<u8> = (0..height).map(|y| free_grid[y][x]).collect();
        let curr_parts = calculate_connectivity(&column);

        let curr_ids: Vec<i64> = if last_parts.is_empty() {
            curr_parts
                .iter()
                .map(|_| {
                    total_cells += 1;
                    total_cells
                })
                .collect()
        } else if curr_parts.is_empty() {
            Vec::new()
        } else {
            let adjacency = get_adjacency_matrix(&last_parts, &curr_parts);
            let mut ids = vec![0i64; curr_parts.len()];

            for (i, row) in adjacency.iter().enumerate() {
                let matches: Vec<usize> = row
                    .iter()
                    .enumerate()
                    .filter_map(|(j, &adj)| adj.then_some(j))
                    .collect();
                if matches.len() == 1 {
                    ids[matches[0]] = last_ids[i];
                } else if matches.len() > 1 {
                    // OUT-split: parent connects to several children.
                    for &j in &matches {
                        total_cells += 1;
                        ids[j] = total_cells;
                    }
                }
            }

            for j in 0..curr_parts.len() {
                let parents = adjacency.iter().filter(|row| row[j]).count();
                if parents > 1 {
                    // IN-merge: several parents converge on one child.
                    total_cells += 1;
                    ids[j] = total_cells;
                } else if parents == 0 {
                    total_cells += 1;
                    ids[j] = total_cells;
                }
            }

            ids
        };

        for (&id, &(start, end)) in curr_ids.iter().zip(curr_parts.iter()) {
            for y in start..end {
                grid[y as usize][x] = id;
            }
        }

        last_parts = curr_parts;
        last_ids = curr_ids;
    }

    let cell_count = total_cells as usize;
    let cells = build_cells(&grid, cell_count, height, width);

    Decomposition {
        grid,
        cell_count,
        cells,
    }
}

fn build_cells(grid: &[Vec<i64>], cell_count: usize, height: usize, width: usize) -> Vec<Option<Cell>> {
    let mut cells: Vec<Option<Cell>> = vec![None; cell_count + 1];

    for id in 1..=cell_count as i64 {
        let mut xs: Vec<i64> = Vec::new();
        let mut ys: Vec<i64> = Vec::new();
        for y in 0..height {
            for x in 0..width {
                if grid[y][x] == id {
                    xs.push(x as i64);
                    ys.push(y as i64);
                }
            }
        }

        if xs.is_empty() {
            continue;
        }

        let min_x = *xs.iter().min().unwrap();
        let max_x = *xs.iter().max().unwrap();
        let mut left = Vec::new();
        let mut right = Vec::new();
        let mut ceiling: HashMap<i64, i64> = HashMap::new();
        let mut floor: HashMap<i64, i64> = HashMap::new();

        for (&x, &y) in xs.iter().zip(ys.iter()) {
            if x == min_x {
                left.push(y);
            }
            if x == max_x {
                right.push(y);
            }
            ceiling
                .entry(x)
                .and_modify(|c| *c = (*c).max(y))
                .or_insert(y);
            floor.entry(x).and_modify(|f| *f = (*f).min(y)).or_insert(y);
        }

        let x_center = (min_x + max_x) / 2;
        let center = match (ceiling.get(&x_center), floor.get(&x_center)) {
            (Some(&c), Some(&f)) => Point::new(x_center as f64, ((c + f) / 2) as f64),
            _ => {
                let mean_x = xs.iter().sum::<i64>() as f64 / xs.len() as f64;
                let mean_y = ys.iter().sum::<i64>() as f64 / ys.len() as f64;
                Point::new(mean_x, mean_y)
            }
        };

        cells[id as usize] = Some(Cell {
            min_x,
            max_x,
            left,
            right,
            ceiling,
            floor,
            center,
        });
    }

    cells
}

/// Converts a numpy `uint8` array (as handed across the PyO3 boundary by
/// the host) into the row-major `Vec<Vec<u8>>` the sweep expects.
pub fn free_grid_from_numpy(array: PyReadonlyArray2<u8>) -> Vec<Vec<u8>> {
    let view = array.as_array();
    let (h, w) = (view.shape()[0], view.shape()[1]);
    (0..h)
        .map(|y| (0..w).map(|x| view[[y, x]]).collect())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connectivity_single_run() {
        let column = [0u8, 1, 1, 1, 0, 0];
        let parts = calculate_connectivity(&column);
        assert_eq!(parts, vec![(1, 4)]);
    }

    #[test]
    fn test_connectivity_multiple_runs() {
        let column = [1u8, 1, 0, 1, 1, 0, 1];
        let parts = calculate_connectivity(&column);
        assert_eq!(parts, vec![(0, 2), (3, 5), (6, 7)]);
    }

    #[test]
    fn test_adjacency_matrix_overlap() {
        let prev = vec![(0i64, 5i64)];
        let curr = vec![(2i64, 4i64), (6i64, 8i64)];
        let adjacency = get_adjacency_matrix(&prev, &curr);
        assert_eq!(adjacency, vec![vec![true, false]]);
    }

    /// A single vertical obstacle bar splits free space into two
    /// never-reconnecting regions: exactly 2 cells, both with defined
    /// centers.
    #[test]
    fn test_decompose_vertical_bar_splits_into_two_cells() {
        let height = 10usize;
        let width = 10usize;
        let bar_x = 5usize;

        let free_grid: Vec<Vec<u8>> = (0..height)
            .map(|_| {
                (0..width)
                    .map(|x| if x == bar_x { 0 } else { 1 })
                    .collect()
            })
            .collect();

        let decomposition = decompose(&free_grid);
        assert_eq!(decomposition.cell_count, 2);

        for id in 1..=decomposition.cell_count {
            let cell = decomposition.cells[id].as_ref().unwrap();
            assert!(cell.center.x.is_finite());
            assert!(cell.center.y.is_finite());
        }

        // Left region and right region carry distinct ids throughout.
        let left_id = decomposition.grid[0][0];
        let right_id = decomposition.grid[0][width - 1];
        assert_ne!(left_id, right_id);
        assert_eq!(decomposition.grid[0][bar_x], 0);
    }

    #[test]
    fn test_decompose_fully_free_grid_is_one_cell() {
        let free_grid = vec![vec![1u8; 6]; 6];
        let decomposition = decompose(&free_grid);
        assert_eq!(decomposition.cell_count, 1);
        assert!(decomposition.cells[1].is_some());
    }

    #[test]
    fn test_decompose_zero_id_marks_obstacle_or_outside() {
        let mut free_grid = vec![vec![1u8; 6]; 6];
        free_grid[2][3] = 0;
        let decomposition = decompose(&free_grid);
        assert_eq!(decomposition.grid[2][3], 0);
        for y in 0..6 {
            for x in 0..6 {
                if !(y == 2 && x == 3) {
                    assert_ne!(decomposition.grid[y][x], 0);
                }
            }
        }
    }
}
