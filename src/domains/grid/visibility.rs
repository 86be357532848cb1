use super::quantize::{quantize, quantize_position};
use super::types::{CellSet, GridSize, Position};

/// Largest visibility radius, in fine cells, a configuration may ask for.
/// Sampling costs `(2 * radius / grid + 1)^2` points per watcher per round.
pub const MAX_RADIUS_CELLS: f64 = 64.0;

/// Cells a watcher can see at `grid` resolution.
///
/// Samples the bounding square `[watcher ± radius]` on a step of one grid
/// size, keeps samples within `radius` (Euclidean) and quantizes them.
/// The watcher's own cell is always part of the result, including when
/// `radius` is smaller than a cell and no sample lands inside it.
pub fn visible_cells(watcher: &Position, radius: f64, grid: GridSize) -> CellSet {
    let mut cells = CellSet::new();
    cells.insert(quantize_position(watcher, grid));

    let radius = radius.max(0.0);
    let step = grid.get();
    let steps = ((2.0 * radius) / step + 1e-9).floor() as i64;
    let (min_x, min_y) = (watcher.x - radius, watcher.y - radius);

    for i in 0..=steps {
        let x = min_x + i as f64 * step;
        for j in 0..=steps {
            let y = min_y + j as f64 * step;
            let (dx, dy) = (x - watcher.x, y - watcher.y);
            if dx.hypot(dy) <= radius {
                cells.insert(quantize(x, y, grid));
            }
        }
    }

    cells
}

/// Union of [`visible_cells`] over every watcher.
pub fn visible_cells_for_all(watchers: &[Position], radius: f64, grid: GridSize) -> CellSet {
    watchers
        .iter()
        .flat_map(|w| visible_cells(w, radius, grid))
        .collect()
}
