use super::types::{Cell, CellSet, GridSize, Position};

/// Quotients within this many ULPs of an integer are treated as that integer,
/// so that `quantize(cell.x * g, cell.y * g, g)` returns `cell` despite float
/// drift. The tolerance is relative, so it never reaches a whole cell.
const SNAP_ULPS: f64 = 4.0;

fn floor_div(value: f64, size: f64) -> i64 {
    let q = value / size;
    let nearest = q.round();
    if (q - nearest).abs() <= SNAP_ULPS * f64::EPSILON * nearest.abs().max(1.0) {
        nearest as i64
    } else {
        q.floor() as i64
    }
}

/// `{ floor(x / g), floor(y / g) }`.
#[inline]
pub fn quantize(x: f64, y: f64, grid: GridSize) -> Cell {
    let size = grid.get();
    Cell::new(floor_div(x, size), floor_div(y, size))
}

#[inline]
pub fn quantize_position(position: &Position, grid: GridSize) -> Cell {
    quantize(position.x, position.y, grid)
}

pub fn quantize_all<'a, I>(positions: I, grid: GridSize) -> CellSet
where
    I: IntoIterator<Item = &'a Position>,
{
    positions
        .into_iter()
        .map(|p| quantize_position(p, grid))
        .collect()
}

/// Coarse ancestor of a fine cell: back to coordinate space, then re-quantized.
/// Exact when `coarse` is an integer multiple of `fine`.
#[inline]
pub fn cell_to_coarse(fine_cell: Cell, fine: GridSize, coarse: GridSize) -> Cell {
    let size = fine.get();
    quantize(fine_cell.x as f64 * size, fine_cell.y as f64 * size, coarse)
}

/// Positions whose cell at `grid` is one of `cells`, in input order.
pub fn match_positions<'a>(
    cells: &CellSet,
    positions: &'a [Position],
    grid: GridSize,
) -> Vec<&'a Position> {
    positions
        .iter()
        .filter(|p| cells.contains(&quantize_position(p, grid)))
        .collect()
}
