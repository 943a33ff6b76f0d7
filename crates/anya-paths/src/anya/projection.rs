//! Projection of an interval onto the next row line.
//!
//! Given a node, a projection answers: which points of the adjacent row can
//! be reached through the cells between the two rows, and which of those are
//! seen in a straight line from the node's root.

use anya_core::{EPSILON, Grid, Point, is_integral};

use super::interval::{Node, snap};

/// Result of projecting a node onto an adjacent row.
///
/// `valid` is false when the cells the projection would pass through are
/// blocked. `observable` is true when `[left, right]` is non-empty and every
/// point of it is visible from the node's root. `[max_left, max_right]` is the
/// full extent reachable on `row`, independent of what the root can see.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Projection {
    pub left: f64,
    pub right: f64,
    pub row: i32,
    pub valid: bool,
    pub observable: bool,
    pub max_left: f64,
    pub max_right: f64,
}

impl Projection {
    /// Project `node` one step further from its root.
    ///
    /// Cone nodes move to the next row; flat nodes continue along their own
    /// row.
    pub fn project(node: &Node, grid: &Grid) -> Self {
        if node.is_flat() {
            Self::project_flat(node, grid)
        } else {
            Self::project_cone(node, grid)
        }
    }

    /// Project a cone node through the cell row beyond its interval.
    pub fn project_cone(node: &Node, grid: &Grid) -> Self {
        let iv = node.interval;
        let dir = cone_direction(node);
        let far = far_cell_row(iv.row, dir);
        let (a, b) = interpolate(node);

        let mut p = Self {
            left: a,
            right: b,
            row: iv.row + dir,
            valid: false,
            observable: false,
            max_left: a,
            max_right: b,
        };
        let Some(cell) = entry_cell(node, far, grid) else {
            return p;
        };
        p.valid = true;
        p.max_left = f64::from(grid.scan_cells_left(cell, far) + 1);
        p.max_right = f64::from(grid.scan_cells_right(cell, far));

        let left = a.max(p.max_left);
        let right = b.min(p.max_right);
        if left <= right + EPSILON {
            p.left = snap(left);
            p.right = snap(right.max(left));
            p.observable = true;
        }
        p
    }

    /// Continue a flat node along its row, away from its root.
    pub fn project_flat(node: &Node, grid: &Grid) -> Self {
        let iv = node.interval;
        let (start, end, open) = if heads_right(node) {
            let b = iv.right.round() as i32;
            let open = grid.is_row_segment_open(b, iv.row) && !grid.is_double_corner(b, iv.row);
            (iv.right, grid.scan_right(iv.right, iv.row), open)
        } else {
            let a = iv.left.round() as i32;
            let open = grid.is_row_segment_open(a - 1, iv.row) && !grid.is_double_corner(a, iv.row);
            (iv.left, grid.scan_left(iv.left, iv.row), open)
        };
        let (left, right) = if start <= end { (start, end) } else { (end, start) };
        let valid = open && is_integral(start) && right - left > EPSILON;
        Self {
            left,
            right,
            row: iv.row,
            valid,
            observable: valid,
            max_left: left,
            max_right: right,
        }
    }

    /// Turn a flat node around the corner at its far endpoint onto the row
    /// `dir` (+1 down, -1 up) from its own.
    ///
    /// Valid when the cell row between the two rows is blocked behind the
    /// corner and free beyond it; the result is the free run beyond it.
    pub fn project_f2c(node: &Node, dir: i32, grid: &Grid) -> Self {
        let iv = node.interval;
        let cells = far_cell_row(iv.row, dir);
        let row = iv.row + dir;
        let (left, right, valid) = if heads_right(node) {
            let b = iv.right.round() as i32;
            let valid = is_integral(iv.right)
                && !grid.is_double_corner(b, iv.row)
                && grid.is_traversable(b, cells)
                && !grid.is_traversable(b - 1, cells);
            (f64::from(b), f64::from(grid.scan_cells_right(b, cells)), valid)
        } else {
            let a = iv.left.round() as i32;
            let valid = is_integral(iv.left)
                && !grid.is_double_corner(a, iv.row)
                && grid.is_traversable(a - 1, cells)
                && !grid.is_traversable(a, cells);
            (f64::from(grid.scan_cells_left(a - 1, cells) + 1), f64::from(a), valid)
        };
        Self {
            left,
            right,
            row,
            valid,
            observable: valid,
            max_left: left,
            max_right: right,
        }
    }
}

// ---------------------------------------------------------------------------
// Helpers shared with the expansion policy
// ---------------------------------------------------------------------------

/// +1 when a cone node's interval lies below its root, -1 when above.
#[inline]
pub(crate) fn cone_direction(node: &Node) -> i32 {
    if node.interval.row > node.root.y { 1 } else { -1 }
}

/// Cell row crossed when moving from row line `row` in direction `dir`.
#[inline]
pub(crate) fn far_cell_row(row: i32, dir: i32) -> i32 {
    if dir > 0 { row } else { row - 1 }
}

/// Whether a flat node extends to the right of its root.
#[inline]
pub(crate) fn heads_right(node: &Node) -> bool {
    f64::from(node.root.x) <= node.interval.left + EPSILON
}

/// Endpoints of a cone node's interval carried one row further along the
/// rays from its root. The result may lie outside the map; callers clip it
/// against a run of free cells.
pub(crate) fn interpolate(node: &Node) -> (f64, f64) {
    let iv = node.interval;
    let rx = f64::from(node.root.x);
    let h = f64::from((iv.row - node.root.y).abs());
    let scale = (h + 1.0) / h;
    let a = snap(rx + (iv.left - rx) * scale);
    let b = snap(rx + (iv.right - rx) * scale);
    if a <= b { (a, b) } else { (b, a) }
}

/// A free cell in cell row `far` that rays through the interval enter, or
/// `None` if they are blocked.
fn entry_cell(node: &Node, far: i32, grid: &Grid) -> Option<i32> {
    let iv = node.interval;
    if !iv.is_point() {
        let cell = (0.5 * (iv.left + iv.right)).floor() as i32;
        return grid.is_traversable(cell, far).then_some(cell);
    }
    if !is_integral(iv.left) {
        let cell = iv.left.floor() as i32;
        return grid.is_traversable(cell, far).then_some(cell);
    }

    let x = iv.left.round() as i32;
    if grid.is_double_corner(x, iv.row) {
        return None;
    }
    let root = node.root;
    if x == root.x {
        // Straight along the grid line: either side will do.
        return [x - 1, x]
            .into_iter()
            .find(|&cell| grid.is_traversable(cell, far));
    }
    let cell = if x > root.x { x } else { x - 1 };
    grid.is_traversable(cell, far).then_some(cell)
}

/// The lattice point at `x` on `row`, for endpoints known to be discrete.
#[inline]
pub(crate) fn lattice(x: f64, row: i32) -> Point {
    Point::new(x.round() as i32, row)
}
