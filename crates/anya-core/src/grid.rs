//! Bit-packed obstacle grid.
//!
//! Traversability is stored one bit per cell, row-major, with a one-cell
//! blocked border on every side so that neighbour scans never need explicit
//! bounds checks. Cell `(x, y)` is the unit square whose top-left corner is
//! the lattice point `(x, y)`. Row line `y` separates cell row `y - 1`
//! (above) from cell row `y` (below).

use crate::geom::{Point, Range};

/// Tolerance used when deciding whether a real coordinate lies on a lattice
/// line.
pub const EPSILON: f64 = 1e-7;

const WORD_BITS: usize = u64::BITS as usize;

/// Whether `x` is within [`EPSILON`] of an integer.
#[inline]
pub fn is_integral(x: f64) -> bool {
    (x - x.round()).abs() < EPSILON
}

/// An immutable obstacle map.
#[derive(Clone, Debug)]
pub struct Grid {
    width: i32,
    height: i32,
    padded_width: usize,
    padded_height: usize,
    words_per_row: usize,
    bits: Vec<u64>,
}

impl Grid {
    /// Build a `width` x `height` grid, asking `traversable` about every cell.
    pub fn from_fn(width: i32, height: i32, mut traversable: impl FnMut(Point) -> bool) -> Self {
        let width = width.max(0);
        let height = height.max(0);
        let padded_width = width as usize + 2;
        let padded_height = height as usize + 2;
        let words_per_row = padded_width.div_ceil(WORD_BITS);
        let mut grid = Self {
            width,
            height,
            padded_width,
            padded_height,
            words_per_row,
            bits: vec![0; words_per_row * padded_height],
        };
        for p in grid.bounds() {
            if !traversable(p) {
                continue;
            }
            if let Some((word, mask)) = grid.locate(p.x, p.y) {
                grid.bits[word] |= mask;
            }
        }
        grid
    }

    /// Width in cells.
    #[inline]
    pub fn width(&self) -> i32 {
        self.width
    }

    /// Height in cells.
    #[inline]
    pub fn height(&self) -> i32 {
        self.height
    }

    /// The range of cell coordinates covered by the map (border excluded).
    #[inline]
    pub fn bounds(&self) -> Range {
        Range::new(0, 0, self.width, self.height)
    }

    /// Number of lattice points, `(width + 1) * (height + 1)`.
    #[inline]
    pub fn num_points(&self) -> usize {
        (self.width as usize + 1) * (self.height as usize + 1)
    }

    /// Word index and bit mask for cell `(x, y)` in padded storage.
    #[inline]
    fn locate(&self, x: i32, y: i32) -> Option<(usize, u64)> {
        let px = i64::from(x) + 1;
        let py = i64::from(y) + 1;
        if px < 0 || py < 0 || px >= self.padded_width as i64 || py >= self.padded_height as i64 {
            return None;
        }
        let (px, py) = (px as usize, py as usize);
        Some((
            py * self.words_per_row + px / WORD_BITS,
            1u64 << (px % WORD_BITS),
        ))
    }

    /// Whether cell `(x, y)` is free. Anything outside the map is blocked.
    #[inline]
    pub fn is_traversable(&self, x: i32, y: i32) -> bool {
        self.locate(x, y)
            .is_some_and(|(word, mask)| self.bits[word] & mask != 0)
    }

    /// Whether the row segment from `(x, y)` to `(x + 1, y)` borders at least
    /// one free cell.
    #[inline]
    pub fn is_row_segment_open(&self, x: i32, y: i32) -> bool {
        self.is_traversable(x, y - 1) || self.is_traversable(x, y)
    }

    /// Whether the two diagonal cell pairs around point `(x, y)` disagree:
    /// one pair free, the other blocked. No path may cross such a point
    /// diagonally.
    pub fn is_double_corner(&self, x: i32, y: i32) -> bool {
        let nw = self.is_traversable(x - 1, y - 1);
        let ne = self.is_traversable(x, y - 1);
        let sw = self.is_traversable(x - 1, y);
        let se = self.is_traversable(x, y);
        (nw && se && !ne && !sw) || (ne && sw && !nw && !se)
    }

    /// Whether point `(x, y)` is a corner: traversability changes across the
    /// point in the cell row above it or in the cell row below it.
    pub fn is_corner(&self, x: i32, y: i32) -> bool {
        self.is_traversable(x - 1, y - 1) != self.is_traversable(x, y - 1)
            || self.is_traversable(x - 1, y) != self.is_traversable(x, y)
    }

    // -----------------------------------------------------------------------
    // Row scans
    // -----------------------------------------------------------------------

    /// Scan right along row `y` from `x`, returning the first point where the
    /// row is closed or a corner is reached.
    ///
    /// A start already on such a boundary is returned unchanged, except that
    /// a corner with open ground beyond it does not stop its own scan.
    pub fn scan_right(&self, x: f64, y: i32) -> f64 {
        let mut p = if is_integral(x) {
            let p = x.round() as i32;
            if !self.is_row_segment_open(p, y) {
                return p as f64;
            }
            p + 1
        } else {
            let cell = x.floor() as i32;
            if !self.is_row_segment_open(cell, y) {
                return x;
            }
            cell + 1
        };
        while !self.is_corner(p, y) && self.is_row_segment_open(p, y) {
            p += 1;
        }
        p as f64
    }

    /// Mirror image of [`scan_right`](Self::scan_right).
    pub fn scan_left(&self, x: f64, y: i32) -> f64 {
        let mut p = if is_integral(x) {
            let p = x.round() as i32;
            if !self.is_row_segment_open(p - 1, y) {
                return p as f64;
            }
            p - 1
        } else {
            let cell = x.floor() as i32;
            if !self.is_row_segment_open(cell, y) {
                return x;
            }
            cell
        };
        while !self.is_corner(p, y) && self.is_row_segment_open(p - 1, y) {
            p -= 1;
        }
        p as f64
    }

    /// X of the first blocked cell at or right of `(x, y)`.
    pub fn scan_cells_right(&self, x: i32, y: i32) -> i32 {
        let Some((mut word, mask)) = self.locate(x, y) else {
            return x;
        };
        let first = (word / self.words_per_row) * self.words_per_row;
        let end = first + self.words_per_row;
        let mut blocked = !self.bits[word] & !(mask - 1);
        loop {
            if blocked != 0 {
                let px = (word - first) * WORD_BITS + blocked.trailing_zeros() as usize;
                return px as i32 - 1;
            }
            word += 1;
            if word == end {
                return self.width;
            }
            blocked = !self.bits[word];
        }
    }

    /// X of the first blocked cell at or left of `(x, y)`.
    pub fn scan_cells_left(&self, x: i32, y: i32) -> i32 {
        let Some((mut word, mask)) = self.locate(x, y) else {
            return x;
        };
        let first = (word / self.words_per_row) * self.words_per_row;
        let mut blocked = !self.bits[word] & (mask | (mask - 1));
        loop {
            if blocked != 0 {
                let px = (word - first) * WORD_BITS + (63 - blocked.leading_zeros()) as usize;
                return px as i32 - 1;
            }
            if word == first {
                return -1;
            }
            word -= 1;
            blocked = !self.bits[word];
        }
    }

    // -----------------------------------------------------------------------
    // Visibility
    // -----------------------------------------------------------------------

    /// Whether the straight segment from `(x0, y0)` to `(x1, y1)` is
    /// unobstructed.
    ///
    /// The segment may touch obstacles and run along a grid line that borders
    /// at least one free cell. It may not enter a blocked cell, and a double
    /// corner may only be one of its endpoints.
    pub fn line_of_sight(&self, x0: f64, y0: f64, x1: f64, y1: f64) -> bool {
        let dx = x1 - x0;
        let dy = y1 - y0;
        let mut ts = vec![0.0, 1.0];
        if dx.abs() > EPSILON {
            let (lo, hi) = (x0.min(x1).ceil() as i32, x0.max(x1).floor() as i32);
            ts.extend((lo..=hi).map(|k| (f64::from(k) - x0) / dx));
        }
        if dy.abs() > EPSILON {
            let (lo, hi) = (y0.min(y1).ceil() as i32, y0.max(y1).floor() as i32);
            ts.extend((lo..=hi).map(|k| (f64::from(k) - y0) / dy));
        }
        ts.retain(|t| (0.0..=1.0).contains(t));
        ts.sort_by(f64::total_cmp);
        ts.dedup_by(|a, b| (*a - *b).abs() < 1e-12);

        for pair in ts.windows(2) {
            let (t0, t1) = (pair[0], pair[1]);
            let tm = 0.5 * (t0 + t1);
            let (mx, my) = (x0 + dx * tm, y0 + dy * tm);
            let clear = if is_integral(mx) {
                let (cx, cy) = (mx.round() as i32, my.floor() as i32);
                self.is_traversable(cx - 1, cy) || self.is_traversable(cx, cy)
            } else if is_integral(my) {
                let (cx, cy) = (mx.floor() as i32, my.round() as i32);
                self.is_traversable(cx, cy - 1) || self.is_traversable(cx, cy)
            } else {
                self.is_traversable(mx.floor() as i32, my.floor() as i32)
            };
            if !clear {
                return false;
            }
        }

        for &t in &ts[1..ts.len() - 1] {
            let (px, py) = (x0 + dx * t, y0 + dy * t);
            if is_integral(px)
                && is_integral(py)
                && self.is_double_corner(px.round() as i32, py.round() as i32)
            {
                return false;
            }
        }
        true
    }
}
