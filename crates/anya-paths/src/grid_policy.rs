use std::f64::consts::SQRT_2;

use anya_core::{Grid, Point};

use crate::distance::OctileHeuristic;
use crate::traits::ExpansionPolicy;

/// 8-connected expansion over the lattice points of a [`Grid`].
///
/// Diagonal steps cross a free cell; straight steps run along a grid line
/// bordered by at least one free cell. A double corner is a dead end unless
/// it is the start, which may only leave through its own cell.
pub struct GridExpansion<'g> {
    grid: &'g Grid,
    heuristic: OctileHeuristic,
    start: Point,
    succ: Vec<(Point, f64)>,
    cursor: usize,
    cost: f64,
}

impl<'g> GridExpansion<'g> {
    /// Create a policy over `grid`.
    pub fn new(grid: &'g Grid) -> Self {
        Self {
            grid,
            heuristic: OctileHeuristic,
            start: Point::ZERO,
            succ: Vec::with_capacity(8),
            cursor: 0,
            cost: 0.0,
        }
    }

    /// The grid being searched.
    #[inline]
    pub fn grid(&self) -> &'g Grid {
        self.grid
    }
}

impl ExpansionPolicy for GridExpansion<'_> {
    type Vertex = Point;
    type Heuristic = OctileHeuristic;

    fn validate_instance(&mut self, start: &Point, target: &Point) -> bool {
        self.start = *start;
        self.grid.is_traversable(start.x, start.y) && self.grid.is_traversable(target.x, target.y)
    }

    fn expand(&mut self, v: &Point) {
        self.succ.clear();
        self.cursor = 0;

        let (x, y) = (v.x, v.y);
        let nw = self.grid.is_traversable(x - 1, y - 1);
        let ne = self.grid.is_traversable(x, y - 1);
        let sw = self.grid.is_traversable(x - 1, y);
        let se = self.grid.is_traversable(x, y);

        if self.grid.is_double_corner(x, y) {
            if *v == self.start {
                if se {
                    self.succ.push((v.shift(1, 1), SQRT_2));
                }
                if ne || se {
                    self.succ.push((v.shift(1, 0), 1.0));
                }
                if se || sw {
                    self.succ.push((v.shift(0, 1), 1.0));
                }
            }
            return;
        }

        let diagonals = [(ne, 1, -1), (se, 1, 1), (nw, -1, -1), (sw, -1, 1)];
        for (free, dx, dy) in diagonals {
            if free {
                self.succ.push((v.shift(dx, dy), SQRT_2));
            }
        }
        let cardinals = [(ne || se, 1, 0), (nw || sw, -1, 0), (ne || nw, 0, -1), (se || sw, 0, 1)];
        for (open, dx, dy) in cardinals {
            if open {
                self.succ.push((v.shift(dx, dy), 1.0));
            }
        }
    }

    #[inline]
    fn has_next(&self) -> bool {
        self.cursor < self.succ.len()
    }

    #[inline]
    fn next(&mut self) -> Option<Point> {
        let (p, cost) = *self.succ.get(self.cursor)?;
        self.cursor += 1;
        self.cost = cost;
        Some(p)
    }

    #[inline]
    fn step_cost(&self) -> f64 {
        self.cost
    }

    #[inline]
    fn heuristic(&self) -> &OctileHeuristic {
        &self.heuristic
    }

    #[inline]
    fn hash(&self, v: &Point) -> u64 {
        (v.y as u64) * (self.grid.width() as u64 + 1) + v.x as u64
    }

    fn search_space_size(&self) -> Option<usize> {
        Some(self.grid.num_points())
    }
}
