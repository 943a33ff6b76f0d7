use std::f64::consts::SQRT_2;

use anya_core::Point;

use crate::traits::Heuristic;

/// Straight-line (L2) distance between two points.
#[inline]
pub fn euclidean(a: Point, b: Point) -> f64 {
    a.distance(b)
}

/// Octile distance: the cost of the shortest 8-connected path between two
/// points on an empty grid, with diagonal steps costing √2.
#[inline]
pub fn octile(a: Point, b: Point) -> f64 {
    let dx = (a.x - b.x).abs();
    let dy = (a.y - b.y).abs();
    f64::from((dx - dy).abs()) + f64::from(dx.min(dy)) * SQRT_2
}

/// [`octile`] as a [`Heuristic`] over lattice points.
#[derive(Clone, Copy, Debug, Default)]
pub struct OctileHeuristic;

impl Heuristic<Point> for OctileHeuristic {
    #[inline]
    fn estimate(&self, from: &Point, to: &Point) -> f64 {
        octile(*from, *to)
    }
}
