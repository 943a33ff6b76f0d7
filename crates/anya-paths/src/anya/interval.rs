use std::fmt;

use anya_core::{EPSILON, Point, is_integral};

/// Round `x` to the nearest integer when it is within [`EPSILON`] of one.
/// Never returns `-0.0`, so snapped values hash by bits.
#[inline]
pub(crate) fn snap(x: f64) -> f64 {
    if is_integral(x) { x.round() + 0.0 } else { x }
}

/// A closed range `[left, right]` of real x coordinates on one row line.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Interval {
    pub left: f64,
    pub right: f64,
    pub row: i32,
}

impl Interval {
    /// Create an interval, swapping the endpoints if needed so that
    /// `left <= right`.
    #[inline]
    pub fn new(left: f64, right: f64, row: i32) -> Self {
        let (left, right) = if left <= right { (left, right) } else { (right, left) };
        Self {
            left: snap(left),
            right: snap(right),
            row,
        }
    }

    /// The zero-width interval at `p`.
    #[inline]
    pub fn point(p: Point) -> Self {
        let x = f64::from(p.x);
        Self {
            left: x,
            right: x,
            row: p.y,
        }
    }

    /// Length of the interval.
    #[inline]
    pub fn width(&self) -> f64 {
        self.right - self.left
    }

    /// Whether both endpoints coincide.
    #[inline]
    pub fn is_point(&self) -> bool {
        self.width() < EPSILON
    }

    /// Whether `x` lies on the interval, within [`EPSILON`].
    #[inline]
    pub fn covers(&self, x: f64) -> bool {
        self.left - EPSILON <= x && x <= self.right + EPSILON
    }

    /// Whether lattice point `p` lies on the interval.
    #[inline]
    pub fn contains(&self, p: Point) -> bool {
        p.y == self.row && self.covers(f64::from(p.x))
    }

    /// Whether the left endpoint is a lattice x coordinate.
    #[inline]
    pub fn left_is_discrete(&self) -> bool {
        is_integral(self.left)
    }

    /// Whether the right endpoint is a lattice x coordinate.
    #[inline]
    pub fn right_is_discrete(&self) -> bool {
        is_integral(self.right)
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]@{}", self.left, self.right, self.row)
    }
}

/// An Anya search state: an interval together with the root every point of
/// it is seen from.
///
/// A node is *flat* when its root lies on the interval's row and a *cone*
/// otherwise. Cost-so-far and the parent link live in the search engine's
/// pooled node, not here.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Node {
    pub root: Point,
    pub interval: Interval,
}

impl Node {
    #[inline]
    pub fn new(root: Point, interval: Interval) -> Self {
        Self { root, interval }
    }

    /// The search start: a zero-width interval at `p`, rooted at `p`.
    #[inline]
    pub fn start(p: Point) -> Self {
        Self {
            root: p,
            interval: Interval::point(p),
        }
    }

    #[inline]
    pub fn is_flat(&self) -> bool {
        self.root.y == self.interval.row
    }

    #[inline]
    pub fn is_cone(&self) -> bool {
        !self.is_flat()
    }

    /// Whether this is a start node (zero-width interval at its own root).
    #[inline]
    pub fn is_start(&self) -> bool {
        self.is_flat() && self.interval.is_point() && self.interval.covers(f64::from(self.root.x))
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} <- {}", self.interval, self.root)
    }
}
