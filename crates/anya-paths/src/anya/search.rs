use anya_core::{Grid, Point};

use super::expansion::AnyaExpansion;
use super::interval::Node;
use crate::engine::{FastAStar, SearchStats};

/// Optimal any-angle point-to-point search on a [`Grid`].
///
/// Thin wrapper over [`FastAStar`] driving an [`AnyaExpansion`], answering
/// queries between lattice points. The engine is reused across queries.
///
/// ```
/// use anya_core::{Grid, Point};
/// use anya_paths::anya::AnyaSearch;
///
/// let grid = Grid::from_ascii("....\n.@@.\n....").unwrap();
/// let mut search = AnyaSearch::new(&grid);
/// let cost = search.search(Point::new(0, 0), Point::new(4, 3)).unwrap();
/// // One turn, at a corner of the obstacle.
/// assert!((cost - (10f64.sqrt() + 5f64.sqrt())).abs() < 1e-9);
/// assert_eq!(search.path().unwrap().len(), 3);
/// ```
pub struct AnyaSearch<'g> {
    engine: FastAStar<AnyaExpansion<'g>>,
    target: Point,
}

impl<'g> AnyaSearch<'g> {
    /// Create a search over `grid` with pruning enabled.
    pub fn new(grid: &'g Grid) -> Self {
        Self::with_policy(AnyaExpansion::new(grid))
    }

    /// Create a search driving an already configured policy.
    pub fn with_policy(policy: AnyaExpansion<'g>) -> Self {
        Self {
            engine: FastAStar::new(policy),
            target: Point::ZERO,
        }
    }

    /// Enable or disable sterile and intermediate node pruning.
    pub fn set_pruning(&mut self, prune: bool) {
        self.engine.policy_mut().set_pruning(prune);
    }

    /// Cost of the shortest any-angle path from `start` to `target`, or
    /// `None` if either endpoint is blocked or no path exists.
    pub fn search(&mut self, start: Point, target: Point) -> Option<f64> {
        self.target = target;
        self.engine.search(Node::start(start), Node::start(target))
    }

    /// Turning points of the path found by the last successful search, from
    /// start to target.
    pub fn path(&self) -> Option<Vec<Point>> {
        let nodes = self.engine.last_path()?;
        let mut points: Vec<Point> = nodes.vertices.iter().map(|n| n.root).collect();
        points.push(self.target);
        points.dedup();
        Some(points)
    }

    /// Counters from the last search.
    #[inline]
    pub fn stats(&self) -> SearchStats {
        self.engine.stats()
    }

    /// The underlying engine.
    #[inline]
    pub fn engine(&self) -> &FastAStar<AnyaExpansion<'g>> {
        &self.engine
    }
}

/// Euclidean length of the polyline through `points`.
pub fn path_length(points: &[Point]) -> f64 {
    points.windows(2).map(|w| w[0].distance(w[1])).sum()
}
