//! Taut-path successor generation.
//!
//! Every successor keeps the invariant that its root sees every point of its
//! interval, and that no corner lies strictly inside the interval. Successors
//! that keep their parent's root are *observable*; the rest turn around an
//! obstacle corner at one of the parent's endpoints, which becomes their root.

use std::hash::{Hash, Hasher};

use anya_core::{EPSILON, Grid, Point};
use rustc_hash::FxHasher;

use super::heuristic::AnyaHeuristic;
use super::interval::{Interval, Node};
use super::projection::{
    Projection, cone_direction, far_cell_row, heads_right, interpolate, lattice,
};
use crate::traits::ExpansionPolicy;

/// Anya successor generator over a [`Grid`].
pub struct AnyaExpansion<'g> {
    grid: &'g Grid,
    heuristic: AnyaHeuristic,
    prune: bool,
    target: Option<Point>,
    // expansion state
    succ: Vec<Node>,
    cursor: usize,
    root: Point,
    cost: f64,
    // pruning scratch buffers
    raw: Vec<Node>,
    scratch: Vec<Node>,
}

impl<'g> AnyaExpansion<'g> {
    /// Create a policy over `grid` with pruning enabled.
    pub fn new(grid: &'g Grid) -> Self {
        Self {
            grid,
            heuristic: AnyaHeuristic,
            prune: true,
            target: None,
            succ: Vec::new(),
            cursor: 0,
            root: Point::ZERO,
            cost: 0.0,
            raw: Vec::new(),
            scratch: Vec::new(),
        }
    }

    /// Enable or disable sterile and intermediate pruning.
    pub fn with_pruning(mut self, prune: bool) -> Self {
        self.prune = prune;
        self
    }

    pub fn set_pruning(&mut self, prune: bool) {
        self.prune = prune;
    }

    pub fn pruning(&self) -> bool {
        self.prune
    }

    /// Set the point that pruning must never discard. Normally set by
    /// [`validate_instance`](ExpansionPolicy::validate_instance).
    pub fn set_target(&mut self, target: Option<Point>) {
        self.target = target;
    }

    /// The grid being searched.
    #[inline]
    pub fn grid(&self) -> &'g Grid {
        self.grid
    }

    /// Append the successors of `node` to `out`, pruned if pruning is on.
    pub fn generate_successors(&mut self, node: &Node, out: &mut Vec<Node>) {
        if !self.prune {
            self.raw_successors(node, out);
            return;
        }
        let mut raw = std::mem::take(&mut self.raw);
        let mut scratch = std::mem::take(&mut self.scratch);
        raw.clear();
        self.raw_successors(node, &mut raw);
        for &candidate in &raw {
            if let Some(kept) = self.prune_candidate(candidate, &mut scratch) {
                out.push(kept);
            }
        }
        self.raw = raw;
        self.scratch = scratch;
    }

    /// Append the successors of the start point `s` to `out`: flat intervals
    /// left and right along its row, and cones into the cell rows above and
    /// below, one per side of `s`.
    pub fn generate_start_successors(&self, s: Point, out: &mut Vec<Node>) {
        let g = self.grid;
        let (x, y) = (s.x, s.y);
        let xf = f64::from(x);
        let nw = g.is_traversable(x - 1, y - 1);
        let ne = g.is_traversable(x, y - 1);
        let sw = g.is_traversable(x - 1, y);
        let se = g.is_traversable(x, y);

        let push_flat = |left: f64, right: f64, out: &mut Vec<Node>| {
            if right - left > EPSILON {
                out.push(Node::new(s, Interval::new(left, right, y)));
            }
        };

        if g.is_double_corner(x, y) {
            // Only the start's own cell may be entered.
            if se {
                push_flat(xf, g.scan_right(xf, y), out);
                let right = f64::from(g.scan_cells_right(x, y));
                self.split_at_corners(s, xf, right, y + 1, out);
            }
            return;
        }

        if ne || se {
            push_flat(xf, g.scan_right(xf, y), out);
        }
        if nw || sw {
            push_flat(g.scan_left(xf, y), xf, out);
        }
        if sw {
            let left = f64::from(g.scan_cells_left(x - 1, y) + 1);
            self.split_at_corners(s, left, xf, y + 1, out);
        }
        if se {
            let right = f64::from(g.scan_cells_right(x, y));
            self.split_at_corners(s, xf, right, y + 1, out);
        }
        if nw {
            let left = f64::from(g.scan_cells_left(x - 1, y - 1) + 1);
            self.split_at_corners(s, left, xf, y - 1, out);
        }
        if ne {
            let right = f64::from(g.scan_cells_right(x, y - 1));
            self.split_at_corners(s, xf, right, y - 1, out);
        }
    }

    // -----------------------------------------------------------------------
    // Unpruned successors
    // -----------------------------------------------------------------------

    fn raw_successors(&self, node: &Node, out: &mut Vec<Node>) {
        if node.is_start() {
            self.generate_start_successors(node.root, out);
        } else if node.is_flat() {
            self.flat_node_obs(node, out);
            self.flat_node_nobs(node, out);
        } else {
            let proj = Projection::project_cone(node, self.grid);
            if proj.valid && proj.observable {
                self.cone_node_obs(node, &proj, out);
            }
            self.cone_node_nobs(node, out);
        }
    }

    /// Continue a flat node along its row under the same root.
    fn flat_node_obs(&self, node: &Node, out: &mut Vec<Node>) {
        let proj = Projection::project_flat(node, self.grid);
        if proj.valid {
            out.push(Node::new(
                node.root,
                Interval::new(proj.left, proj.right, proj.row),
            ));
        }
    }

    /// Turn a flat node into the rows above and below, around the corner at
    /// its far endpoint.
    fn flat_node_nobs(&self, node: &Node, out: &mut Vec<Node>) {
        let iv = node.interval;
        let corner = if heads_right(node) {
            lattice(iv.right, iv.row)
        } else {
            lattice(iv.left, iv.row)
        };
        for dir in [1, -1] {
            let proj = Projection::project_f2c(node, dir, self.grid);
            if proj.valid {
                self.split_at_corners(corner, proj.left, proj.right, proj.row, out);
            }
        }
    }

    /// The part of the next row the root sees through the interval.
    fn cone_node_obs(&self, node: &Node, proj: &Projection, out: &mut Vec<Node>) {
        self.split_at_corners(node.root, proj.left, proj.right, proj.row, out);
    }

    /// Successors hidden from the root but seen from a corner at one of the
    /// interval's endpoints.
    ///
    /// A corner with the obstacle on the root's side of the row yields a flat
    /// interval along the row and a cone beyond it; a corner with the
    /// obstacle on the far side yields only a cone.
    fn cone_node_nobs(&self, node: &Node, out: &mut Vec<Node>) {
        let g = self.grid;
        let iv = node.interval;
        let y = iv.row;
        let dir = cone_direction(node);
        let near = far_cell_row(y, -dir);
        let far = far_cell_row(y, dir);
        let next = y + dir;
        let rx = f64::from(node.root.x);
        let (a_proj, b_proj) = interpolate(node);

        if iv.left_is_discrete() {
            let af = iv.left.round();
            let a = af as i32;
            if !g.is_double_corner(a, y) {
                let near_l = g.is_traversable(a - 1, near);
                let near_r = g.is_traversable(a, near);
                let far_l = g.is_traversable(a - 1, far);
                let far_r = g.is_traversable(a, far);
                let corner = Point::new(a, y);
                if !near_l && near_r && far_l {
                    let flat_left = g.scan_left(af, y);
                    if flat_left < af - EPSILON {
                        out.push(Node::new(corner, Interval::new(flat_left, af, y)));
                    }
                    let lo = f64::from(g.scan_cells_left(a - 1, far) + 1);
                    let hi = a_proj.min(f64::from(g.scan_cells_right(a - 1, far)));
                    if lo < hi - EPSILON {
                        self.split_at_corners(corner, lo, hi, next, out);
                    }
                } else if near_l && far_r && !far_l && rx < af {
                    let hi = a_proj.min(f64::from(g.scan_cells_right(a, far)));
                    if hi > af + EPSILON {
                        self.split_at_corners(corner, af, hi, next, out);
                    }
                }
            }
        }

        if iv.right_is_discrete() {
            let bf = iv.right.round();
            let b = bf as i32;
            if !g.is_double_corner(b, y) {
                let near_l = g.is_traversable(b - 1, near);
                let near_r = g.is_traversable(b, near);
                let far_l = g.is_traversable(b - 1, far);
                let far_r = g.is_traversable(b, far);
                let corner = Point::new(b, y);
                if !near_r && near_l && far_r {
                    let flat_right = g.scan_right(bf, y);
                    if flat_right > bf + EPSILON {
                        out.push(Node::new(corner, Interval::new(bf, flat_right, y)));
                    }
                    let lo = b_proj.max(f64::from(g.scan_cells_left(b, far) + 1));
                    let hi = f64::from(g.scan_cells_right(b, far));
                    if lo < hi - EPSILON {
                        self.split_at_corners(corner, lo, hi, next, out);
                    }
                } else if near_r && far_l && !far_r && rx > bf {
                    let lo = b_proj.max(f64::from(g.scan_cells_left(b - 1, far) + 1));
                    if lo < bf - EPSILON {
                        self.split_at_corners(corner, lo, bf, next, out);
                    }
                }
            }
        }
    }

    /// Push `[left, right]` on `row` under `root`, cut at every corner inside
    /// it.
    fn split_at_corners(&self, root: Point, left: f64, right: f64, row: i32, out: &mut Vec<Node>) {
        let mut lo = left;
        loop {
            let stop = self.grid.scan_right(lo, row);
            if stop >= right - EPSILON || stop <= lo + EPSILON {
                out.push(Node::new(root, Interval::new(lo, right, row)));
                return;
            }
            out.push(Node::new(root, Interval::new(lo, stop, row)));
            lo = stop;
        }
    }

    // -----------------------------------------------------------------------
    // Pruning
    // -----------------------------------------------------------------------

    #[inline]
    fn contains_target(&self, node: &Node) -> bool {
        self.target.is_some_and(|t| node.interval.contains(t))
    }

    /// Drop `node` if it is sterile, or skip ahead through intermediate
    /// nodes whose only successor keeps their root.
    fn prune_candidate(&self, mut node: Node, scratch: &mut Vec<Node>) -> Option<Node> {
        loop {
            if self.contains_target(&node) {
                return Some(node);
            }
            scratch.clear();
            self.raw_successors(&node, scratch);
            match scratch.as_slice() {
                [] => return None,
                [only] if only.root == node.root => node = *only,
                _ => return Some(node),
            }
        }
    }
}

impl ExpansionPolicy for AnyaExpansion<'_> {
    type Vertex = Node;
    type Heuristic = AnyaHeuristic;

    fn validate_instance(&mut self, start: &Node, target: &Node) -> bool {
        self.target = Some(target.root);
        let (s, t) = (start.root, target.root);
        self.grid.is_traversable(s.x, s.y) && self.grid.is_traversable(t.x, t.y)
    }

    fn expand(&mut self, v: &Node) {
        let mut succ = std::mem::take(&mut self.succ);
        succ.clear();
        self.generate_successors(v, &mut succ);
        log::trace!("expand {v}: {} successors", succ.len());
        self.succ = succ;
        self.cursor = 0;
        self.root = v.root;
    }

    #[inline]
    fn has_next(&self) -> bool {
        self.cursor < self.succ.len()
    }

    #[inline]
    fn next(&mut self) -> Option<Node> {
        let node = *self.succ.get(self.cursor)?;
        self.cursor += 1;
        self.cost = self.root.distance(node.root);
        Some(node)
    }

    #[inline]
    fn step_cost(&self) -> f64 {
        self.cost
    }

    #[inline]
    fn heuristic(&self) -> &AnyaHeuristic {
        &self.heuristic
    }

    fn hash(&self, v: &Node) -> u64 {
        let mut h = FxHasher::default();
        v.root.hash(&mut h);
        v.interval.row.hash(&mut h);
        v.interval.left.to_bits().hash(&mut h);
        v.interval.right.to_bits().hash(&mut h);
        h.finish()
    }

    fn is_target(&self, v: &Node, target: &Node) -> bool {
        v.interval.contains(target.root)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{RngExt, SeedableRng};

    //   x 0123456789
    //   0 ..........
    //   1 ..........
    //   2 ....@@....
    //   3 ..........
    //   4 @@@.......
    const MAP: &str = "\
..........
..........
....@@....
..........
@@@.......";

    fn grid() -> Grid {
        Grid::from_ascii(MAP).unwrap()
    }

    fn successors(policy: &mut AnyaExpansion<'_>, node: Node) -> Vec<Node> {
        let mut out = Vec::new();
        policy.generate_successors(&node, &mut out);
        out
    }

    fn node(root: (i32, i32), left: f64, right: f64, row: i32) -> Node {
        Node::new(Point::new(root.0, root.1), Interval::new(left, right, row))
    }

    /// Every node's root must see both of its interval's endpoints.
    fn assert_taut(g: &Grid, nodes: &[Node]) {
        for n in nodes {
            let (rx, ry) = (f64::from(n.root.x), f64::from(n.root.y));
            let row = f64::from(n.interval.row);
            assert!(n.interval.left <= n.interval.right, "{n}");
            assert!(g.line_of_sight(rx, ry, n.interval.left, row), "{n}");
            assert!(g.line_of_sight(rx, ry, n.interval.right, row), "{n}");
        }
    }

    #[test]
    fn start_in_open_ground_sees_all_around() {
        let g = grid();
        let mut policy = AnyaExpansion::new(&g).with_pruning(false);
        let succ = successors(&mut policy, Node::start(Point::new(7, 1)));
        assert_eq!(
            succ,
            vec![
                node((7, 1), 7.0, 10.0, 1),
                node((7, 1), 0.0, 7.0, 1),
                // Row 2 is cut at the corners of the obstacle below it.
                node((7, 1), 0.0, 4.0, 2),
                node((7, 1), 4.0, 6.0, 2),
                node((7, 1), 6.0, 7.0, 2),
                node((7, 1), 7.0, 10.0, 2),
                node((7, 1), 0.0, 7.0, 0),
                node((7, 1), 7.0, 10.0, 0),
            ]
        );
        assert_taut(&g, &succ);
    }

    #[test]
    fn start_under_obstacle() {
        let g = grid();
        let mut policy = AnyaExpansion::new(&g).with_pruning(false);
        // Both cells above (5, 3) are blocked.
        let succ = successors(&mut policy, Node::start(Point::new(5, 3)));
        assert_eq!(
            succ,
            vec![
                node((5, 3), 5.0, 6.0, 3),
                node((5, 3), 4.0, 5.0, 3),
                node((5, 3), 0.0, 3.0, 4),
                node((5, 3), 3.0, 5.0, 4),
                node((5, 3), 5.0, 10.0, 4),
            ]
        );
        assert_taut(&g, &succ);
    }

    #[test]
    fn start_at_double_corner_enters_own_cell_only() {
        let g = Grid::from_ascii(
            "
            ...
            ..@
            .@.
            ",
        )
        .unwrap();
        assert!(g.is_double_corner(2, 2));
        let mut policy = AnyaExpansion::new(&g).with_pruning(false);
        let succ = successors(&mut policy, Node::start(Point::new(2, 2)));
        assert_eq!(succ, vec![node((2, 2), 2.0, 3.0, 2), node((2, 2), 2.0, 3.0, 3)]);
    }

    #[test]
    fn boxed_start_leaves_right_and_down() {
        let g = Grid::from_ascii(
            "
            @@...
            @....
            .....
            ",
        )
        .unwrap();
        let mut policy = AnyaExpansion::new(&g).with_pruning(false);
        let succ = successors(&mut policy, Node::start(Point::new(1, 1)));
        assert_eq!(succ, vec![node((1, 1), 1.0, 2.0, 1), node((1, 1), 1.0, 5.0, 2)]);
    }

    #[test]
    fn flat_node_turns_around_corner() {
        let g = grid();
        let mut policy = AnyaExpansion::new(&g).with_pruning(false);
        // Heading right along row 4 from (0, 4): the obstacle below ends at 3.
        let succ = successors(&mut policy, node((0, 4), 0.0, 3.0, 4));
        assert_eq!(
            succ,
            vec![node((0, 4), 3.0, 10.0, 4), node((3, 4), 3.0, 10.0, 5)]
        );
        assert_taut(&g, &succ);
    }

    #[test]
    fn flat_node_along_obstacle_edge() {
        let g = grid();
        let mut policy = AnyaExpansion::new(&g).with_pruning(false);
        let succ = successors(&mut policy, node((0, 2), 4.0, 6.0, 2));
        assert_eq!(
            succ,
            vec![node((0, 2), 6.0, 10.0, 2), node((6, 2), 6.0, 10.0, 3)]
        );
    }

    #[test]
    fn cone_node_observable_projection() {
        let g = grid();
        let mut policy = AnyaExpansion::new(&g).with_pruning(false);
        let succ = successors(&mut policy, node((7, 0), 7.0, 8.0, 1));
        assert_eq!(succ, vec![node((7, 0), 7.0, 9.0, 2)]);
    }

    #[test]
    fn cone_node_turns_at_near_side_corner() {
        let g = grid();
        let mut policy = AnyaExpansion::new(&g).with_pruning(false);
        // Root (8, 1) sees [6, 8] on row 3 past the obstacle's lower right
        // corner. Row 3 left of 6 and row 4 left of 5 are hidden from it.
        let succ = successors(&mut policy, node((8, 1), 6.0, 8.0, 3));
        assert_eq!(
            succ,
            vec![
                node((8, 1), 5.0, 8.0, 4),
                node((6, 3), 4.0, 6.0, 3),
                node((6, 3), 0.0, 3.0, 4),
                node((6, 3), 3.0, 5.0, 4),
            ]
        );
        assert_taut(&g, &succ);
    }

    #[test]
    fn cone_node_turns_at_far_side_corner() {
        let g = grid();
        let mut policy = AnyaExpansion::new(&g).with_pruning(false);
        // Heading down-right from (1, 2) past the end of the wall in cell
        // row 4: [3, 4] on row 5 is hidden behind it.
        let succ = successors(&mut policy, node((1, 2), 3.0, 4.0, 4));
        assert_eq!(
            succ,
            vec![node((1, 2), 4.0, 5.5, 5), node((3, 4), 3.0, 4.0, 5)]
        );
        assert_taut(&g, &succ);
    }

    #[test]
    fn cone_onto_obstacle_edge_is_sterile() {
        let g = grid();
        let mut policy = AnyaExpansion::new(&g).with_pruning(false);
        assert!(successors(&mut policy, node((4, 0), 4.0, 6.0, 2)).is_empty());
    }

    #[test]
    fn pruning_drops_sterile_and_skips_intermediate() {
        let g = Grid::from_ascii(
            "
            .....
            .@@@.
            .....
            ",
        )
        .unwrap();
        let start = Node::start(Point::new(0, 0));
        let mut policy = AnyaExpansion::new(&g).with_pruning(false);
        assert_eq!(successors(&mut policy, start).len(), 4);

        policy.set_pruning(true);
        policy.set_target(Some(Point::new(4, 2)));
        let pruned = successors(&mut policy, start);
        // The top edge and the obstacle's top are dead ends; the narrow
        // gap at the left is skipped through to the row below it.
        assert_eq!(pruned, vec![node((0, 0), 0.0, 1.0, 2), node((0, 0), 4.0, 5.0, 1)]);
        assert_taut(&g, &pruned);
    }

    #[test]
    fn pruning_keeps_the_target_interval() {
        let g = Grid::from_ascii(
            "
            .....
            .@@@.
            .....
            ",
        )
        .unwrap();
        let mut policy = AnyaExpansion::new(&g);
        assert!(policy.pruning());
        policy.set_target(Some(Point::new(3, 0)));
        let succ = successors(&mut policy, Node::start(Point::new(0, 0)));
        assert!(succ.contains(&node((0, 0), 0.0, 5.0, 0)));
    }

    #[test]
    fn pruning_stops_skipping_at_the_target() {
        // A one-cell corridor down the left edge: every interval in it has a
        // single successor under the same root until it opens into row 4.
        let g = Grid::from_ascii(
            "
            .....
            .@@@@
            .@@@@
            .@@@@
            .....
            ",
        )
        .unwrap();
        let start = Node::start(Point::new(0, 0));
        let mut policy = AnyaExpansion::new(&g);
        let deepest = node((0, 0), 0.0, 1.0, 4);
        assert!(successors(&mut policy, start).contains(&deepest));

        for (target, stop) in [((1, 2), 2), ((0, 3), 3), ((1, 4), 4)] {
            policy.set_target(Some(Point::new(target.0, target.1)));
            let succ = successors(&mut policy, start);
            assert!(succ.contains(&node((0, 0), 0.0, 1.0, stop)), "{target:?}");
            for row in (1..=4).filter(|&r| r != stop) {
                assert!(!succ.contains(&node((0, 0), 0.0, 1.0, row)), "{target:?}");
            }
            assert_taut(&g, &succ);
        }
    }

    #[test]
    fn hash_ignores_the_sign_of_zero() {
        let g = grid();
        let policy = AnyaExpansion::new(&g);
        let a = node((2, 0), -1e-9, 1.0, 1);
        let b = node((2, 0), 0.0, 1.0, 1);
        assert_eq!(a, b);
        assert_eq!(policy.hash(&a), policy.hash(&b));
    }

    #[test]
    fn successors_are_taut_on_random_maps() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..20 {
            let g = Grid::from_fn(12, 9, |_| rng.random_range(0..100) >= 25);
            let mut policy = AnyaExpansion::new(&g).with_pruning(false);
            let mut frontier = Vec::new();
            for p in g.bounds() {
                if g.is_traversable(p.x, p.y) {
                    policy.generate_start_successors(p, &mut frontier);
                }
            }
            for _ in 0..2 {
                assert_taut(&g, &frontier);
                let mut next = Vec::new();
                for n in &frontier {
                    policy.generate_successors(n, &mut next);
                }
                frontier = next;
            }
            assert_taut(&g, &frontier);
        }
    }
}
