use anya_core::Point;

use super::interval::Node;
use crate::traits::Heuristic;

/// Lower bound on the cost of reaching a target through a node: the
/// shortest polyline root -> interval -> target.
///
/// If the target lies on the same side of the interval's row as the root, it
/// is mirrored across the row first, since any path through the interval
/// must cross the row to get there.
#[derive(Clone, Copy, Debug, Default)]
pub struct AnyaHeuristic;

impl AnyaHeuristic {
    /// Estimate the cost from `node` to `target`.
    pub fn estimate(&self, node: &Node, target: Point) -> f64 {
        let iv = node.interval;
        let (rx, ry) = (f64::from(node.root.x), f64::from(node.root.y));
        let (tx, mut ty) = (f64::from(target.x), f64::from(target.y));
        let row = f64::from(iv.row);

        let px = if node.root.y == iv.row {
            if target.y == iv.row { tx } else { rx }
        } else {
            if (ry < row) == (ty < row) && ty != row {
                ty = 2.0 * row - ty;
            }
            rx + (tx - rx) * (row - ry) / (ty - ry)
        }
        .clamp(iv.left, iv.right);

        (px - rx).hypot(row - ry) + (tx - px).hypot(ty - row)
    }
}

impl Heuristic<Node> for AnyaHeuristic {
    #[inline]
    fn estimate(&self, from: &Node, to: &Node) -> f64 {
        AnyaHeuristic::estimate(self, from, to.root)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::anya::Interval;
    use approx::assert_abs_diff_eq;

    fn node(root: (i32, i32), left: f64, right: f64, row: i32) -> Node {
        Node::new(Point::new(root.0, root.1), Interval::new(left, right, row))
    }

    #[test]
    fn straight_through_interval() {
        let h = AnyaHeuristic;
        // The segment from root to target crosses the interval.
        let n = node((0, 0), 0.0, 10.0, 2);
        assert_abs_diff_eq!(h.estimate(&n, Point::new(4, 4)), 32f64.sqrt(), epsilon = 1e-12);
    }

    #[test]
    fn detour_via_endpoint() {
        let h = AnyaHeuristic;
        // The straight line would cross row 2 at x = 1.6; the interval ends
        // at 1.
        let n = node((0, 0), 0.0, 1.0, 2);
        let expected = 5f64.sqrt() + 18f64.sqrt();
        assert_abs_diff_eq!(h.estimate(&n, Point::new(4, 5)), expected, epsilon = 1e-12);
    }

    #[test]
    fn target_on_root_side_is_mirrored() {
        let h = AnyaHeuristic;
        // Target (2, 0) mirrors to (2, 4) across row 2; the crossing is at 1.
        let n = node((0, 0), 0.0, 5.0, 2);
        let expected = 2.0 * 5f64.sqrt();
        assert_abs_diff_eq!(h.estimate(&n, Point::new(2, 0)), expected, epsilon = 1e-12);
    }

    #[test]
    fn target_on_the_row() {
        let h = AnyaHeuristic;
        let cone = node((0, 0), 0.0, 2.0, 3);
        assert_abs_diff_eq!(h.estimate(&cone, Point::new(6, 3)), 13f64.sqrt() + 4.0, epsilon = 1e-12);
        let flat = node((0, 3), 2.0, 4.0, 3);
        assert_abs_diff_eq!(h.estimate(&flat, Point::new(9, 3)), 9.0, epsilon = 1e-12);
        // Off the row: measured through the interval point nearest the root.
        assert_abs_diff_eq!(h.estimate(&flat, Point::new(2, 6)), 2.0 + 3.0, epsilon = 1e-12);
    }

    #[test]
    fn start_node_is_euclidean() {
        let h = AnyaHeuristic;
        let s = Node::start(Point::new(1, 1));
        assert_abs_diff_eq!(h.estimate(&s, Point::new(4, 5)), 5.0, epsilon = 1e-12);
        assert_abs_diff_eq!(Heuristic::estimate(&h, &s, &Node::start(Point::new(1, 1))), 0.0);
    }

    #[test]
    fn never_exceeds_the_direct_route() {
        let h = AnyaHeuristic;
        let n = node((3, 1), 2.5, 6.0, 4);
        for t in [Point::new(0, 0), Point::new(9, 9), Point::new(4, 4), Point::new(3, 2)] {
            let direct = Point::new(3, 1).distance(t);
            assert!(h.estimate(&n, t) + 1e-12 >= direct);
        }
    }
}
