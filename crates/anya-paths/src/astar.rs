use crate::engine::{FastAStar, NONE};
use crate::traits::{ExpansionPolicy, Heuristic};

/// A path found by [`FastAStar`].
#[derive(Clone, Debug, PartialEq)]
pub struct Path<V> {
    /// Vertices from start to goal.
    pub vertices: Vec<V>,
    /// `costs[i]` is the cost of the edge from `vertices[i]` to
    /// `vertices[i + 1]`.
    pub costs: Vec<f64>,
    /// Cost reported by the search: `f` of the goal node when it was popped.
    pub cost: f64,
}

impl<V> Path<V> {
    /// Number of vertices on the path.
    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    /// Whether the path holds no vertices.
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Sum of the edge costs, i.e. `g` of the goal node.
    pub fn edge_cost(&self) -> f64 {
        self.costs.iter().sum()
    }
}

impl<P: ExpansionPolicy> FastAStar<P> {
    /// Run A* from `start` to `target`, returning the path cost or `None`
    /// when the instance is invalid or the target unreachable.
    pub fn search(&mut self, start: P::Vertex, target: P::Vertex) -> Option<f64> {
        self.begin();
        if !self.policy.validate_instance(&start, &target) {
            log::debug!("invalid instance {start:?} -> {target:?}");
            return None;
        }

        let (si, _) = self.slot(start);
        let h = self.policy.heuristic().estimate(&start, &target);
        {
            let node = &mut self.nodes[si];
            node.g = 0.0;
            node.f = h;
        }
        self.stats.insertions += 1;
        self.push_open(si);

        let found = 'search: loop {
            let Some(current) = self.open.pop() else {
                break 'search false;
            };
            self.stats.heap_ops += 1;
            let ci = current.slot;

            // Superseded by a later decrease-key.
            if self.nodes[ci].closed {
                continue;
            }

            let vertex = self.nodes[ci].vertex;
            if self.policy.is_target(&vertex, &target) {
                self.goal = ci;
                break 'search true;
            }

            self.stats.expanded += 1;
            let current_g = self.nodes[ci].g;
            self.policy.expand(&vertex);

            while let Some(next) = self.policy.next() {
                self.stats.generated += 1;
                let tentative_g = current_g + self.policy.step_cost();
                let (ni, fresh) = self.slot(next);
                if !fresh {
                    let node = &self.nodes[ni];
                    if node.closed || tentative_g >= node.g {
                        continue;
                    }
                } else {
                    self.stats.insertions += 1;
                }
                let h = self.policy.heuristic().estimate(&next, &target);
                let node = &mut self.nodes[ni];
                node.g = tentative_g;
                node.f = tentative_g + h;
                node.parent = ci;
                self.push_open(ni);
            }

            self.nodes[ci].closed = true;
        };

        if !found {
            log::debug!(
                "no path {start:?} -> {target:?} after {} expansions",
                self.stats.expanded
            );
            return None;
        }
        let cost = self.nodes[self.goal].f;
        log::trace!(
            "path {start:?} -> {target:?}: cost {cost}, {} expanded",
            self.stats.expanded
        );
        Some(cost)
    }

    /// Run A* and reconstruct the path.
    pub fn search_path(&mut self, start: P::Vertex, target: P::Vertex) -> Option<Path<P::Vertex>> {
        self.search(start, target)?;
        self.last_path()
    }

    /// The path found by the most recent successful search.
    pub fn last_path(&self) -> Option<Path<P::Vertex>> {
        if self.goal == NONE {
            return None;
        }
        let mut vertices = Vec::new();
        let mut costs = Vec::new();
        let mut ci = self.goal;
        while ci != NONE {
            let node = &self.nodes[ci];
            vertices.push(node.vertex);
            if node.parent != NONE {
                costs.push(node.g - self.nodes[node.parent].g);
            }
            ci = node.parent;
        }
        vertices.reverse();
        costs.reverse();
        Some(Path {
            vertices,
            costs,
            cost: self.nodes[self.goal].f,
        })
    }
}
