use std::collections::BinaryHeap;

use rustc_hash::FxHashMap;

use crate::traits::ExpansionPolicy;

/// Cost reported for a query with no path.
pub const NO_PATH: f64 = -1.0;

pub(crate) const NONE: usize = usize::MAX;

/// Counters collected during one search.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SearchStats {
    /// Vertices popped from the open list and expanded.
    pub expanded: u64,
    /// Successors returned by the policy.
    pub generated: u64,
    /// Vertices inserted into the open list for the first time.
    pub insertions: u64,
    /// Pushes, pops and decrease-keys on the open list.
    pub heap_ops: u64,
}

// ---------------------------------------------------------------------------
// Pooled search node
// ---------------------------------------------------------------------------

#[derive(Clone, Debug)]
pub(crate) struct SearchNode<V> {
    pub(crate) vertex: V,
    pub(crate) g: f64,
    pub(crate) f: f64,
    pub(crate) parent: usize,
    pub(crate) generation: u32,
    pub(crate) closed: bool,
    /// Next slot sharing the same hash (sparse pools only).
    pub(crate) next: usize,
}

impl<V: Default> Default for SearchNode<V> {
    fn default() -> Self {
        Self {
            vertex: V::default(),
            g: f64::INFINITY,
            f: f64::INFINITY,
            parent: NONE,
            generation: 0,
            closed: false,
            next: NONE,
        }
    }
}

impl<V> SearchNode<V> {
    fn fresh(vertex: V, generation: u32) -> Self {
        Self {
            vertex,
            g: f64::INFINITY,
            f: f64::INFINITY,
            parent: NONE,
            generation,
            closed: false,
            next: NONE,
        }
    }
}

/// Open-list entry, ordered by `f` for use in `BinaryHeap`.
#[derive(Clone, Copy, Debug)]
pub(crate) struct OpenEntry {
    pub(crate) slot: usize,
    pub(crate) f: f64,
    pub(crate) g: f64,
}

impl Ord for OpenEntry {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        // Reverse so BinaryHeap (max-heap) pops smallest f first; on ties
        // prefer the deeper node.
        other
            .f
            .total_cmp(&self.f)
            .then(self.g.total_cmp(&other.g))
    }
}

impl PartialOrd for OpenEntry {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for OpenEntry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other).is_eq()
    }
}

impl Eq for OpenEntry {}

// ---------------------------------------------------------------------------
// FastAStar
// ---------------------------------------------------------------------------

/// Best-first search engine over an [`ExpansionPolicy`].
///
/// `FastAStar` owns its node pool, open list and index map and reuses them
/// across queries: a generation stamp marks which pooled nodes belong to the
/// current search, so nothing is cleared or reallocated between queries once
/// the pool has grown to fit the search space.
///
/// When the policy reports a [`search_space_size`] the pool is dense, one
/// slot per vertex indexed by the policy's hash. Otherwise slots are handed
/// out on demand and found again through a hash map, with vertex equality
/// resolving collisions.
///
/// [`search_space_size`]: ExpansionPolicy::search_space_size
pub struct FastAStar<P: ExpansionPolicy> {
    pub(crate) policy: P,
    pub(crate) nodes: Vec<SearchNode<P::Vertex>>,
    pub(crate) dense: bool,
    pub(crate) index: FxHashMap<u64, usize>,
    pub(crate) open: BinaryHeap<OpenEntry>,
    pub(crate) generation: u32,
    pub(crate) stats: SearchStats,
    /// Slot of the target node after a successful search, else `NONE`.
    pub(crate) goal: usize,
}

impl<P: ExpansionPolicy> FastAStar<P> {
    /// Create an engine driving `policy`.
    pub fn new(policy: P) -> Self {
        let size = policy.search_space_size();
        let nodes = match size {
            Some(n) => vec![SearchNode::default(); n],
            None => Vec::new(),
        };
        Self {
            policy,
            nodes,
            dense: size.is_some(),
            index: FxHashMap::default(),
            open: BinaryHeap::new(),
            generation: 0,
            stats: SearchStats::default(),
            goal: NONE,
        }
    }

    /// The expansion policy.
    #[inline]
    pub fn policy(&self) -> &P {
        &self.policy
    }

    /// Mutable access to the expansion policy, e.g. to change its settings
    /// between queries.
    #[inline]
    pub fn policy_mut(&mut self) -> &mut P {
        &mut self.policy
    }

    /// Counters from the most recent search.
    #[inline]
    pub fn stats(&self) -> SearchStats {
        self.stats
    }

    /// Current search generation.
    #[inline]
    pub fn generation(&self) -> u32 {
        self.generation
    }

    /// Number of pooled node slots currently allocated.
    #[inline]
    pub fn pool_len(&self) -> usize {
        self.nodes.len()
    }

    /// Start a new search generation.
    pub(crate) fn begin(&mut self) {
        self.stats = SearchStats::default();
        self.goal = NONE;
        self.open.clear();
        self.generation = self.generation.wrapping_add(1);
        if self.dense {
            if self.generation == 0 {
                // Stamps from 2^32 searches ago would look current.
                for node in &mut self.nodes {
                    node.generation = 0;
                }
                self.generation = 1;
            }
        } else {
            self.nodes.clear();
            self.index.clear();
        }
    }

    /// Slot holding `v` in the current generation, and whether it was unseen.
    pub(crate) fn slot(&mut self, v: P::Vertex) -> (usize, bool) {
        let generation = self.generation;
        if self.dense {
            let i = self.policy.hash(&v) as usize;
            if i >= self.nodes.len() {
                self.nodes.resize(i + 1, SearchNode::default());
            }
            let node = &mut self.nodes[i];
            if node.generation == generation {
                return (i, false);
            }
            *node = SearchNode::fresh(v, generation);
            return (i, true);
        }

        let hash = self.policy.hash(&v);
        let head = self.index.get(&hash).copied().unwrap_or(NONE);
        let mut i = head;
        while i != NONE {
            if self.nodes[i].vertex == v {
                return (i, false);
            }
            i = self.nodes[i].next;
        }
        let i = self.nodes.len();
        let mut node = SearchNode::fresh(v, generation);
        node.next = head;
        self.nodes.push(node);
        self.index.insert(hash, i);
        (i, true)
    }

    /// Push slot `i` onto the open list with its current keys.
    #[inline]
    pub(crate) fn push_open(&mut self, i: usize) {
        let node = &self.nodes[i];
        self.open.push(OpenEntry {
            slot: i,
            f: node.f,
            g: node.g,
        });
        self.stats.heap_ops += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::Heuristic;

    /// A line of `n` vertices, each linked to its neighbours.
    struct Line {
        n: u32,
        dense: bool,
        succ: Vec<u32>,
        cursor: usize,
    }

    struct Zero;

    impl Heuristic<u32> for Zero {
        fn estimate(&self, _: &u32, _: &u32) -> f64 {
            0.0
        }
    }

    impl ExpansionPolicy for Line {
        type Vertex = u32;
        type Heuristic = Zero;

        fn validate_instance(&mut self, start: &u32, target: &u32) -> bool {
            *start < self.n && *target < self.n
        }

        fn expand(&mut self, v: &u32) {
            self.succ.clear();
            self.cursor = 0;
            if *v > 0 {
                self.succ.push(v - 1);
            }
            if v + 1 < self.n {
                self.succ.push(v + 1);
            }
        }

        fn has_next(&self) -> bool {
            self.cursor < self.succ.len()
        }

        fn next(&mut self) -> Option<u32> {
            let v = self.succ.get(self.cursor).copied()?;
            self.cursor += 1;
            Some(v)
        }

        fn step_cost(&self) -> f64 {
            1.0
        }

        fn heuristic(&self) -> &Zero {
            &Zero
        }

        fn hash(&self, v: &u32) -> u64 {
            // Deliberately collide in sparse mode.
            if self.dense { u64::from(*v) } else { u64::from(*v % 3) }
        }

        fn search_space_size(&self) -> Option<usize> {
            self.dense.then_some(self.n as usize)
        }
    }

    fn line(n: u32, dense: bool) -> FastAStar<Line> {
        FastAStar::new(Line {
            n,
            dense,
            succ: Vec::new(),
            cursor: 0,
        })
    }

    #[test]
    fn open_entry_orders_by_f_then_deeper_g() {
        let mut heap = BinaryHeap::new();
        heap.push(OpenEntry { slot: 0, f: 3.0, g: 1.0 });
        heap.push(OpenEntry { slot: 1, f: 1.0, g: 0.0 });
        heap.push(OpenEntry { slot: 2, f: 3.0, g: 2.0 });
        let order: Vec<usize> = std::iter::from_fn(|| heap.pop().map(|e| e.slot)).collect();
        assert_eq!(order, vec![1, 2, 0]);
    }

    #[test]
    fn dense_pool_is_preallocated_and_kept() {
        let mut e = line(10, true);
        assert_eq!(e.pool_len(), 10);
        assert_eq!(e.search(0, 9), Some(9.0));
        assert_eq!(e.search(9, 2), Some(7.0));
        assert_eq!(e.pool_len(), 10);
        assert_eq!(e.generation(), 2);
    }

    #[test]
    fn sparse_pool_resolves_hash_collisions() {
        let mut e = line(10, false);
        assert_eq!(e.search(0, 9), Some(9.0));
        // Every vertex was visited exactly once despite sharing 3 hash buckets.
        assert_eq!(e.pool_len(), 10);
        assert_eq!(e.stats().insertions, 10);
        assert_eq!(e.search(4, 4), Some(0.0));
        assert_eq!(e.pool_len(), 1);
    }

    #[test]
    fn generation_wrap_resets_stamps() {
        let mut e = line(5, true);
        e.generation = u32::MAX;
        assert_eq!(e.search(0, 4), Some(4.0));
        assert_eq!(e.generation(), 1);
        assert!(e.nodes.iter().all(|n| n.generation <= 1));
        assert_eq!(e.search(4, 0), Some(4.0));
    }

    #[test]
    fn invalid_instance_reports_no_path() {
        let mut e = line(5, true);
        assert_eq!(e.search(0, 7), None);
        assert_eq!(e.stats(), SearchStats::default());
    }
}
