use std::fmt;

/// Successor generator driven by [`FastAStar`](crate::FastAStar).
///
/// A policy is a small state machine: [`expand`](Self::expand) prepares the
/// successors of one vertex, then [`next`](Self::next) hands them out one at a
/// time, with [`step_cost`](Self::step_cost) describing the edge to the one
/// most recently returned.
pub trait ExpansionPolicy {
    /// Search-space vertex.
    type Vertex: Copy + PartialEq + Default + fmt::Debug;
    /// Distance estimate used to order the open list.
    type Heuristic: Heuristic<Self::Vertex>;

    /// Check that a query can be answered at all. Called once per search
    /// before anything else, so a policy may also record the target here.
    fn validate_instance(&mut self, start: &Self::Vertex, target: &Self::Vertex) -> bool;

    /// Prepare the successors of `v`.
    fn expand(&mut self, v: &Self::Vertex);

    /// Whether [`next`](Self::next) has another successor to return.
    fn has_next(&self) -> bool;

    /// The next successor of the vertex last passed to
    /// [`expand`](Self::expand).
    fn next(&mut self) -> Option<Self::Vertex>;

    /// Cost of the edge to the successor most recently returned by
    /// [`next`](Self::next).
    fn step_cost(&self) -> f64;

    /// The heuristic for this search space.
    fn heuristic(&self) -> &Self::Heuristic;

    /// Identity hash of `v`. For a dense search space this must be a unique
    /// index below [`search_space_size`](Self::search_space_size).
    fn hash(&self, v: &Self::Vertex) -> u64;

    /// Number of distinct vertices when the space is finite and densely
    /// indexed by [`hash`](Self::hash); `None` for an open-ended space.
    fn search_space_size(&self) -> Option<usize> {
        None
    }

    /// Whether reaching `v` answers the query for `target`.
    fn is_target(&self, v: &Self::Vertex, target: &Self::Vertex) -> bool {
        v == target
    }
}

/// Admissible estimate of the remaining cost between two vertices.
pub trait Heuristic<V> {
    /// Estimated cost from `from` to `to`. Must never overestimate.
    fn estimate(&self, from: &V, to: &V) -> f64;
}
