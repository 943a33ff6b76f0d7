//! Point-to-point search on obstacle grids.
//!
//! This crate provides a generic best-first search engine and two expansion
//! policies for it:
//!
//! - **A\*** on the 8-connected lattice ([`GridExpansion`])
//! - **Anya** optimal any-angle search over row intervals ([`anya::AnyaExpansion`],
//!   wrapped by [`anya::AnyaSearch`])
//!
//! The engine, [`FastAStar`], owns and reuses its node pool, open list and
//! index map, so repeated queries incur no allocation after warm-up.
//!
//! # Traits
//!
//! | Trait | Role |
//! |---|---|
//! | [`ExpansionPolicy`] | vertex type, successor generation, hashing, goal test |
//! | [`Heuristic`] | admissible cost estimate used to order the open list |

mod astar;
mod distance;
mod engine;
mod grid_policy;
mod traits;

pub mod anya;

pub use astar::Path;
pub use distance::{OctileHeuristic, euclidean, octile};
pub use engine::{FastAStar, NO_PATH, SearchStats};
pub use grid_policy::GridExpansion;
pub use traits::{ExpansionPolicy, Heuristic};
