//! Anya: optimal any-angle pathfinding.
//!
//! Search states are intervals of a row line paired with the root point that
//! sees them. A node is expanded by projecting its interval one row further
//! from its root and by turning around obstacle corners at its endpoints;
//! see [`AnyaExpansion`]. [`AnyaSearch`] answers point-to-point queries on top
//! of the generic engine.

mod expansion;
mod heuristic;
mod interval;
mod projection;
mod search;

pub use expansion::AnyaExpansion;
pub use heuristic::AnyaHeuristic;
pub use interval::{Interval, Node};
pub use projection::Projection;
pub use search::{AnyaSearch, path_length};
