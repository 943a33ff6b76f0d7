//! **anya-core** — obstacle grids for any-angle pathfinding.
//!
//! This crate provides the read-only map representation shared by every
//! search: lattice geometry, a bit-packed [`Grid`] with corner
//! classification and row-scanning primitives, and map-file loading.

pub mod geom;
pub mod grid;
pub mod map;

pub use geom::{Point, Range};
pub use grid::{EPSILON, Grid, is_integral};
pub use map::{MapError, is_obstacle_tile};
