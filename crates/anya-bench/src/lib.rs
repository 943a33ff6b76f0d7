//! **anya-bench** — runs movingai scenarios through grid A* or Anya and
//! prints a semicolon-separated results table.
//!
//! ```text
//! run <-ASTAR|-ANYA> <scenario-file> [-v]
//! ```

pub mod runner;
pub mod scenario;
pub mod timing;

pub use runner::{Algorithm, HEADER, RunConfig, RunError, USAGE, UsageError, run, run_experiments};
pub use scenario::{Experiment, ScenarioError, load_scenario, parse_scenario};
pub use timing::{Timing, measure};
