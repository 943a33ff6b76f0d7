//! Scenario runner: parses the command line, loads a scenario and its map,
//! and prints one timing row per experiment.

use std::fmt;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anya_core::{Grid, MapError, Point};
use anya_paths::anya::AnyaSearch;
use anya_paths::{FastAStar, GridExpansion, NO_PATH, SearchStats};

use crate::scenario::{Experiment, ScenarioError, load_scenario};
use crate::timing::measure;

/// Usage line printed for bad arguments.
pub const USAGE: &str = "usage: run <-ASTAR|-ANYA> <scenario-file> [-v]";

/// Header row of the output table.
pub const HEADER: &str =
    "exp;alg;wallt_micro;runt_micro;expanded;generated;heapops;start;target;gridcost;realcost;map";

/// Search algorithm to benchmark.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Algorithm {
    /// A* on the 8-connected lattice.
    AStar,
    /// Anya any-angle search.
    Anya,
}

impl Algorithm {
    /// Parse a command-line flag.
    pub fn from_flag(flag: &str) -> Option<Self> {
        match flag {
            "-ASTAR" => Some(Self::AStar),
            "-ANYA" => Some(Self::Anya),
            _ => None,
        }
    }

    /// Name printed in result rows.
    pub fn name(self) -> &'static str {
        match self {
            Self::AStar => "AStar",
            Self::Anya => "AnyaSearch",
        }
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Runner settings, from the command line.
#[derive(Clone, Debug, PartialEq)]
pub struct RunConfig {
    pub algorithm: Algorithm,
    pub scenario: PathBuf,
    /// Log every found path.
    pub verbose: bool,
}

impl RunConfig {
    /// Parse arguments (without the program name). Each algorithm flag is
    /// followed by a scenario path; the last one given wins.
    pub fn from_args<I>(args: I) -> Result<Self, UsageError>
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        let mut args = args.into_iter().map(Into::into);
        let mut selected = None;
        let mut verbose = false;
        while let Some(arg) = args.next() {
            if arg == "-v" {
                verbose = true;
                continue;
            }
            let Some(algorithm) = Algorithm::from_flag(&arg) else {
                return Err(UsageError::UnknownArgument(arg));
            };
            let scenario = args.next().ok_or(UsageError::MissingScenario(arg))?;
            selected = Some((algorithm, PathBuf::from(scenario)));
        }
        let (algorithm, scenario) = selected.ok_or(UsageError::MissingAlgorithm)?;
        Ok(Self {
            algorithm,
            scenario,
            verbose,
        })
    }
}

/// Bad command-line arguments.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum UsageError {
    /// No `-ASTAR` or `-ANYA` flag.
    MissingAlgorithm,
    /// An algorithm flag without a scenario path after it.
    MissingScenario(String),
    UnknownArgument(String),
}

impl fmt::Display for UsageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingAlgorithm => write!(f, "no algorithm given"),
            Self::MissingScenario(flag) => write!(f, "{flag} needs a scenario file"),
            Self::UnknownArgument(arg) => write!(f, "unknown argument \u{201c}{arg}\u{201d}"),
        }
    }
}

impl std::error::Error for UsageError {}

/// Errors that abort a run.
#[derive(Debug)]
pub enum RunError {
    Scenario(ScenarioError),
    Map { path: PathBuf, source: MapError },
    /// Writing results failed.
    Io(io::Error),
}

impl fmt::Display for RunError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Scenario(e) => write!(f, "{e}"),
            Self::Map { path, source } => write!(f, "{}: {source}", path.display()),
            Self::Io(e) => write!(f, "output: {e}"),
        }
    }
}

impl std::error::Error for RunError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Scenario(e) => Some(e),
            Self::Map { source, .. } => Some(source),
            Self::Io(e) => Some(e),
        }
    }
}

impl From<ScenarioError> for RunError {
    fn from(e: ScenarioError) -> Self {
        Self::Scenario(e)
    }
}

impl From<io::Error> for RunError {
    fn from(e: io::Error) -> Self {
        Self::Io(e)
    }
}

// ---------------------------------------------------------------------------
// Solvers
// ---------------------------------------------------------------------------

/// A reusable engine answering one query at a time.
trait Solver {
    fn solve(&mut self, start: Point, target: Point) -> Option<f64>;
    fn stats(&self) -> SearchStats;
    /// The last path found, for verbose output.
    fn last_path(&self) -> Option<Vec<Point>>;
}

impl Solver for FastAStar<GridExpansion<'_>> {
    fn solve(&mut self, start: Point, target: Point) -> Option<f64> {
        self.search(start, target)
    }

    fn stats(&self) -> SearchStats {
        FastAStar::stats(self)
    }

    fn last_path(&self) -> Option<Vec<Point>> {
        FastAStar::last_path(self).map(|p| p.vertices)
    }
}

impl Solver for AnyaSearch<'_> {
    fn solve(&mut self, start: Point, target: Point) -> Option<f64> {
        self.search(start, target)
    }

    fn stats(&self) -> SearchStats {
        AnyaSearch::stats(self)
    }

    fn last_path(&self) -> Option<Vec<Point>> {
        self.path()
    }
}

// ---------------------------------------------------------------------------
// Running
// ---------------------------------------------------------------------------

/// Where a scenario's map file lives: as written if that exists, otherwise
/// next to the scenario file.
pub fn resolve_map(scenario: &Path, map_file: &str) -> PathBuf {
    let direct = PathBuf::from(map_file);
    if direct.exists() {
        return direct;
    }
    scenario
        .parent()
        .map_or(direct, |dir| dir.join(map_file))
}

/// Load the scenario named by `config` and its map, then write the results
/// table to `out`. Returns the number of experiments run.
pub fn run(config: &RunConfig, out: &mut impl Write) -> Result<usize, RunError> {
    let experiments = load_scenario(&config.scenario)?;
    let Some(first) = experiments.first() else {
        writeln!(out, "No experiments to run; finishing.")?;
        return Ok(0);
    };

    let path = resolve_map(&config.scenario, &first.map_file);
    let grid = Grid::load(&path).map_err(|source| RunError::Map {
        path: path.clone(),
        source,
    })?;
    if (grid.width(), grid.height()) != (first.width, first.height) {
        log::warn!(
            "{} is {}x{} but the scenario says {}x{}",
            path.display(),
            grid.width(),
            grid.height(),
            first.width,
            first.height
        );
    }
    log::info!(
        "{}: {} experiments on {} with {}",
        config.scenario.display(),
        experiments.len(),
        first.map_file,
        config.algorithm
    );

    run_experiments(&grid, &experiments, config.algorithm, config.verbose, out)?;
    Ok(experiments.len())
}

/// Run every experiment on `grid` with one reused engine, writing the
/// header and one row per experiment.
pub fn run_experiments(
    grid: &Grid,
    experiments: &[Experiment],
    algorithm: Algorithm,
    verbose: bool,
    out: &mut impl Write,
) -> io::Result<()> {
    writeln!(out, "{HEADER}")?;
    match algorithm {
        Algorithm::AStar => {
            let mut solver = FastAStar::new(GridExpansion::new(grid));
            write_rows(&mut solver, algorithm, experiments, verbose, out)
        }
        Algorithm::Anya => {
            let mut solver = AnyaSearch::new(grid);
            write_rows(&mut solver, algorithm, experiments, verbose, out)
        }
    }
}

fn write_rows(
    solver: &mut impl Solver,
    algorithm: Algorithm,
    experiments: &[Experiment],
    verbose: bool,
    out: &mut impl Write,
) -> io::Result<()> {
    for (i, exp) in experiments.iter().enumerate() {
        let (s, t) = (exp.start, exp.target);
        let mut cost = None;
        let timing = measure(|| cost = solver.solve(s, t));
        let stats = solver.stats();

        if verbose {
            match solver.last_path() {
                Some(path) => {
                    let points: Vec<String> = path.iter().map(Point::to_string).collect();
                    log::debug!("exp {i}: {}", points.join(" "));
                }
                None => log::debug!("exp {i}: no path {s} -> {t}"),
            }
        }

        writeln!(
            out,
            "{i};{algorithm};{:.0};{:.3};{};{};{};({},{});({},{});{:.8};{:.8};{}",
            timing.wall_us,
            timing.avg_us,
            stats.expanded,
            stats.generated,
            stats.heap_ops,
            s.x,
            s.y,
            t.x,
            t.y,
            exp.upper_bound,
            cost.unwrap_or(NO_PATH),
            exp.map_file,
        )?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use std::fs;

    const MAP: &str = "\
type octile
height 4
width 5
map
.....
.@@..
.....
.....
";

    const SCEN: &str = "\
version 1
0\tsmall.map\t5\t4\t0\t0\t4\t0\t4.00000000
0\tsmall.map\t5\t4\t4\t3\t0\t3\t4.00000000
0\tsmall.map\t5\t4\t0\t2\t2\t3\t2.41421356
0\tsmall.map\t5\t4\t1\t1\t4\t3\t3.00000000
";

    fn costs(output: &str) -> Vec<(f64, f64)> {
        output
            .lines()
            .skip(1)
            .map(|row| {
                let fields: Vec<&str> = row.split(';').collect();
                assert_eq!(fields.len(), 12, "{row}");
                (fields[9].parse().unwrap(), fields[10].parse().unwrap())
            })
            .collect()
    }

    fn scenario_dir() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("small.map"), MAP).unwrap();
        fs::write(dir.path().join("small.scen"), SCEN).unwrap();
        dir
    }

    #[test]
    fn parse_arguments() {
        let cfg = RunConfig::from_args(["-ASTAR", "a.scen"]).unwrap();
        assert_eq!(cfg.algorithm, Algorithm::AStar);
        assert_eq!(cfg.scenario, PathBuf::from("a.scen"));
        assert!(!cfg.verbose);

        let cfg = RunConfig::from_args(["-v", "-ASTAR", "a.scen", "-ANYA", "b.scen"]).unwrap();
        assert_eq!(cfg.algorithm, Algorithm::Anya);
        assert_eq!(cfg.scenario, PathBuf::from("b.scen"));
        assert!(cfg.verbose);
    }

    #[test]
    fn bad_arguments() {
        let none: [&str; 0] = [];
        assert_eq!(RunConfig::from_args(none), Err(UsageError::MissingAlgorithm));
        assert_eq!(
            RunConfig::from_args(["-ANYA"]),
            Err(UsageError::MissingScenario("-ANYA".into()))
        );
        assert_eq!(
            RunConfig::from_args(["-DIJKSTRA", "a.scen"]),
            Err(UsageError::UnknownArgument("-DIJKSTRA".into()))
        );
        assert_eq!(RunConfig::from_args(["-v"]), Err(UsageError::MissingAlgorithm));
    }

    #[test]
    fn astar_rows_match_recorded_costs() {
        let dir = scenario_dir();
        let config = RunConfig {
            algorithm: Algorithm::AStar,
            scenario: dir.path().join("small.scen"),
            verbose: true,
        };
        let mut out = Vec::new();
        assert_eq!(run(&config, &mut out).unwrap(), 4);
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text.lines().next(), Some(HEADER));
        assert!(text.lines().skip(1).all(|row| row.contains(";AStar;")));

        let rows = costs(&text);
        assert_eq!(rows.len(), 4);
        for &(grid, real) in &rows[..3] {
            assert_abs_diff_eq!(grid, real, epsilon = 1e-6);
        }
        // (1, 1) is blocked.
        assert_eq!(rows[3].1, NO_PATH);
    }

    #[test]
    fn anya_is_never_longer_than_grid() {
        let dir = scenario_dir();
        let config = RunConfig {
            algorithm: Algorithm::Anya,
            scenario: dir.path().join("small.scen"),
            verbose: false,
        };
        let mut out = Vec::new();
        run(&config, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.lines().skip(1).all(|row| row.contains(";AnyaSearch;")));

        let rows = costs(&text);
        for &(grid, real) in &rows[..3] {
            assert!(real <= grid + 1e-6);
        }
        assert_abs_diff_eq!(rows[2].1, 5f64.sqrt(), epsilon = 1e-6);
        assert_eq!(rows[3].1, NO_PATH);
    }

    #[test]
    fn rows_carry_query_fields() {
        let grid = Grid::from_ascii(".....\n.....").unwrap();
        let exps = crate::scenario::parse_scenario("3 open.map 5 2 0 0 4 1 4.41421356\n");
        let mut out = Vec::new();
        run_experiments(&grid, &exps, Algorithm::AStar, false, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        let row: Vec<&str> = text.lines().nth(1).unwrap().split(';').collect();
        assert_eq!(row[0], "0");
        assert_eq!(row[1], "AStar");
        assert_eq!(row[7], "(0,0)");
        assert_eq!(row[8], "(4,1)");
        assert_eq!(row[9], "4.41421356");
        assert_eq!(row[11], "open.map");
        assert!(row[4].parse::<u64>().unwrap() > 0);
    }

    #[test]
    fn empty_scenario_finishes_early() {
        let dir = tempfile::tempdir().unwrap();
        let scen = dir.path().join("empty.scen");
        fs::write(&scen, "version 1\n").unwrap();
        let config = RunConfig {
            algorithm: Algorithm::Anya,
            scenario: scen,
            verbose: false,
        };
        let mut out = Vec::new();
        assert_eq!(run(&config, &mut out).unwrap(), 0);
        assert_eq!(String::from_utf8(out).unwrap(), "No experiments to run; finishing.\n");
    }

    #[test]
    fn missing_map_aborts() {
        let dir = tempfile::tempdir().unwrap();
        let scen = dir.path().join("lost.scen");
        fs::write(&scen, "0 nowhere.map 4 4 0 0 1 1 1.41421356\n").unwrap();
        let config = RunConfig {
            algorithm: Algorithm::AStar,
            scenario: scen,
            verbose: false,
        };
        let mut out = Vec::new();
        let err = run(&config, &mut out).unwrap_err();
        assert!(matches!(err, RunError::Map { .. }));
        assert!(out.is_empty());
    }
}
