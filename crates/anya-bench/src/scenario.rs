//! movingai scenario files.
//!
//! A scenario is an optional `version` line followed by one experiment per
//! line: `bucket map width height start_x start_y goal_x goal_y optimal`,
//! separated by tabs or spaces.

use std::fmt;
use std::io;
use std::path::Path;

use anya_core::Point;

/// One query from a scenario file.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Experiment {
    pub bucket: u32,
    /// Map file name as written in the scenario.
    pub map_file: String,
    pub width: i32,
    pub height: i32,
    pub start: Point,
    pub target: Point,
    /// Recorded optimal cost (the octile grid distance for movingai sets).
    pub upper_bound: f64,
}

/// Errors that can occur when loading a scenario.
#[derive(Debug)]
pub enum ScenarioError {
    /// The file could not be read.
    Io(io::Error),
}

impl fmt::Display for ScenarioError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "scenario: {e}"),
        }
    }
}

impl std::error::Error for ScenarioError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
        }
    }
}

impl From<io::Error> for ScenarioError {
    fn from(e: io::Error) -> Self {
        Self::Io(e)
    }
}

/// Read and parse a scenario file.
pub fn load_scenario(path: impl AsRef<Path>) -> Result<Vec<Experiment>, ScenarioError> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path)?;
    let experiments = parse_scenario(&text);
    log::debug!("loaded {} experiments from {}", experiments.len(), path.display());
    Ok(experiments)
}

/// Parse scenario text. Malformed lines are logged and skipped.
pub fn parse_scenario(text: &str) -> Vec<Experiment> {
    let mut lines = text.lines().enumerate().peekable();
    if lines
        .peek()
        .is_some_and(|(_, l)| l.trim_start().starts_with("version"))
    {
        lines.next();
    }
    lines
        .filter(|(_, l)| !l.trim().is_empty())
        .filter_map(|(i, line)| {
            let exp = parse_line(line);
            if exp.is_none() {
                log::warn!("skipping malformed scenario line {}: {line:?}", i + 1);
            }
            exp
        })
        .collect()
}

fn parse_line(line: &str) -> Option<Experiment> {
    let mut fields: Vec<&str> = line.split('\t').map(str::trim).collect();
    if fields.len() < 9 {
        fields = line.split_whitespace().collect();
    }
    let &[bucket, map_file, width, height, sx, sy, tx, ty, upper, ..] = fields.as_slice() else {
        return None;
    };
    Some(Experiment {
        bucket: bucket.parse().ok()?,
        map_file: map_file.to_string(),
        width: width.parse().ok()?,
        height: height.parse().ok()?,
        start: Point::new(sx.parse().ok()?, sy.parse().ok()?),
        target: Point::new(tx.parse().ok()?, ty.parse().ok()?),
        upper_bound: upper.parse().ok()?,
    })
}
