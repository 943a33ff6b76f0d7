//! Loading grids from text.
//!
//! Two formats are understood: the movingai octile map format (a small
//! `key value` header, the `map` keyword, then one character per cell) and a
//! bare block of equal-width rows for hand-drawn maps.

use std::fmt;
use std::io;
use std::path::Path;

use crate::grid::Grid;

/// Characters that mark a blocked cell. Everything else is traversable.
pub const OBSTACLE_TILES: &[char] = &['@', 'O', 'T', 'W', 'S'];

/// Whether map character `ch` marks a blocked cell.
#[inline]
pub fn is_obstacle_tile(ch: char) -> bool {
    OBSTACLE_TILES.contains(&ch)
}

impl Grid {
    /// Read and parse a movingai map file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, MapError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let grid = Self::parse_map(&text)?;
        log::debug!(
            "loaded map {}: {}x{}",
            path.display(),
            grid.width(),
            grid.height()
        );
        Ok(grid)
    }

    /// Parse the contents of a movingai map file.
    ///
    /// The header holds `type`, `height` and `width` in any order; the type
    /// must be `octile` and both dimensions nonzero. Whitespace between tiles
    /// is ignored, but the tile count must equal `height * width`.
    pub fn parse_map(text: &str) -> Result<Self, MapError> {
        let mut lines = text.lines().map(str::trim).filter(|l| !l.is_empty());

        let mut kind = None;
        let mut height = None;
        let mut width = None;
        for _ in 0..3 {
            let line = lines.next().ok_or(MapError::MissingHeader)?;
            let mut parts = line.split_whitespace();
            let (Some(key), Some(value), None) = (parts.next(), parts.next(), parts.next()) else {
                return Err(MapError::InvalidHeader(line.to_string()));
            };
            match key {
                "type" => kind = Some(value.to_string()),
                "height" => height = Some(parse_dimension(line, value)?),
                "width" => width = Some(parse_dimension(line, value)?),
                _ => return Err(MapError::InvalidHeader(line.to_string())),
            }
        }
        let (Some(kind), Some(height), Some(width)) = (kind, height, width) else {
            return Err(MapError::MissingHeader);
        };
        if kind != "octile" {
            return Err(MapError::UnsupportedType(kind));
        }
        if height == 0 || width == 0 {
            return Err(MapError::ZeroDimension);
        }
        match lines.next() {
            Some("map") => {}
            Some(other) => return Err(MapError::InvalidHeader(other.to_string())),
            None => return Err(MapError::MissingHeader),
        }

        let tiles: Vec<bool> = lines
            .flat_map(str::chars)
            .filter(|c| !c.is_whitespace())
            .map(|c| !is_obstacle_tile(c))
            .collect();
        let expected = width as usize * height as usize;
        if tiles.len() != expected {
            return Err(MapError::TileCountMismatch {
                expected,
                found: tiles.len(),
            });
        }
        Ok(Self::from_fn(width, height, |p| {
            tiles[p.y as usize * width as usize + p.x as usize]
        }))
    }

    /// Build a grid from rows of map characters with no header.
    ///
    /// Leading and trailing whitespace is trimmed from every row. All rows
    /// must have the same width.
    pub fn from_ascii(text: &str) -> Result<Self, MapError> {
        let rows: Vec<&str> = text
            .trim()
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .collect();
        let width = rows.first().map_or(0, |r| r.chars().count());
        for (row, line) in rows.iter().enumerate() {
            let found = line.chars().count();
            if found != width {
                return Err(MapError::InconsistentWidth {
                    row,
                    expected: width,
                    found,
                });
            }
        }
        let cells: Vec<Vec<bool>> = rows
            .iter()
            .map(|r| r.chars().map(|c| !is_obstacle_tile(c)).collect())
            .collect();
        Ok(Self::from_fn(width as i32, rows.len() as i32, |p| {
            cells[p.y as usize][p.x as usize]
        }))
    }
}

fn parse_dimension(line: &str, value: &str) -> Result<i32, MapError> {
    value
        .parse::<i32>()
        .ok()
        .filter(|v| *v >= 0)
        .ok_or_else(|| MapError::InvalidHeader(line.to_string()))
}

/// Errors that can occur when loading a map.
#[derive(Debug)]
pub enum MapError {
    /// The map file could not be read.
    Io(io::Error),
    /// The header ended before `type`, `height`, `width` and `map` were seen.
    MissingHeader,
    /// A header line could not be understood.
    InvalidHeader(String),
    /// The map type is not `octile`.
    UnsupportedType(String),
    /// Height or width is zero.
    ZeroDimension,
    /// A row of a headerless map differs in width from the first row.
    InconsistentWidth {
        row: usize,
        expected: usize,
        found: usize,
    },
    /// The number of tiles does not match the declared dimensions.
    TileCountMismatch { expected: usize, found: usize },
}

impl fmt::Display for MapError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "map: {e}"),
            Self::MissingHeader => write!(f, "map: incomplete header"),
            Self::InvalidHeader(line) => write!(f, "map: invalid header line \u{201c}{line}\u{201d}"),
            Self::UnsupportedType(kind) => write!(f, "map: unsupported type \u{201c}{kind}\u{201d}"),
            Self::ZeroDimension => write!(f, "map: height and width must be nonzero"),
            Self::InconsistentWidth {
                row,
                expected,
                found,
            } => write!(f, "map: row {row} has width {found}, expected {expected}"),
            Self::TileCountMismatch { expected, found } => {
                write!(f, "map: expected {expected} tiles, found {found}")
            }
        }
    }
}

impl std::error::Error for MapError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for MapError {
    fn from(e: io::Error) -> Self {
        Self::Io(e)
    }
}
