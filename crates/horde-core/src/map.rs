//! Static map descriptions parsed from text.
//!
//! A map is a rectangle of characters, one row per line. [`BLOCKED`] marks a
//! wall, [`SPAWN`] marks a walkable tile that seekers may spawn on, and every
//! other character is plain walkable floor. Cells are numbered row-major from
//! the top-left corner.

use thiserror::Error;

/// Character marking a blocked tile.
pub const BLOCKED: char = '#';

/// Character marking a walkable spawn tile.
pub const SPAWN: char = 'Z';

/// Walkability and spawn layout of a map, read once at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MapDescription {
    width: usize,
    height: usize,
    blocked: Vec<bool>,
    spawns: Vec<usize>,
}

impl MapDescription {
    /// Parse a map, inferring its dimensions from the text.
    ///
    /// Every line must have the same width. A single trailing newline is
    /// ignored, as are carriage returns before a newline.
    pub fn parse(s: &str) -> Result<Self, MapError> {
        let body = s.strip_suffix('\n').unwrap_or(s);
        if body.is_empty() {
            return Err(MapError::Empty);
        }

        let mut width = None;
        let mut height = 0;
        let mut cells = Vec::with_capacity(body.len());
        for (row, line) in body.split('\n').enumerate() {
            let line = line.strip_suffix('\r').unwrap_or(line);
            let found = line.chars().count();
            match width {
                None => width = Some(found),
                Some(expected) if expected != found => {
                    return Err(MapError::RaggedRow {
                        row,
                        expected,
                        found,
                    });
                }
                Some(_) => {}
            }
            cells.extend(line.chars());
            height += 1;
        }

        let width = width.unwrap_or(0);
        if width == 0 {
            return Err(MapError::Empty);
        }
        Ok(Self::from_cells(width, height, &cells))
    }

    /// Parse a map whose dimensions are declared up front.
    ///
    /// Line breaks are ignored; the remaining characters must number exactly
    /// `width * height`.
    pub fn with_dimensions(width: usize, height: usize, s: &str) -> Result<Self, MapError> {
        let cells: Vec<char> = s.chars().filter(|&c| c != '\n' && c != '\r').collect();
        let expected = width.checked_mul(height).unwrap_or(usize::MAX);
        if cells.len() != expected || expected == 0 {
            return Err(MapError::DimensionMismatch {
                width,
                height,
                expected,
                found: cells.len(),
            });
        }
        Ok(Self::from_cells(width, height, &cells))
    }

    fn from_cells(width: usize, height: usize, cells: &[char]) -> Self {
        let blocked: Vec<bool> = cells.iter().map(|&c| c == BLOCKED).collect();
        let spawns: Vec<usize> = cells
            .iter()
            .enumerate()
            .filter(|&(_, &c)| c == SPAWN)
            .map(|(i, _)| i)
            .collect();
        log::debug!(
            "parsed {width}x{height} map: {} blocked, {} spawn tiles",
            blocked.iter().filter(|&&b| b).count(),
            spawns.len()
        );
        Self {
            width,
            height,
            blocked,
            spawns,
        }
    }

    /// Number of tiles per row.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Number of rows.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Total number of tiles.
    pub fn len(&self) -> usize {
        self.blocked.len()
    }

    /// Whether the map has no tiles. Parsed maps never are.
    pub fn is_empty(&self) -> bool {
        self.blocked.is_empty()
    }

    /// Blocked flag per tile, row-major.
    pub fn blocked(&self) -> &[bool] {
        &self.blocked
    }

    /// Indices of spawn tiles in ascending order.
    pub fn spawns(&self) -> &[usize] {
        &self.spawns
    }
}

/// Errors detected while reading a map. All of them are fatal at startup.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MapError {
    /// The text contains no tiles.
    #[error("map is empty")]
    Empty,
    /// A row is wider or narrower than the first one.
    #[error("map row {row} has {found} tiles, expected {expected}")]
    RaggedRow {
        row: usize,
        expected: usize,
        found: usize,
    },
    /// The declared dimensions disagree with the number of tiles.
    #[error("map declares {width}x{height} ({expected} tiles) but contains {found}")]
    DimensionMismatch {
        width: usize,
        height: usize,
        expected: usize,
        found: usize,
    },
}
