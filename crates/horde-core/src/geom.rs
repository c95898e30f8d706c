//! Integer geometry for tile maps.
//!
//! World positions are [`Point`]s in world units; tile coordinates reuse the
//! same type measured in tiles. Y grows down.

use std::fmt;
use std::ops::{Add, AddAssign, Div, Mul, Sub};

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const ZERO: Self = Self { x: 0, y: 0 };

    #[inline]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    #[inline]
    pub const fn shift(self, dx: i32, dy: i32) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }

    /// Squared Euclidean distance, widened so world-unit maps cannot overflow.
    #[inline]
    pub fn distance_sq(self, other: Point) -> i64 {
        let dx = i64::from(self.x) - i64::from(other.x);
        let dy = i64::from(self.y) - i64::from(other.y);
        dx * dx + dy * dy
    }
}

/// Row-major, matching tile index order.
impl Ord for Point {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        (self.y, self.x).cmp(&(other.y, other.x))
    }
}

impl PartialOrd for Point {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

impl Add for Point {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        self.shift(rhs.x, rhs.y)
    }
}

impl AddAssign for Point {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl Sub for Point {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        self.shift(-rhs.x, -rhs.y)
    }
}

/// Scale both axes, e.g. a tile coordinate by the tile size.
impl Mul<i32> for Point {
    type Output = Self;
    fn mul(self, k: i32) -> Self {
        Self::new(self.x * k, self.y * k)
    }
}

/// Truncating division of both axes, e.g. a world position into tile units.
impl Div<i32> for Point {
    type Output = Self;
    fn div(self, k: i32) -> Self {
        Self::new(self.x / k, self.y / k)
    }
}

/// A cardinal heading. Movement on the grid never goes diagonal.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Direction {
    North,
    South,
    East,
    West,
}

impl Direction {
    /// Neighbour enumeration order.
    pub const ALL: [Direction; 4] = [Self::North, Self::South, Self::East, Self::West];

    /// One tile in this direction.
    #[inline]
    pub const fn offset(self) -> Point {
        match self {
            Self::North => Point::new(0, -1),
            Self::South => Point::new(0, 1),
            Self::East => Point::new(1, 0),
            Self::West => Point::new(-1, 0),
        }
    }

    /// Heading of a move by `delta`, or `None` when it is diagonal or zero.
    pub fn from_delta(delta: Point) -> Option<Self> {
        match (delta.x.signum(), delta.y.signum()) {
            (0, -1) => Some(Self::North),
            (0, 1) => Some(Self::South),
            (1, 0) => Some(Self::East),
            (-1, 0) => Some(Self::West),
            _ => None,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::North => "north",
            Self::South => "south",
            Self::East => "east",
            Self::West => "west",
        })
    }
}

/// Tile-coordinate bounds, `min` inclusive and `max` exclusive.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Range {
    pub min: Point,
    pub max: Point,
}

impl Range {
    /// Bounds of a `width` by `height` grid anchored at the origin.
    pub const fn sized(width: i32, height: i32) -> Self {
        Self {
            min: Point::ZERO,
            max: Point::new(width, height),
        }
    }

    pub fn contains(self, p: Point) -> bool {
        (self.min.x..self.max.x).contains(&p.x) && (self.min.y..self.max.y).contains(&p.y)
    }

    /// Every point, in row-major order.
    pub fn iter(self) -> impl Iterator<Item = Point> {
        (self.min.y..self.max.y)
            .flat_map(move |y| (self.min.x..self.max.x).map(move |x| Point::new(x, y)))
    }
}
