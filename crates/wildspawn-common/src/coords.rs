//! Coordinate types: world points, rectangles and compass directions.

use serde::{Deserialize, Serialize};

/// A location on a map, in tiles. `z` is elevation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct WorldPoint {
    /// X coordinate in tiles
    pub x: i32,
    /// Y coordinate in tiles
    pub y: i32,
    /// Elevation
    pub z: i32,
}

impl WorldPoint {
    /// Creates a new world point.
    #[must_use]
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// Returns this point shifted by a planar offset.
    #[must_use]
    pub const fn offset(self, dx: i32, dy: i32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
            z: self.z,
        }
    }

    /// Planar (x/y) Euclidean distance to another point.
    #[must_use]
    pub fn distance_2d(self, other: Self) -> f64 {
        let dx = f64::from(self.x - other.x);
        let dy = f64::from(self.y - other.y);
        (dx * dx + dy * dy).sqrt()
    }

    /// Whether `other` lies within `range` tiles on the x/y plane.
    #[must_use]
    pub fn in_range(self, other: Self, range: i32) -> bool {
        let dx = i64::from(self.x - other.x);
        let dy = i64::from(self.y - other.y);
        let r = i64::from(range);
        dx * dx + dy * dy <= r * r
    }
}

impl std::fmt::Display for WorldPoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}

/// Axis-aligned rectangle with inclusive bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rect {
    /// Left edge
    pub x1: i32,
    /// Top edge
    pub y1: i32,
    /// Right edge (inclusive)
    pub x2: i32,
    /// Bottom edge (inclusive)
    pub y2: i32,
}

impl Rect {
    /// Creates a rectangle, normalizing the corner order.
    #[must_use]
    pub fn new(x1: i32, y1: i32, x2: i32, y2: i32) -> Self {
        Self {
            x1: x1.min(x2),
            y1: y1.min(y2),
            x2: x1.max(x2),
            y2: y1.max(y2),
        }
    }

    /// Whether the point's x/y lies inside the rectangle.
    #[must_use]
    pub const fn contains(&self, p: WorldPoint) -> bool {
        p.x >= self.x1 && p.x <= self.x2 && p.y >= self.y1 && p.y <= self.y2
    }
}

/// The eight compass and diagonal directions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Direction {
    /// Towards negative y.
    #[default]
    North,
    /// North-east diagonal.
    NorthEast,
    /// Towards positive x.
    East,
    /// South-east diagonal.
    SouthEast,
    /// Towards positive y.
    South,
    /// South-west diagonal.
    SouthWest,
    /// Towards negative x.
    West,
    /// North-west diagonal.
    NorthWest,
}

impl Direction {
    /// All directions in clockwise order starting at north.
    pub const ALL: [Self; 8] = [
        Self::North,
        Self::NorthEast,
        Self::East,
        Self::SouthEast,
        Self::South,
        Self::SouthWest,
        Self::West,
        Self::NorthWest,
    ];

    /// Unit step `(dx, dy)` for this direction.
    #[must_use]
    pub const fn delta(self) -> (i32, i32) {
        match self {
            Self::North => (0, -1),
            Self::NorthEast => (1, -1),
            Self::East => (1, 0),
            Self::SouthEast => (1, 1),
            Self::South => (0, 1),
            Self::SouthWest => (-1, 1),
            Self::West => (-1, 0),
            Self::NorthWest => (-1, -1),
        }
    }

    /// Step perpendicular to this direction (rotated a quarter turn clockwise).
    #[must_use]
    pub const fn perpendicular(self) -> (i32, i32) {
        let (dx, dy) = self.delta();
        (-dy, dx)
    }
}
