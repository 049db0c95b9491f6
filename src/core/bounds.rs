use crate::core::geo::Point;
use serde::{Deserialize, Serialize};

/// One of the four equal subdivisions of a boundary.
///
/// The discriminant is the quadkey digit appended to a parent's path key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Quadrant {
    NorthWest = 0,
    NorthEast = 1,
    SouthWest = 2,
    SouthEast = 3,
}

impl Quadrant {
    /// All quadrants in quadkey digit order.
    pub const ALL: [Quadrant; 4] = [
        Quadrant::NorthWest,
        Quadrant::NorthEast,
        Quadrant::SouthWest,
        Quadrant::SouthEast,
    ];

    /// Quadkey digit for this quadrant.
    pub fn digit(self) -> char {
        match self {
            Quadrant::NorthWest => '0',
            Quadrant::NorthEast => '1',
            Quadrant::SouthWest => '2',
            Quadrant::SouthEast => '3',
        }
    }

    /// Parses a quadkey digit.
    pub fn from_digit(digit: char) -> Option<Self> {
        match digit {
            '0' => Some(Quadrant::NorthWest),
            '1' => Some(Quadrant::NorthEast),
            '2' => Some(Quadrant::SouthWest),
            '3' => Some(Quadrant::SouthEast),
            _ => None,
        }
    }
}

/// Axis-aligned rectangle in the global pixel space of the deepest level.
///
/// North grows upward, so `north >= south` and `east >= west` for every
/// boundary produced by subdivision.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Boundary {
    pub east: f64,
    pub south: f64,
    pub west: f64,
    pub north: f64,
}

impl Boundary {
    /// Creates a boundary from its four edges, in east/south/west/north order.
    pub fn new(east: f64, south: f64, west: f64, north: f64) -> Self {
        Self {
            east,
            south,
            west,
            north,
        }
    }

    /// Creates a boundary centred on `center` with the given half extents.
    pub fn from_center(center: Point, half_width: f64, half_height: f64) -> Self {
        Self::new(
            center.x + half_width,
            center.y - half_height,
            center.x - half_width,
            center.y + half_height,
        )
    }

    /// The four level-1 quadrants covering `[-half, +half]` on both axes,
    /// in quadkey digit order.
    pub fn root_quadrants(half: f64) -> [Boundary; 4] {
        Boundary::new(half, -half, -half, half).split()
    }

    pub fn width(&self) -> f64 {
        self.east - self.west
    }

    pub fn height(&self) -> f64 {
        self.north - self.south
    }

    pub fn center(&self) -> Point {
        Point::new(
            (self.west + self.east) / 2.0,
            (self.south + self.north) / 2.0,
        )
    }

    /// Checks if the boundary contains a point, edges included
    pub fn contains(&self, point: &Point) -> bool {
        point.x >= self.west
            && point.x <= self.east
            && point.y >= self.south
            && point.y <= self.north
    }

    /// AABB overlap test. Touching edges count as intersecting.
    pub fn intersects(&self, other: &Boundary) -> bool {
        !(self.east < other.west
            || self.west > other.east
            || self.north < other.south
            || self.south > other.north)
    }

    /// Returns one quadrant of this boundary, halving width and height.
    pub fn quadrant(&self, quadrant: Quadrant) -> Boundary {
        // Both halves share one midpoint so siblings meet without a gap.
        let mid_x = self.west + self.width() / 2.0;
        let mid_y = self.north - self.height() / 2.0;
        match quadrant {
            Quadrant::NorthWest => Boundary::new(mid_x, mid_y, self.west, self.north),
            Quadrant::NorthEast => Boundary::new(self.east, mid_y, mid_x, self.north),
            Quadrant::SouthWest => Boundary::new(mid_x, self.south, self.west, mid_y),
            Quadrant::SouthEast => Boundary::new(self.east, self.south, mid_x, mid_y),
        }
    }

    /// Splits the boundary into its four quadrants, in quadkey digit order.
    pub fn split(&self) -> [Boundary; 4] {
        Quadrant::ALL.map(|q| self.quadrant(q))
    }

    /// Smallest boundary enclosing both.
    pub fn union(&self, other: &Boundary) -> Boundary {
        Boundary::new(
            self.east.max(other.east),
            self.south.min(other.south),
            self.west.min(other.west),
            self.north.max(other.north),
        )
    }

    pub fn area(&self) -> f64 {
        if self.is_valid() {
            self.width() * self.height()
        } else {
            0.0
        }
    }

    /// Checks if the edges are ordered (east >= west, north >= south)
    pub fn is_valid(&self) -> bool {
        self.east >= self.west && self.north >= self.south
    }
}
