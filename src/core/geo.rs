use crate::core::constants::TILE_SIZE;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Web Mercator latitude limit, where the square map ends.
const MAX_LATITUDE: f64 = 85.05112878;

/// Represents a point in screen or global pixel coordinates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn add(&self, other: &Point) -> Point {
        Point::new(self.x + other.x, self.y + other.y)
    }

    pub fn multiply(&self, scalar: f64) -> Point {
        Point::new(self.x * scalar, self.y * scalar)
    }
}

impl Default for Point {
    fn default() -> Self {
        Self::new(0.0, 0.0)
    }
}

/// Represents a geographical coordinate, longitude first
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LonLat {
    pub lon: f64,
    pub lat: f64,
}

impl LonLat {
    pub fn new(lon: f64, lat: f64) -> Self {
        Self { lon, lat }
    }

    /// Validates that the coordinates are within valid ranges
    pub fn is_valid(&self) -> bool {
        self.lat >= -90.0 && self.lat <= 90.0 && self.lon >= -180.0 && self.lon <= 180.0
    }
}

impl Default for LonLat {
    fn default() -> Self {
        Self::new(0.0, 0.0)
    }
}

/// Conversion between the global pixel space and geographic coordinates.
///
/// The pixel space is the one used by [`Boundary`](crate::core::bounds::Boundary):
/// measured at `max_level`, centred on the origin, north-up.
pub trait CoordinateTransform: Send + Sync {
    /// Transform global pixel coordinates to longitude/latitude
    fn pixel_to_lon_lat(&self, x: f64, y: f64, max_level: u8) -> LonLat;

    /// Transform longitude/latitude to global pixel coordinates
    fn lon_lat_to_pixel(&self, lon_lat: LonLat, max_level: u8) -> Point;
}

/// Spherical Mercator as used by the Bing Maps tile system.
///
/// `tile_size` must match the tile size the pixel space was built with.
#[derive(Debug, Clone, Copy)]
pub struct BingTileSystem {
    tile_size: u32,
}

impl BingTileSystem {
    pub fn new(tile_size: u32) -> Self {
        Self { tile_size }
    }

    pub fn tile_size(&self) -> u32 {
        self.tile_size
    }

    fn map_size(&self, max_level: u8) -> f64 {
        (self.tile_size as f64) * 2_f64.powi(max_level as i32)
    }
}

impl Default for BingTileSystem {
    fn default() -> Self {
        Self::new(TILE_SIZE)
    }
}

impl CoordinateTransform for BingTileSystem {
    fn pixel_to_lon_lat(&self, x: f64, y: f64, max_level: u8) -> LonLat {
        let map_size = self.map_size(max_level);
        let half = map_size / 2.0;
        let nx = x.clamp(-half, half) / map_size;
        let ny = y.clamp(-half, half) / map_size;

        let lat = 90.0 - 360.0 * (-ny * 2.0 * PI).exp().atan() / PI;
        let lon = 360.0 * nx;
        LonLat::new(lon, lat)
    }

    fn lon_lat_to_pixel(&self, lon_lat: LonLat, max_level: u8) -> Point {
        let map_size = self.map_size(max_level);
        let lat = lon_lat.lat.clamp(-MAX_LATITUDE, MAX_LATITUDE);
        let lon = lon_lat.lon.clamp(-180.0, 180.0);

        let sin_lat = lat.to_radians().sin();
        let nx = lon / 360.0;
        let ny = ((1.0 + sin_lat) / (1.0 - sin_lat)).ln() / (4.0 * PI);
        Point::new(nx * map_size, ny * map_size)
    }
}
