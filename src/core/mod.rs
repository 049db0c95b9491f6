//! Geometry, geographic conversion and configuration shared by the tile tree.

pub mod bounds;
pub mod config;
pub mod constants;
pub mod geo;

pub use bounds::{Boundary, Quadrant};
pub use config::{TileFetchConfig, TileManagerConfig};
pub use geo::{BingTileSystem, CoordinateTransform, LonLat, Point};
