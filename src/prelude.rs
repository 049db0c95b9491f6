//! Prelude module for common quadmap types and traits
//!
//! Re-exports what a host needs to drive a map with `use quadmap::prelude::*;`

pub use crate::core::{
    bounds::{Boundary, Quadrant},
    config::{TileFetchConfig, TileManagerConfig},
    constants::{DEFAULT_MAX_LEVEL, DEFAULT_MIN_LEVEL, TILE_SIZE},
    geo::{BingTileSystem, CoordinateTransform, LonLat, Point},
};

pub use crate::tiles::{
    FetchError, HttpTileFetcher, MemoryTileFetcher, NodeId, NodeStatus, QuadKey, TileFetcher,
    TileImage, TileManager, TreeStats,
};

pub use crate::rendering::{
    DrawCommand, DrawableTile, FrameStats, RenderContext, ScreenRect, TileRenderer,
};

#[cfg(feature = "render")]
pub use crate::rendering::RasterCanvas;

pub use crate::runtime::{runtime, spawn, AsyncHandle, AsyncSpawner};

pub use crate::{MapError, Result};

pub use std::sync::Arc;
pub use std::time::Duration;
