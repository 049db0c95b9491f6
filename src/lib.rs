//! # quadmap
//!
//! A quadtree tile manager for pannable, zoomable raster maps.
//!
//! The globe is split into four level-1 quadrants and refined on demand:
//! for the current viewport and level the [`TileManager`] decides which
//! tiles must exist, which must be fetched, which can be dropped and which
//! are drawable right now. Fetches run concurrently on the async runtime
//! and report back over a single ordered channel that the owner of the
//! manager drains.

pub mod core;
pub mod prelude;
pub mod rendering;
pub mod runtime;
pub mod tiles;
pub use crate::core::constants;

// Re-export public API
pub use core::{
    bounds::{Boundary, Quadrant},
    config::{TileFetchConfig, TileManagerConfig},
    geo::{BingTileSystem, CoordinateTransform, LonLat, Point},
};

pub use tiles::{
    fetcher::{FetchError, HttpTileFetcher, MemoryTileFetcher, TileFetcher, TileImage},
    key::QuadKey,
    manager::TileManager,
    node::{NodeId, NodeStatus},
};

pub use rendering::{DrawableTile, FrameStats, RenderContext, TileRenderer};

/// Result type used throughout the library
pub type Result<T> = std::result::Result<T, MapError>;

/// Common error types
#[derive(Debug, thiserror::Error)]
pub enum MapError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Render error: {0}")]
    Render(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid quadkey: {0:?}")]
    InvalidQuadKey(String),
}

/// Error type alias for convenience
pub type Error = MapError;

/// Installs `env_logger`, defaulting to debug output for this crate.
///
/// `RUST_LOG` still takes precedence. Calling it twice is harmless.
#[cfg(feature = "debug")]
pub fn init_logging() {
    let env = env_logger::Env::default().default_filter_or("quadmap=debug");
    let _ = env_logger::Builder::from_env(env).try_init();
}
