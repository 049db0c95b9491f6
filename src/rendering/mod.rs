pub mod context;
#[cfg(feature = "render")]
pub mod raster;

// Re-export main types
pub use context::{DrawCommand, DrawableTile, FrameStats, RenderContext, ScreenRect, TileRenderer};
#[cfg(feature = "render")]
pub use raster::RasterCanvas;
