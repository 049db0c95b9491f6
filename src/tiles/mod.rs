pub mod dispatch;
pub mod fetcher;
pub mod key;
pub mod manager;
pub mod node;
pub mod tree;

// Re-exports for convenience
pub use dispatch::{FetchCompletion, FetchDispatcher, FetchHandle, FetchOutcome, FetchScheduler};
pub use fetcher::{
    BingMapsSource, FetchError, HttpTileFetcher, MemoryTileFetcher, PassthroughDecoder,
    PixelFormat, TileDecoder, TileFetcher, TileImage, TileSource,
};
#[cfg(feature = "render")]
pub use fetcher::RgbaDecoder;
pub use key::QuadKey;
pub use manager::TileManager;
pub use node::{NodeId, NodeStatus, TileNode};
pub use tree::{CompletionEffect, TileTree, TreeStats};
