//! Core constants of the tile pyramid.
//! Keeping them in a single place makes it easier to tweak engine-wide magic numbers.

/// Default square tile size in pixels.
pub const TILE_SIZE: u32 = 256;

/// Shallowest level of detail. Level 1 is the globe split into four quadrants.
pub const DEFAULT_MIN_LEVEL: u8 = 1;

/// Deepest level of detail. The global pixel space is measured at this level.
pub const DEFAULT_MAX_LEVEL: u8 = 23;

/// Hard ceiling for `max_level`; `TILE_SIZE << 30` still fits an f64 exactly.
pub const LEVEL_CEILING: u8 = 30;

/// Default window size used before the host reports a real one.
pub const DEFAULT_WINDOW_SIZE: (f64, f64) = (800.0, 600.0);

/// Bing road tiles, addressed by quadkey.
pub const DEFAULT_TILE_URL: &str = "https://ecn.t1.tiles.virtualearth.net/tiles/r{quadkey}?g=3649";

/// User agent sent with tile requests so public tile servers don't reject them.
pub const DEFAULT_USER_AGENT: &str = "quadmap/0.1.0";
