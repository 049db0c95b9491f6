//! Configuration for the tile manager and the tile fetcher
//!
//! Both structures are plain serde data so hosts can ship them as JSON next to
//! the binary, or build them in code from one of the presets.

use crate::core::constants::{
    DEFAULT_MAX_LEVEL, DEFAULT_MIN_LEVEL, DEFAULT_TILE_URL, DEFAULT_USER_AGENT,
    DEFAULT_WINDOW_SIZE, LEVEL_CEILING, TILE_SIZE,
};
use crate::core::geo::Point;
use crate::{MapError, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TileManagerConfig {
    pub min_level: u8,
    pub max_level: u8,
    pub tile_size: u32,
    /// Level shown right after construction, clamped into `[min_level, max_level]`
    pub initial_level: u8,
    pub window_width: f64,
    pub window_height: f64,
    /// Initial viewport center in global pixel coordinates
    pub center_x: f64,
    pub center_y: f64,
}

impl Default for TileManagerConfig {
    fn default() -> Self {
        Self {
            min_level: DEFAULT_MIN_LEVEL,
            max_level: DEFAULT_MAX_LEVEL,
            tile_size: TILE_SIZE,
            initial_level: DEFAULT_MIN_LEVEL,
            window_width: DEFAULT_WINDOW_SIZE.0,
            window_height: DEFAULT_WINDOW_SIZE.1,
            center_x: 0.0,
            center_y: 0.0,
        }
    }
}

impl TileManagerConfig {
    /// Shallow pyramid with an 800x600 window, handy for tests.
    pub fn for_testing() -> Self {
        Self {
            max_level: 20,
            ..Self::default()
        }
    }

    pub fn with_window(mut self, width: f64, height: f64) -> Self {
        self.window_width = width;
        self.window_height = height;
        self
    }

    pub fn with_levels(mut self, min_level: u8, max_level: u8) -> Self {
        self.min_level = min_level;
        self.max_level = max_level;
        self
    }

    pub fn with_center(mut self, center: Point) -> Self {
        self.center_x = center.x;
        self.center_y = center.y;
        self
    }

    pub fn with_initial_level(mut self, level: u8) -> Self {
        self.initial_level = level;
        self
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<()> {
        if self.min_level < 1 {
            return Err(MapError::InvalidConfig("min_level must be at least 1".into()));
        }
        if self.min_level > self.max_level {
            return Err(MapError::InvalidConfig(format!(
                "min_level {} exceeds max_level {}",
                self.min_level, self.max_level
            )));
        }
        if self.max_level > LEVEL_CEILING {
            return Err(MapError::InvalidConfig(format!(
                "max_level {} exceeds the supported ceiling {}",
                self.max_level, LEVEL_CEILING
            )));
        }
        if !self.tile_size.is_power_of_two() {
            return Err(MapError::InvalidConfig(format!(
                "tile_size {} is not a power of two",
                self.tile_size
            )));
        }
        if !(self.window_width >= 0.0 && self.window_height >= 0.0) {
            return Err(MapError::InvalidConfig(format!(
                "window size {}x{} must be non-negative",
                self.window_width, self.window_height
            )));
        }
        Ok(())
    }

    /// Side length of the global pixel space (the deepest level).
    pub fn global_pixel_size(&self) -> f64 {
        self.tile_size as f64 * 2_f64.powi(self.max_level as i32)
    }

    /// Half the global pixel size; roots cover `[-half, +half]` on both axes.
    pub fn half_extent(&self) -> f64 {
        self.global_pixel_size() / 2.0
    }

    /// Global pixels per screen pixel at `level`: `2^(max_level - level)`.
    pub fn scale_for(&self, level: u8) -> f64 {
        2_f64.powi(self.max_level as i32 - level as i32)
    }

    pub fn clamp_level(&self, level: u8) -> u8 {
        level.clamp(self.min_level, self.max_level)
    }

    pub fn center(&self) -> Point {
        Point::new(self.center_x, self.center_y)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TileFetchConfig {
    /// URL template; `{quadkey}` is replaced with the node's path key
    pub url_template: String,
    pub user_agent: String,
}

impl Default for TileFetchConfig {
    fn default() -> Self {
        Self {
            url_template: DEFAULT_TILE_URL.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl TileFetchConfig {
    pub fn with_url_template(mut self, template: impl Into<String>) -> Self {
        self.url_template = template.into();
        self
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// The URL template must carry a `{quadkey}` placeholder.
    pub fn validate(&self) -> Result<()> {
        if !self.url_template.contains("{quadkey}") {
            return Err(MapError::InvalidConfig(format!(
                "url_template '{}' has no {{quadkey}} placeholder",
                self.url_template
            )));
        }
        Ok(())
    }
}
