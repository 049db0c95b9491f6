use crate::core::bounds::Boundary;
use crate::core::geo::Point;
use crate::tiles::fetcher::TileImage;
use crate::tiles::key::QuadKey;
use crate::tiles::node::TileNode;
use crate::{MapError, Result};
use serde::{Deserialize, Serialize};

/// Axis-aligned rectangle in window pixels, y growing downward
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ScreenRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl ScreenRect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn min(&self) -> Point {
        Point::new(self.x, self.y)
    }

    pub fn max(&self) -> Point {
        Point::new(self.x + self.width, self.y + self.height)
    }

    /// Overlap with another rectangle, or `None` if they don't touch.
    pub fn intersection(&self, other: &ScreenRect) -> Option<ScreenRect> {
        let min_x = self.x.max(other.x);
        let min_y = self.y.max(other.y);
        let max_x = (self.x + self.width).min(other.x + other.width);
        let max_y = (self.y + self.height).min(other.y + other.height);
        if max_x <= min_x || max_y <= min_y {
            return None;
        }
        Some(ScreenRect::new(min_x, min_y, max_x - min_x, max_y - min_y))
    }
}

/// One entry of the per-frame draw list handed to a [`TileRenderer`].
#[derive(Debug, Clone)]
pub struct DrawableTile {
    pub key: QuadKey,
    pub level: u8,
    pub boundary: Boundary,
    pub screen: ScreenRect,
    pub image: TileImage,
    /// `2^(target_level - level)`; anything above 1 is an upscaled placeholder
    pub scale_factor: f64,
}

impl DrawableTile {
    /// Places `node` on screen for the given view.
    ///
    /// `scale` is global pixels per screen pixel at `target_level`. Returns
    /// `None` for nodes that carry no image.
    pub fn from_node(
        node: &TileNode,
        view: &Boundary,
        scale: f64,
        target_level: u8,
        tile_size: u32,
    ) -> Option<Self> {
        let image = node.image()?.clone();
        let boundary = *node.boundary();
        let scale_factor = 2_f64.powi(target_level as i32 - node.level() as i32);
        let side = tile_size as f64 * scale_factor;
        let screen = ScreenRect::new(
            (boundary.west - view.west) / scale,
            (view.north - boundary.north) / scale,
            side,
            side,
        );
        Some(Self {
            key: node.key().clone(),
            level: node.level(),
            boundary,
            screen,
            image,
            scale_factor,
        })
    }

    pub fn is_placeholder(&self) -> bool {
        self.scale_factor > 1.0
    }
}

/// Per-frame counters returned by [`crate::tiles::TileManager::render`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameStats {
    pub tiles_drawn: usize,
    pub placeholders: usize,
    pub failed: usize,
}

/// Paints drawable tiles. Implemented by the host's drawing layer.
pub trait TileRenderer {
    fn begin_frame(&mut self, _window: (f64, f64)) -> Result<()> {
        Ok(())
    }

    fn draw_tile(&mut self, tile: &DrawableTile) -> Result<()>;

    fn end_frame(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Commands recorded by [`RenderContext`]
#[derive(Debug, Clone)]
pub enum DrawCommand {
    Tile {
        key: QuadKey,
        image: TileImage,
        bounds: ScreenRect,
        scale_factor: f64,
    },
}

/// Headless renderer that queues draw commands instead of painting them.
#[derive(Debug, Default)]
pub struct RenderContext {
    pub width: f64,
    pub height: f64,
    /// Drawing primitives queue, consumed by whatever actually paints
    pub drawing_queue: Vec<DrawCommand>,
    /// Clip tiles to the window rectangle
    pub clipping_enabled: bool,
}

impl RenderContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_clipping(mut self) -> Self {
        self.clipping_enabled = true;
        self
    }

    pub fn drawing_queue(&self) -> &[DrawCommand] {
        &self.drawing_queue
    }

    pub fn clear_queue(&mut self) {
        self.drawing_queue.clear();
    }

    fn window_rect(&self) -> ScreenRect {
        ScreenRect::new(0.0, 0.0, self.width, self.height)
    }
}

impl TileRenderer for RenderContext {
    fn begin_frame(&mut self, window: (f64, f64)) -> Result<()> {
        self.width = window.0;
        self.height = window.1;
        self.drawing_queue.clear();
        Ok(())
    }

    fn draw_tile(&mut self, tile: &DrawableTile) -> Result<()> {
        if !(tile.screen.width > 0.0 && tile.screen.height > 0.0) {
            return Err(MapError::Render(format!(
                "tile {} has an empty screen rectangle",
                tile.key
            )));
        }

        let bounds = if self.clipping_enabled {
            match tile.screen.intersection(&self.window_rect()) {
                Some(clipped) => clipped,
                // Completely outside the window
                None => return Ok(()),
            }
        } else {
            tile.screen
        };

        self.drawing_queue.push(DrawCommand::Tile {
            key: tile.key.clone(),
            image: tile.image.clone(),
            bounds,
            scale_factor: tile.scale_factor,
        });
        Ok(())
    }
}
