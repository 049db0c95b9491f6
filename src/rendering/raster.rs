//! CPU compositing of decoded tiles into a single RGBA frame

use super::context::{DrawableTile, ScreenRect, TileRenderer};
use crate::tiles::fetcher::PixelFormat;
use crate::{MapError, Result};
use image::imageops::{self, FilterType};
use image::{Rgba, RgbaImage};
use std::path::Path;

/// Paints each frame into an in-memory [`RgbaImage`].
pub struct RasterCanvas {
    canvas: RgbaImage,
    background: Rgba<u8>,
}

impl RasterCanvas {
    pub fn new(width: u32, height: u32) -> Self {
        let background = Rgba([0, 0, 0, 0]);
        Self {
            canvas: RgbaImage::from_pixel(width, height, background),
            background,
        }
    }

    pub fn with_background(mut self, color: [u8; 4]) -> Self {
        self.background = Rgba(color);
        self
    }

    pub fn image(&self) -> &RgbaImage {
        &self.canvas
    }

    /// Writes the last frame; the format follows the file extension.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        self.canvas
            .save(path.as_ref())
            .map_err(|e| MapError::Render(format!("failed to save frame: {}", e)))
    }

    fn window_rect(&self) -> ScreenRect {
        ScreenRect::new(
            0.0,
            0.0,
            self.canvas.width() as f64,
            self.canvas.height() as f64,
        )
    }
}

impl TileRenderer for RasterCanvas {
    fn begin_frame(&mut self, window: (f64, f64)) -> Result<()> {
        let width = window.0.round().max(0.0) as u32;
        let height = window.1.round().max(0.0) as u32;
        self.canvas = RgbaImage::from_pixel(width, height, self.background);
        Ok(())
    }

    fn draw_tile(&mut self, tile: &DrawableTile) -> Result<()> {
        if tile.image.format() != PixelFormat::Rgba8 {
            return Err(MapError::Render(format!("tile {} is not decoded", tile.key)));
        }
        let source = RgbaImage::from_raw(
            tile.image.width(),
            tile.image.height(),
            tile.image.data().to_vec(),
        )
        .ok_or_else(|| MapError::Render(format!("tile {} has a short pixel buffer", tile.key)))?;

        let Some(visible) = tile.screen.intersection(&self.window_rect()) else {
            return Ok(());
        };

        // Crop in source space first so deep placeholders never get upscaled whole.
        let sx = source.width() as f64 / tile.screen.width;
        let sy = source.height() as f64 / tile.screen.height;
        let crop_x = ((visible.x - tile.screen.x) * sx).floor() as u32;
        let crop_y = ((visible.y - tile.screen.y) * sy).floor() as u32;
        let crop_w = ((visible.width * sx).ceil() as u32)
            .clamp(1, source.width().saturating_sub(crop_x).max(1));
        let crop_h = ((visible.height * sy).ceil() as u32)
            .clamp(1, source.height().saturating_sub(crop_y).max(1));
        let cropped = imageops::crop_imm(&source, crop_x, crop_y, crop_w, crop_h).to_image();

        let out_w = visible.width.round().max(1.0) as u32;
        let out_h = visible.height.round().max(1.0) as u32;
        let scaled = if (crop_w, crop_h) == (out_w, out_h) {
            cropped
        } else {
            imageops::resize(&cropped, out_w, out_h, FilterType::Nearest)
        };

        imageops::overlay(
            &mut self.canvas,
            &scaled,
            visible.x.round() as i64,
            visible.y.round() as i64,
        );
        Ok(())
    }
}
