//! Viewport, zoom and pan on top of the tile tree
//!
//! `TileManager` is the single coordinator: every tree mutation and every
//! fetch completion is applied through `&mut self`, so the owner decides
//! which thread that is. Fetches run elsewhere and come back through
//! [`TileManager::process_completions`].

use super::dispatch::{FetchCompletion, FetchDispatcher};
use super::fetcher::TileFetcher;
use super::key::QuadKey;
use super::node::NodeId;
use super::tree::{CompletionEffect, TileTree, TreeStats};
use crate::core::bounds::Boundary;
use crate::core::config::TileManagerConfig;
use crate::core::geo::{BingTileSystem, CoordinateTransform, LonLat, Point};
use crate::rendering::{DrawableTile, FrameStats, TileRenderer};
use crate::Result;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Longest single wait inside [`TileManager::run_until_idle`].
const IDLE_POLL: Duration = Duration::from_millis(50);

pub struct TileManager {
    config: TileManagerConfig,
    tree: TileTree,
    dispatcher: FetchDispatcher,
    transform: Box<dyn CoordinateTransform>,
    level: u8,
    center: Point,
    window: (f64, f64),
    viewport: Boundary,
    drawable: Vec<NodeId>,
}

impl TileManager {
    /// Creates the four roots, starts their fetches and computes the first view.
    pub fn new(config: TileManagerConfig, fetcher: Arc<dyn TileFetcher>) -> Result<Self> {
        config.validate()?;

        let mut manager = Self {
            tree: TileTree::new(config.half_extent()),
            dispatcher: FetchDispatcher::new(fetcher),
            transform: Box::new(BingTileSystem::new(config.tile_size)),
            level: config.clamp_level(config.initial_level),
            center: config.center(),
            window: (config.window_width, config.window_height),
            viewport: Boundary::default(),
            drawable: Vec::new(),
            config,
        };
        log::info!(
            "tile manager: levels {}..={}, global size {} px",
            manager.config.min_level,
            manager.config.max_level,
            manager.config.global_pixel_size()
        );

        manager.tree.start_root_fetches(&manager.dispatcher);
        manager.update_view();
        Ok(manager)
    }

    /// Replaces the pixel/geographic conversion used by [`TileManager::lon_lat`].
    pub fn with_transform(mut self, transform: Box<dyn CoordinateTransform>) -> Self {
        self.transform = transform;
        self
    }

    /// Zoom in one level, keeping the center
    pub fn zoom_in(&mut self) {
        self.set_level(self.level.saturating_add(1));
    }

    /// Zoom out one level, keeping the center
    pub fn zoom_out(&mut self) {
        self.set_level(self.level.saturating_sub(1));
    }

    /// Zoom in one level keeping the point under `(px, py)` fixed on screen
    pub fn zoom_in_at(&mut self, px: f64, py: f64) {
        self.zoom_at(px, py, self.level.saturating_add(1));
    }

    /// Zoom out one level keeping the point under `(px, py)` fixed on screen
    pub fn zoom_out_at(&mut self, px: f64, py: f64) {
        self.zoom_at(px, py, self.level.saturating_sub(1));
    }

    fn zoom_at(&mut self, px: f64, py: f64, level: u8) {
        let old_scale = self.scale();
        let level = self.config.clamp_level(level);
        let new_scale = self.config.scale_for(level);

        // Anchor offset from the window center, north-up.
        let anchor = Point::new(px - self.window.0 / 2.0, self.window.1 / 2.0 - py);
        self.center = self.center.add(&anchor.multiply(old_scale - new_scale));
        self.level = level;
        self.update_view();
    }

    /// Jumps to `level`, clamped to the configured range
    pub fn set_level(&mut self, level: u8) {
        self.level = self.config.clamp_level(level);
        self.update_view();
    }

    /// Pans by `(dx, dy)` screen pixels; positive `dx` moves east, positive `dy` north
    pub fn offset(&mut self, dx: f64, dy: f64) {
        let scale = self.scale();
        self.center = self.center.add(&Point::new(dx * scale, dy * scale));
        self.update_view();
    }

    /// Moves the view center to a global pixel position
    pub fn set_center(&mut self, center: Point) {
        self.center = center;
        self.update_view();
    }

    /// Updates the window size in screen pixels
    pub fn resize(&mut self, width: f64, height: f64) {
        self.window = (width.max(0.0), height.max(0.0));
        self.update_view();
    }

    pub fn level(&self) -> u8 {
        self.level
    }

    /// Longitude/latitude under the window pixel `(px, py)`
    pub fn lon_lat(&self, px: f64, py: f64) -> LonLat {
        let pixel = self.screen_to_pixel(px, py);
        self.transform
            .pixel_to_lon_lat(pixel.x, pixel.y, self.config.max_level)
    }

    /// Global pixel position of a longitude/latitude
    pub fn lon_lat_to_pixel(&self, lon_lat: LonLat) -> Point {
        self.transform
            .lon_lat_to_pixel(lon_lat, self.config.max_level)
    }

    /// Global pixel position under the window pixel `(px, py)`
    pub fn screen_to_pixel(&self, px: f64, py: f64) -> Point {
        let scale = self.scale();
        Point::new(
            self.center.x + (px - self.window.0 / 2.0) * scale,
            self.center.y + (self.window.1 / 2.0 - py) * scale,
        )
    }

    /// Global pixels per screen pixel at the current level
    pub fn scale(&self) -> f64 {
        self.config.scale_for(self.level)
    }

    pub fn center(&self) -> Point {
        self.center
    }

    pub fn viewport(&self) -> &Boundary {
        &self.viewport
    }

    pub fn window_size(&self) -> (f64, f64) {
        self.window
    }

    pub fn config(&self) -> &TileManagerConfig {
        &self.config
    }

    pub fn tree(&self) -> &TileTree {
        &self.tree
    }

    pub fn stats(&self) -> TreeStats {
        self.tree.stats()
    }

    /// Fetches that have not reported back yet
    pub fn in_flight(&self) -> usize {
        self.dispatcher.in_flight()
    }

    fn update_view(&mut self) {
        let scale = self.scale();
        self.viewport = Boundary::from_center(
            self.center,
            self.window.0 / 2.0 * scale,
            self.window.1 / 2.0 * scale,
        );
        log::debug!(
            "view at level {} centred on ({}, {})",
            self.level,
            self.center.x,
            self.center.y
        );
        self.adjust_tree();
    }

    /// Collapse, refresh the drawable list, then expand.
    ///
    /// Safe to call any number of times; with nothing changed in between
    /// the drawable list comes out the same.
    pub fn adjust_tree(&mut self) {
        self.tree.collapse_all(self.level, &self.viewport);
        self.refresh_drawable();
        self.tree
            .expand_all(self.level, &self.viewport, &self.dispatcher);
    }

    /// Recomputes the drawable list without touching the tree
    pub fn refresh_drawable(&mut self) {
        self.drawable = self.tree.drawable_nodes(&self.viewport);
    }

    pub fn drawable_nodes(&self) -> &[NodeId] {
        &self.drawable
    }

    /// The drawable list resolved to screen rectangles and images
    pub fn drawable_tiles(&self) -> Vec<DrawableTile> {
        let scale = self.scale();
        self.drawable
            .iter()
            .filter_map(|id| self.tree.get(*id))
            .filter_map(|node| {
                DrawableTile::from_node(
                    node,
                    &self.viewport,
                    scale,
                    self.level,
                    self.config.tile_size,
                )
            })
            .collect()
    }

    /// Paints the current drawable list. Tiles the renderer rejects are
    /// counted and logged, never propagated.
    pub fn render(&self, renderer: &mut dyn TileRenderer) -> Result<FrameStats> {
        renderer.begin_frame(self.window)?;
        let mut stats = FrameStats::default();
        for tile in self.drawable_tiles() {
            match renderer.draw_tile(&tile) {
                Ok(()) => {
                    stats.tiles_drawn += 1;
                    if tile.is_placeholder() {
                        stats.placeholders += 1;
                    }
                }
                Err(e) => {
                    log::warn!("failed to draw tile {}: {}", tile.key, e);
                    stats.failed += 1;
                }
            }
        }
        renderer.end_frame()?;
        Ok(stats)
    }

    /// Cancels every fetch in flight under `key`. Returns false if no such node exists.
    pub fn cancel(&mut self, key: &QuadKey) -> bool {
        match self.tree.find(key) {
            Some(id) => {
                self.tree.abort(id);
                true
            }
            None => false,
        }
    }

    /// Applies every completion that has arrived, in arrival order.
    ///
    /// Returns how many of them changed the tree.
    pub fn process_completions(&mut self) -> usize {
        let mut applied = 0;
        for completion in self.dispatcher.drain() {
            if self.apply(completion) {
                applied += 1;
            }
        }
        applied
    }

    /// Blocks for at most `timeout` waiting for one completion, then applies
    /// it along with anything else already queued.
    pub fn wait_for_completion(&mut self, timeout: Duration) -> usize {
        match self.dispatcher.recv_timeout(timeout) {
            Some(completion) => usize::from(self.apply(completion)) + self.process_completions(),
            None => 0,
        }
    }

    /// Pumps completions until no fetch is in flight or `timeout` elapses.
    ///
    /// Returns true if the tree went idle. A stalled fetch keeps it busy.
    pub fn run_until_idle(&mut self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        loop {
            self.process_completions();
            if self.dispatcher.in_flight() == 0 && !self.dispatcher.has_pending_completions() {
                return true;
            }
            let now = Instant::now();
            if now >= deadline {
                return false;
            }
            self.wait_for_completion((deadline - now).min(IDLE_POLL));
        }
    }

    fn apply(&mut self, completion: FetchCompletion) -> bool {
        match self.tree.complete(completion) {
            CompletionEffect::Ignored => false,
            CompletionEffect::Settled => true,
            CompletionEffect::RefreshDrawList => {
                self.refresh_drawable();
                true
            }
            CompletionEffect::AdjustTree => {
                self.adjust_tree();
                true
            }
        }
    }
}

impl std::fmt::Debug for TileManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TileManager")
            .field("level", &self.level)
            .field("center", &self.center)
            .field("window", &self.window)
            .field("viewport", &self.viewport)
            .field("drawable", &self.drawable.len())
            .finish_non_exhaustive()
    }
}
